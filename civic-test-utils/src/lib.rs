//! Civic Test Utilities
//!
//! Shared test infrastructure for the civic workspace:
//! - Proptest generators for domain inputs
//! - Fixtures for seeded repositories and principals
//! - Assertions over `CivicResult`

pub use civic_storage::{ComplaintRepository, InMemoryRepository};

pub use civic_core::{
    build_category, default_categories, Category, CategoryId, CivicError, CivicResult,
    Complaint, ComplaintPatch, ComplaintStatus, ConflictError, EntityType, FeedbackSubmission,
    GeoPoint, NewComplaint, Principal, Priority, Timestamp, ValidationError,
};

use chrono::Utc;

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for civic inputs.

    use super::*;
    use proptest::prelude::*;

    /// Generate a status.
    pub fn arb_status() -> impl Strategy<Value = ComplaintStatus> {
        prop::sample::select(ComplaintStatus::ALL.to_vec())
    }

    /// Generate a priority.
    pub fn arb_priority() -> impl Strategy<Value = Priority> {
        prop::sample::select(Priority::ALL.to_vec())
    }

    /// Generate a sequence of status updates.
    pub fn arb_status_sequence(max_len: usize) -> impl Strategy<Value = Vec<ComplaintStatus>> {
        prop::collection::vec(arb_status(), 0..max_len)
    }

    /// Generate a valid coordinate pair.
    pub fn arb_geo_point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(latitude, longitude)| GeoPoint {
            latitude,
            longitude,
        })
    }

    /// Generate a Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// Pick one of the default category ids.
    pub fn arb_default_category_id() -> impl Strategy<Value = CategoryId> {
        let ids: Vec<CategoryId> = default_categories()
            .iter()
            .map(|c| CategoryId::from_name(&c.name))
            .collect();
        prop::sample::select(ids)
    }

    /// Generate a submission that passes validation for a default category.
    pub fn arb_new_complaint() -> impl Strategy<Value = NewComplaint> {
        (
            "[A-Za-z][A-Za-z ]{0,59}",
            "[A-Za-z][A-Za-z ]{0,199}",
            arb_default_category_id(),
            "[A-Z][a-z]{1,20}",
            "[a-z]{1,10}@[a-z]{1,10}\\.org",
            prop::option::of("[0-9]{7,15}"),
            prop::option::of(arb_geo_point()),
        )
            .prop_map(|(title, description, category_id, name, email, phone, point)| {
                NewComplaint {
                    title,
                    description,
                    category_id,
                    citizen_name: name,
                    citizen_email: email,
                    citizen_phone: phone,
                    latitude: point.map(|p| p.latitude),
                    longitude: point.map(|p| p.longitude),
                    address: None,
                    photo_ref: None,
                }
            })
    }

    /// Generate a rating, valid or not.
    pub fn arb_rating() -> impl Strategy<Value = i64> {
        -2i64..8
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common test scenarios.

    use super::*;

    /// Repository preloaded with the default catalogue.
    pub async fn seeded_repository() -> CivicResult<InMemoryRepository> {
        let repo = InMemoryRepository::new();
        let now = Utc::now();
        for seed in default_categories() {
            repo.category_upsert(&build_category(seed, now)?).await?;
        }
        Ok(repo)
    }

    pub fn water_category_id() -> CategoryId {
        CategoryId::from_name("Water Supply")
    }

    pub fn roads_category_id() -> CategoryId {
        CategoryId::from_name("Roads & Infrastructure")
    }

    /// A valid submission for the given category.
    pub fn new_complaint(category_id: CategoryId, title: &str) -> NewComplaint {
        NewComplaint {
            title: title.to_string(),
            description: format!("{} - reported by a resident", title),
            category_id,
            citizen_name: "Test Citizen".to_string(),
            citizen_email: "citizen@example.org".to_string(),
            citizen_phone: Some("5550100".to_string()),
            latitude: None,
            longitude: None,
            address: Some("1 Civic Plaza".to_string()),
            photo_ref: None,
        }
    }

    /// A valid submission located at `point`.
    pub fn new_complaint_at(category_id: CategoryId, title: &str, point: GeoPoint) -> NewComplaint {
        NewComplaint {
            latitude: Some(point.latitude),
            longitude: Some(point.longitude),
            ..new_complaint(category_id, title)
        }
    }

    pub fn admin() -> Principal {
        Principal::staff("admin-1")
    }

    pub fn superuser() -> Principal {
        Principal::superuser("root-1")
    }

    pub fn water_department_user() -> Principal {
        Principal::department_user("water-1", "Water Department")
    }

    pub fn feedback(rating: i64) -> FeedbackSubmission {
        FeedbackSubmission {
            rating,
            comments: Some("Thanks".to_string()),
            would_recommend: Some(true),
        }
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over civic results.

    use super::*;

    /// Assert that a CivicResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &CivicResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a CivicResult is a Validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &CivicResult<T>) {
        match result {
            Err(CivicError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a CivicResult is NotFound for the given entity type.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &CivicResult<T>, entity_type: EntityType) {
        match result {
            Err(CivicError::NotFound {
                entity_type: et, ..
            }) => {
                assert_eq!(*et, entity_type, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity_type, other),
        }
    }

    /// Assert that a CivicResult is Forbidden.
    #[track_caller]
    pub fn assert_forbidden<T: std::fmt::Debug>(result: &CivicResult<T>) {
        match result {
            Err(CivicError::Forbidden { .. }) => {}
            other => panic!("Expected Forbidden error, got: {:?}", other),
        }
    }

    /// Assert that a CivicResult is InvalidState.
    #[track_caller]
    pub fn assert_invalid_state<T: std::fmt::Debug>(result: &CivicResult<T>) {
        match result {
            Err(CivicError::InvalidState { .. }) => {}
            other => panic!("Expected InvalidState error, got: {:?}", other),
        }
    }

    /// Assert that a CivicResult is a Conflict.
    #[track_caller]
    pub fn assert_conflict<T: std::fmt::Debug>(result: &CivicResult<T>) {
        match result {
            Err(CivicError::Conflict(_)) => {}
            other => panic!("Expected Conflict error, got: {:?}", other),
        }
    }

    /// Assert that no complaint in `complaints` leaves `department`.
    #[track_caller]
    pub fn assert_all_in_department(complaints: &[Complaint], department: &str) {
        for c in complaints {
            assert_eq!(
                c.department, department,
                "Complaint {} leaked outside department {}",
                c.reference_number, department
            );
        }
    }
}
