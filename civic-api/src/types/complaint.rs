//! Complaint-related API types

use std::collections::HashMap;

use civic_core::{
    Category, CategoryId, Complaint, ComplaintDetail, ComplaintFilter, ComplaintId,
    ComplaintPatch, ComplaintStatus, HistoryEntryId, NewComplaint, Ordering, Page, Priority,
    PrincipalId, StatusHistoryEntry, Timestamp,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::{CategoryResponse, FeedbackResponse};
use crate::error::{ApiError, ApiResult};

/// Shown in the ledger when no principal made the change.
pub const SYSTEM_ACTOR_NAME: &str = "System";

// ============================================================================
// REQUESTS
// ============================================================================

/// Citizen submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateComplaintRequest {
    /// Short summary, at most 200 characters
    pub title: String,
    pub description: String,
    #[serde(alias = "category")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub category_id: CategoryId,
    pub citizen_name: String,
    pub citizen_email: String,
    pub citizen_phone: Option<String>,
    /// Supply together with `longitude`, or not at all
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    /// Media store reference of an uploaded photo
    pub photo_ref: Option<String>,
}

impl From<CreateComplaintRequest> for NewComplaint {
    fn from(req: CreateComplaintRequest) -> Self {
        NewComplaint {
            title: req.title,
            description: req.description,
            category_id: req.category_id,
            citizen_name: req.citizen_name,
            citizen_email: req.citizen_email,
            citizen_phone: req.citizen_phone,
            latitude: req.latitude,
            longitude: req.longitude,
            address: req.address,
            photo_ref: req.photo_ref,
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Administrative update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateComplaintRequest {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    /// Principal id of the assignee; `null` unassigns
    #[serde(default, deserialize_with = "double_option")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, nullable = true))]
    pub assigned_to: Option<Option<PrincipalId>>,
    pub department: Option<String>,
}

impl From<UpdateComplaintRequest> for ComplaintPatch {
    fn from(req: UpdateComplaintRequest) -> Self {
        ComplaintPatch {
            status: req.status,
            priority: req.priority,
            assigned_to: req.assigned_to,
            department: req.department,
        }
    }
}

/// Query string for the list and statistics endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListComplaintsQuery {
    /// pending, acknowledged, in_progress, resolved, closed or rejected
    pub status: Option<String>,
    /// Category id
    pub category: Option<Uuid>,
    /// low, medium, high or critical
    pub priority: Option<String>,
    pub department: Option<String>,
    /// Substring of title, description, reference number or address
    pub search: Option<String>,
    /// created_at, updated_at or priority; prefix with `-` for descending
    pub ordering: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl ListComplaintsQuery {
    /// Parse the filter part of the query.
    pub fn to_filter(&self) -> ApiResult<ComplaintFilter> {
        let status = blank_to_none(self.status.as_deref())
            .map(|s| {
                ComplaintStatus::from_db_str(s)
                    .map_err(|e| ApiError::invalid_input(e.to_string()))
            })
            .transpose()?;
        let priority = blank_to_none(self.priority.as_deref())
            .map(|p| Priority::from_db_str(p).map_err(|e| ApiError::invalid_input(e.to_string())))
            .transpose()?;
        let ordering = match blank_to_none(self.ordering.as_deref()) {
            Some(o) => o.parse::<Ordering>()?,
            None => Ordering::default(),
        };

        Ok(ComplaintFilter {
            status,
            category_id: self.category.map(CategoryId::from),
            priority,
            department: blank_to_none(self.department.as_deref()).map(str::to_string),
            search: blank_to_none(self.search.as_deref()).map(str::to_string),
            ordering,
            scope_department: None,
        })
    }

    pub fn page(&self, default_limit: usize) -> Page {
        Page::new(self.limit, self.offset, default_limit)
    }
}

/// Query string for `GET /complaints/nearby`.
///
/// Kept as text so that missing and malformed values both surface as
/// validation errors with a field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct NearbyQuery {
    /// Latitude of the centre point
    pub lat: Option<String>,
    /// Longitude of the centre point
    pub lng: Option<String>,
    /// Radius in kilometres (default 5)
    pub radius: Option<String>,
}

fn parse_float(field: &str, value: Option<&str>) -> ApiResult<Option<f64>> {
    match blank_to_none(value) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ApiError::invalid_format(field, "a decimal number")),
    }
}

impl NearbyQuery {
    /// Parsed `(lat, lng, radius_km)`.
    pub fn parse(&self) -> ApiResult<(f64, f64, f64)> {
        let lat = parse_float("lat", self.lat.as_deref())?;
        let lng = parse_float("lng", self.lng.as_deref())?;
        let (Some(lat), Some(lng)) = (lat, lng) else {
            return Err(ApiError::validation_failed(
                "Both lat and lng parameters are required",
            ));
        };
        let radius = parse_float("radius", self.radius.as_deref())?
            .unwrap_or(civic_core::DEFAULT_RADIUS_KM);
        Ok((lat, lng, radius))
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Compact record used by list-shaped reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComplaintListItem {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: ComplaintId,
    pub reference_number: String,
    pub title: String,
    pub category_name: String,
    pub category_color: String,
    pub citizen_name: String,
    pub citizen_email: String,
    pub status: ComplaintStatus,
    pub priority: Priority,
    pub department: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl ComplaintListItem {
    /// Build a list item, resolving the category through `categories`.
    pub fn from_complaint(complaint: Complaint, categories: &HashMap<CategoryId, Category>) -> Self {
        let (category_name, category_color) = match categories.get(&complaint.category_id) {
            Some(category) => (category.name.clone(), category.color.clone()),
            None => (
                complaint.category_id.to_string(),
                civic_core::DEFAULT_CATEGORY_COLOR.to_string(),
            ),
        };
        Self {
            id: complaint.complaint_id,
            reference_number: complaint.reference_number,
            title: complaint.title,
            category_name,
            category_color,
            citizen_name: complaint.citizen_name,
            citizen_email: complaint.citizen_email,
            status: complaint.status,
            priority: complaint.priority,
            department: complaint.department,
            latitude: complaint.location.map(|p| p.latitude),
            longitude: complaint.location.map(|p| p.longitude),
            address: complaint.address,
            created_at: complaint.created_at,
            updated_at: complaint.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListComplaintsResponse {
    pub complaints: Vec<ComplaintListItem>,
    /// Total count (before pagination)
    pub total: usize,
}

/// One ledger row as shown on the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusHistoryResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: HistoryEntryId,
    /// Empty for the entry recorded at submission
    pub old_status: String,
    pub new_status: ComplaintStatus,
    pub changed_by: Option<PrincipalId>,
    pub changed_by_name: String,
    pub notes: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl From<StatusHistoryEntry> for StatusHistoryResponse {
    fn from(entry: StatusHistoryEntry) -> Self {
        let changed_by_name = entry
            .changed_by
            .clone()
            .unwrap_or_else(|| SYSTEM_ACTOR_NAME.to_string());
        Self {
            id: entry.entry_id,
            old_status: entry
                .old_status
                .map(|s| s.as_db_str().to_string())
                .unwrap_or_default(),
            new_status: entry.new_status,
            changed_by: entry.changed_by,
            changed_by_name,
            notes: entry.notes,
            created_at: entry.created_at,
        }
    }
}

/// Full complaint record with category, ledger and feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComplaintDetailResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: ComplaintId,
    pub reference_number: String,
    pub title: String,
    pub description: String,
    pub category: CategoryResponse,
    pub citizen_name: String,
    pub citizen_email: String,
    pub citizen_phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: String,
    pub photo_ref: Option<String>,
    pub photo_url: Option<String>,
    pub status: ComplaintStatus,
    pub priority: Priority,
    pub assigned_to: Option<PrincipalId>,
    pub department: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub resolved_at: Option<Timestamp>,
    /// Newest first
    pub status_history: Vec<StatusHistoryResponse>,
    pub feedback: Option<FeedbackResponse>,
}

impl ComplaintDetailResponse {
    pub fn from_detail(detail: ComplaintDetail, photo_url: Option<String>) -> Self {
        let ComplaintDetail {
            complaint,
            category,
            history,
            feedback,
        } = detail;
        Self {
            id: complaint.complaint_id,
            reference_number: complaint.reference_number,
            title: complaint.title,
            description: complaint.description,
            category: category.into(),
            citizen_name: complaint.citizen_name,
            citizen_email: complaint.citizen_email,
            citizen_phone: complaint.citizen_phone,
            latitude: complaint.location.map(|p| p.latitude),
            longitude: complaint.location.map(|p| p.longitude),
            address: complaint.address,
            photo_ref: complaint.photo_ref,
            photo_url,
            status: complaint.status,
            priority: complaint.priority,
            assigned_to: complaint.assigned_to,
            department: complaint.department,
            created_at: complaint.created_at,
            updated_at: complaint.updated_at,
            resolved_at: complaint.resolved_at,
            status_history: history.into_iter().map(Into::into).collect(),
            feedback: feedback.map(Into::into),
        }
    }
}
