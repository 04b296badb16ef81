//! Complaint lifecycle rules.
//!
//! Every mutation of a complaint goes through one of three pure functions:
//! [`submit`], [`apply_patch`] and [`admit_feedback`]. They compute the new
//! records; persisting them atomically is the repository's job.

use crate::{
    Category, CivicError, CivicResult, Complaint, ComplaintId, ComplaintPatch, ComplaintStatus,
    ConflictError, EntityIdType, Feedback, FeedbackId, FeedbackSubmission, GeoPoint,
    HistoryEntryId, NewComplaint, Priority, PrincipalId, StatusHistoryEntry, Timestamp,
    ValidationError,
};
use once_cell::sync::Lazy;
use regex::Regex;

pub const TITLE_MAX_LEN: usize = 200;
pub const CITIZEN_NAME_MAX_LEN: usize = 100;
pub const CITIZEN_PHONE_MAX_LEN: usize = 15;
pub const DEPARTMENT_MAX_LEN: usize = 100;
pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

/// Ledger note written for the entry recorded at submission.
pub const SUBMISSION_NOTE: &str = "Complaint submitted by citizen";

static REFERENCE_RE: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"^CMP\d{14}$"));
static EMAIL_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

/// Reference number for a complaint created at `created_at`.
///
/// `CMP` followed by the UTC timestamp at second granularity. Two complaints
/// created in the same second get the same value; the store's uniqueness
/// constraint turns that into a conflict.
pub fn reference_number_for(created_at: Timestamp) -> String {
    format!("CMP{}", created_at.format("%Y%m%d%H%M%S"))
}

/// Whether `value` has the `CMPYYYYMMDDHHMMSS` shape.
pub fn is_valid_reference_number(value: &str) -> bool {
    match REFERENCE_RE.as_ref() {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

fn is_plausible_email(value: &str) -> bool {
    match EMAIL_RE.as_ref() {
        Ok(re) => re.is_match(value),
        Err(_) => value.contains('@'),
    }
}

fn required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Field-level validation of a citizen submission. Returns the parsed location.
pub fn validate_new_complaint(input: &NewComplaint) -> Result<Option<GeoPoint>, ValidationError> {
    required("title", &input.title)?;
    max_len("title", input.title.trim(), TITLE_MAX_LEN)?;
    required("description", &input.description)?;
    required("citizen_name", &input.citizen_name)?;
    max_len("citizen_name", input.citizen_name.trim(), CITIZEN_NAME_MAX_LEN)?;
    required("citizen_email", &input.citizen_email)?;
    if !is_plausible_email(input.citizen_email.trim()) {
        return Err(ValidationError::InvalidValue {
            field: "citizen_email".to_string(),
            reason: "Enter a valid email address".to_string(),
        });
    }
    if let Some(phone) = &input.citizen_phone {
        max_len("citizen_phone", phone.trim(), CITIZEN_PHONE_MAX_LEN)?;
    }
    GeoPoint::from_optional(input.latitude, input.longitude)
}

/// Records produced by a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub complaint: Complaint,
    pub initial_entry: StatusHistoryEntry,
}

/// Build a new complaint and its first ledger entry.
///
/// The department is always taken from `category`; callers cannot supply one.
pub fn submit(input: NewComplaint, category: &Category, now: Timestamp) -> CivicResult<Submission> {
    if input.category_id != category.category_id {
        return Err(ValidationError::UnknownCategory {
            category_id: input.category_id.as_uuid(),
        }
        .into());
    }
    let location = validate_new_complaint(&input)?;

    let complaint = Complaint {
        complaint_id: ComplaintId::now_v7(),
        reference_number: reference_number_for(now),
        title: input.title.trim().to_string(),
        description: input.description,
        category_id: category.category_id,
        citizen_name: input.citizen_name.trim().to_string(),
        citizen_email: input.citizen_email.trim().to_string(),
        citizen_phone: input.citizen_phone.unwrap_or_default().trim().to_string(),
        location,
        address: input.address.unwrap_or_default(),
        photo_ref: input.photo_ref.filter(|r| !r.trim().is_empty()),
        status: ComplaintStatus::Pending,
        priority: Priority::default(),
        assigned_to: None,
        department: category.department.clone(),
        created_at: now,
        updated_at: now,
        resolved_at: None,
    };

    let initial_entry = StatusHistoryEntry {
        entry_id: HistoryEntryId::now_v7(),
        complaint_id: complaint.complaint_id,
        old_status: None,
        new_status: ComplaintStatus::Pending,
        changed_by: None,
        notes: SUBMISSION_NOTE.to_string(),
        created_at: now,
    };

    Ok(Submission {
        complaint,
        initial_entry,
    })
}

/// Result of applying an administrative patch.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub complaint: Complaint,
    /// Present only when the status actually changed.
    pub entry: Option<StatusHistoryEntry>,
    pub previous_status: ComplaintStatus,
}

impl PatchOutcome {
    pub fn status_changed(&self) -> bool {
        self.entry.is_some()
    }

    /// True when this patch moved the complaint into `resolved`.
    pub fn entered_resolved(&self) -> bool {
        self.status_changed() && self.complaint.status == ComplaintStatus::Resolved
    }
}

/// Ledger note for a status transition.
pub fn transition_note(old: ComplaintStatus, new: ComplaintStatus) -> String {
    format!("Status updated from {} to {}", old, new)
}

/// Apply `patch` to `current`.
///
/// A ledger entry is produced only when the status changes. `resolved_at` is
/// stamped the first time the complaint becomes resolved and is never
/// touched again.
pub fn apply_patch(
    current: &Complaint,
    patch: &ComplaintPatch,
    changed_by: Option<&PrincipalId>,
    now: Timestamp,
) -> CivicResult<PatchOutcome> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyPatch {
            fields: "status, priority, assigned_to, department".to_string(),
        }
        .into());
    }
    if let Some(department) = &patch.department {
        max_len("department", department.trim(), DEPARTMENT_MAX_LEN)?;
    }

    let previous_status = current.status;
    let mut complaint = current.clone();

    if let Some(priority) = patch.priority {
        complaint.priority = priority;
    }
    if let Some(assigned_to) = &patch.assigned_to {
        complaint.assigned_to = assigned_to.clone();
    }
    if let Some(department) = &patch.department {
        complaint.department = department.trim().to_string();
    }

    let mut entry = None;
    if let Some(status) = patch.status {
        complaint.status = status;
        if status != previous_status {
            entry = Some(StatusHistoryEntry {
                entry_id: HistoryEntryId::now_v7(),
                complaint_id: complaint.complaint_id,
                old_status: Some(previous_status),
                new_status: status,
                changed_by: changed_by.cloned(),
                notes: transition_note(previous_status, status),
                created_at: now,
            });
        }
        if status == ComplaintStatus::Resolved && complaint.resolved_at.is_none() {
            complaint.resolved_at = Some(now);
        }
    }
    complaint.updated_at = now;

    Ok(PatchOutcome {
        complaint,
        entry,
        previous_status,
    })
}

/// Check a feedback submission against the complaint and build the record.
pub fn admit_feedback(
    complaint: &Complaint,
    already_submitted: bool,
    submission: FeedbackSubmission,
    now: Timestamp,
) -> CivicResult<Feedback> {
    if !complaint.status.accepts_feedback() {
        return Err(CivicError::invalid_state(
            "Feedback can only be submitted for resolved complaints",
        ));
    }
    if already_submitted {
        return Err(ConflictError::FeedbackExists {
            complaint_id: complaint.complaint_id.as_uuid(),
        }
        .into());
    }
    if !(RATING_MIN..=RATING_MAX).contains(&submission.rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: RATING_MIN.to_string(),
            max: RATING_MAX.to_string(),
        }
        .into());
    }

    Ok(Feedback {
        feedback_id: FeedbackId::now_v7(),
        complaint_id: complaint.complaint_id,
        rating: submission.rating as i16,
        comments: submission.comments.unwrap_or_default(),
        would_recommend: submission.would_recommend.unwrap_or(true),
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CategoryId;
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_704_067_200 + secs, 0).single().unwrap_or_default()
    }

    fn water() -> Category {
        Category {
            category_id: CategoryId::from_name("Water Supply"),
            name: "Water Supply".to_string(),
            description: String::new(),
            icon: String::new(),
            color: crate::DEFAULT_CATEGORY_COLOR.to_string(),
            department: "Water Department".to_string(),
            created_at: ts(0),
        }
    }

    fn input() -> NewComplaint {
        NewComplaint {
            title: "Burst main on 5th Street".to_string(),
            description: "Water everywhere".to_string(),
            category_id: CategoryId::from_name("Water Supply"),
            citizen_name: "Ada Citizen".to_string(),
            citizen_email: "ada@example.org".to_string(),
            citizen_phone: None,
            latitude: Some(12.97),
            longitude: Some(77.59),
            address: Some("5th Street".to_string()),
            photo_ref: None,
        }
    }

    #[test]
    fn test_reference_number_format() {
        let reference = reference_number_for(ts(0));
        assert_eq!(reference, "CMP20240101000000");
        assert!(is_valid_reference_number(&reference));
        assert!(!is_valid_reference_number("CMP2024"));
    }

    #[test]
    fn test_submit_copies_department_and_records_entry() -> CivicResult<()> {
        let s = submit(input(), &water(), ts(5))?;
        assert_eq!(s.complaint.department, "Water Department");
        assert_eq!(s.complaint.status, ComplaintStatus::Pending);
        assert_eq!(s.initial_entry.old_status, None);
        assert_eq!(s.initial_entry.new_status, ComplaintStatus::Pending);
        assert_eq!(s.initial_entry.changed_by, None);
        assert_eq!(s.initial_entry.notes, SUBMISSION_NOTE);
        assert_eq!(s.initial_entry.complaint_id, s.complaint.complaint_id);
        Ok(())
    }

    #[test]
    fn test_submit_rejects_missing_fields() {
        let mut bad = input();
        bad.citizen_name = "   ".to_string();
        let err = submit(bad, &water(), ts(0));
        assert!(matches!(
            err,
            Err(CivicError::Validation(ValidationError::RequiredFieldMissing { .. }))
        ));

        let mut bad = input();
        bad.citizen_email = "not-an-email".to_string();
        assert!(submit(bad, &water(), ts(0)).is_err());

        let mut bad = input();
        bad.longitude = None;
        assert!(submit(bad, &water(), ts(0)).is_err());

        let mut bad = input();
        bad.title = "x".repeat(TITLE_MAX_LEN + 1);
        assert!(submit(bad, &water(), ts(0)).is_err());
    }

    #[test]
    fn test_patch_same_status_writes_no_entry() -> CivicResult<()> {
        let s = submit(input(), &water(), ts(0))?;
        let mut patch = ComplaintPatch::status(ComplaintStatus::Pending);
        patch.priority = Some(Priority::High);
        let out = apply_patch(&s.complaint, &patch, None, ts(10))?;
        assert!(out.entry.is_none());
        assert_eq!(out.complaint.priority, Priority::High);
        assert_eq!(out.complaint.updated_at, ts(10));
        Ok(())
    }

    #[test]
    fn test_patch_status_change_writes_entry() -> CivicResult<()> {
        let s = submit(input(), &water(), ts(0))?;
        let admin = "admin-1".to_string();
        let out = apply_patch(
            &s.complaint,
            &ComplaintPatch::status(ComplaintStatus::InProgress),
            Some(&admin),
            ts(10),
        )?;
        let entry = out.entry.as_ref().ok_or_else(|| CivicError::invalid_state("no entry"))?;
        assert_eq!(entry.old_status, Some(ComplaintStatus::Pending));
        assert_eq!(entry.new_status, ComplaintStatus::InProgress);
        assert_eq!(entry.changed_by.as_deref(), Some("admin-1"));
        assert_eq!(entry.notes, "Status updated from pending to in_progress");
        Ok(())
    }

    #[test]
    fn test_empty_patch_rejected() -> CivicResult<()> {
        let s = submit(input(), &water(), ts(0))?;
        let err = apply_patch(&s.complaint, &ComplaintPatch::default(), None, ts(1));
        assert!(matches!(
            err,
            Err(CivicError::Validation(ValidationError::EmptyPatch { .. }))
        ));
        Ok(())
    }

    #[test]
    fn test_unassign_with_explicit_null() -> CivicResult<()> {
        let s = submit(input(), &water(), ts(0))?;
        let assign = ComplaintPatch {
            assigned_to: Some(Some("crew-7".to_string())),
            ..Default::default()
        };
        let assigned = apply_patch(&s.complaint, &assign, None, ts(1))?.complaint;
        assert_eq!(assigned.assigned_to.as_deref(), Some("crew-7"));

        let unassign = ComplaintPatch {
            assigned_to: Some(None),
            ..Default::default()
        };
        let cleared = apply_patch(&assigned, &unassign, None, ts(2))?.complaint;
        assert_eq!(cleared.assigned_to, None);
        Ok(())
    }

    #[test]
    fn test_feedback_rules() -> CivicResult<()> {
        let s = submit(input(), &water(), ts(0))?;
        let submission = FeedbackSubmission {
            rating: 4,
            comments: None,
            would_recommend: None,
        };

        let err = admit_feedback(&s.complaint, false, submission.clone(), ts(1));
        assert!(matches!(err, Err(CivicError::InvalidState { .. })));

        let resolved = apply_patch(
            &s.complaint,
            &ComplaintPatch::status(ComplaintStatus::Resolved),
            None,
            ts(2),
        )?
        .complaint;

        let fb = admit_feedback(&resolved, false, submission.clone(), ts(3))?;
        assert_eq!(fb.rating, 4);
        assert!(fb.would_recommend);

        let err = admit_feedback(&resolved, true, submission, ts(4));
        assert!(matches!(
            err,
            Err(CivicError::Conflict(ConflictError::FeedbackExists { .. }))
        ));

        let out_of_range = FeedbackSubmission {
            rating: 6,
            comments: None,
            would_recommend: Some(false),
        };
        assert!(admit_feedback(&resolved, false, out_of_range, ts(5)).is_err());
        Ok(())
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::CategoryId;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn arb_status() -> impl Strategy<Value = ComplaintStatus> {
        prop::sample::select(ComplaintStatus::ALL.to_vec())
    }

    fn base() -> Option<(Complaint, Timestamp)> {
        let now = Utc.timestamp_opt(1_704_067_200, 0).single()?;
        let category = Category {
            category_id: CategoryId::from_name("Other"),
            name: "Other".to_string(),
            description: String::new(),
            icon: String::new(),
            color: crate::DEFAULT_CATEGORY_COLOR.to_string(),
            department: "General Administration".to_string(),
            created_at: now,
        };
        let input = NewComplaint {
            title: "t".to_string(),
            description: "d".to_string(),
            category_id: category.category_id,
            citizen_name: "n".to_string(),
            citizen_email: "n@example.org".to_string(),
            citizen_phone: None,
            latitude: None,
            longitude: None,
            address: None,
            photo_ref: None,
        };
        submit(input, &category, now).ok().map(|s| (s.complaint, now))
    }

    proptest! {
        #[test]
        fn prop_one_entry_per_actual_change(statuses in prop::collection::vec(arb_status(), 0..24)) {
            let (mut complaint, start) = base().ok_or_else(|| TestCaseError::fail("setup"))?;
            let mut expected = 0usize;
            let mut written = 0usize;
            for (i, status) in statuses.into_iter().enumerate() {
                let now = start + Duration::seconds(i as i64 + 1);
                let before = complaint.status;
                let out = apply_patch(&complaint, &ComplaintPatch::status(status), None, now)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                if before != status {
                    expected += 1;
                    let entry = out.entry.as_ref().ok_or_else(|| TestCaseError::fail("missing entry"))?;
                    prop_assert_eq!(entry.old_status, Some(before));
                    prop_assert_eq!(entry.new_status, status);
                }
                written += usize::from(out.entry.is_some());
                complaint = out.complaint;
            }
            prop_assert_eq!(written, expected);
        }

        #[test]
        fn prop_resolved_at_is_stable(statuses in prop::collection::vec(arb_status(), 1..24)) {
            let (mut complaint, start) = base().ok_or_else(|| TestCaseError::fail("setup"))?;
            let mut first_resolved: Option<Timestamp> = None;
            for (i, status) in statuses.into_iter().enumerate() {
                let now = start + Duration::seconds(i as i64 + 1);
                complaint = apply_patch(&complaint, &ComplaintPatch::status(status), None, now)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?
                    .complaint;
                if status == ComplaintStatus::Resolved && first_resolved.is_none() {
                    first_resolved = Some(now);
                }
                prop_assert_eq!(complaint.resolved_at, first_resolved);
            }
        }
    }
}
