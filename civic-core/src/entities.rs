//! Entity structures

use crate::{
    CategoryId, ComplaintId, ComplaintStatus, FeedbackId, GeoPoint, HistoryEntryId, Priority,
    PrincipalId, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Default presentation colour for categories without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";

/// Complaint category. Reference data that also names the department
/// new complaints in the category are routed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    /// Icon class or emoji
    pub icon: String,
    /// Hex colour code, e.g. `#3B82F6`
    pub color: String,
    pub department: String,
    pub created_at: Timestamp,
}

/// Input for registering a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub color: Option<String>,
    #[serde(default)]
    pub department: String,
}

/// Category together with the number of complaints filed under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWithCount {
    pub category: Category,
    pub complaint_count: i64,
}

/// A citizen-filed complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub complaint_id: ComplaintId,
    /// Citizen-facing identifier, assigned once at creation.
    pub reference_number: String,
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub citizen_name: String,
    pub citizen_email: String,
    pub citizen_phone: String,
    /// Both coordinates or neither.
    pub location: Option<GeoPoint>,
    pub address: String,
    /// Media store reference for the attached photo.
    pub photo_ref: Option<String>,
    pub status: ComplaintStatus,
    pub priority: Priority,
    pub assigned_to: Option<PrincipalId>,
    pub department: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// First time the complaint reached `resolved`. Never cleared.
    pub resolved_at: Option<Timestamp>,
}

/// Citizen submission payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub citizen_name: String,
    pub citizen_email: String,
    pub citizen_phone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub photo_ref: Option<String>,
}

/// Administrative update. Absent fields are left untouched.
///
/// `assigned_to` distinguishes "leave as is" (`None`) from "unassign"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintPatch {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Option<PrincipalId>>,
    pub department: Option<String>,
}

impl ComplaintPatch {
    /// Patch that only moves the status.
    pub fn status(status: ComplaintStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
            && self.department.is_none()
    }
}

/// One row of the append-only status ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub entry_id: HistoryEntryId,
    pub complaint_id: ComplaintId,
    /// `None` only for the entry recorded at submission.
    pub old_status: Option<ComplaintStatus>,
    pub new_status: ComplaintStatus,
    /// `None` means the system made the change.
    pub changed_by: Option<PrincipalId>,
    pub notes: String,
    pub created_at: Timestamp,
}

/// Citizen rating of how a complaint was handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub feedback_id: FeedbackId,
    pub complaint_id: ComplaintId,
    /// 1 (poor) to 5 (excellent)
    pub rating: i16,
    pub comments: String,
    pub would_recommend: bool,
    pub created_at: Timestamp,
}

/// Feedback payload as submitted by the citizen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub rating: i64,
    pub comments: Option<String>,
    pub would_recommend: Option<bool>,
}

/// Complaint joined with everything the detail view shows.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplaintDetail {
    pub complaint: Complaint,
    pub category: CategoryWithCount,
    /// Newest first.
    pub history: Vec<StatusHistoryEntry>,
    pub feedback: Option<Feedback>,
}
