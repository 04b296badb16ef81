//! Enum types for civic entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Entity type discriminator used in errors and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Category,
    Complaint,
    StatusHistoryEntry,
    Feedback,
}

/// Lifecycle status of a complaint.
///
/// `closed` and `rejected` read as end states but nothing prevents a later
/// administrative update from moving a complaint out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    /// Submitted, awaiting triage
    #[default]
    Pending,
    /// Seen by staff and routed to a department
    Acknowledged,
    /// Work has started
    InProgress,
    /// Work finished; citizen may leave feedback
    Resolved,
    /// Archived after resolution
    Closed,
    /// Declined by staff
    Rejected,
}

impl ComplaintStatus {
    /// Every status, in declaration order.
    pub const ALL: [ComplaintStatus; 6] = [
        ComplaintStatus::Pending,
        ComplaintStatus::Acknowledged,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Closed,
        ComplaintStatus::Rejected,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::Acknowledged => "acknowledged",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Closed => "closed",
            ComplaintStatus::Rejected => "rejected",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ComplaintStatusParseError> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "pending" => Ok(ComplaintStatus::Pending),
            "acknowledged" => Ok(ComplaintStatus::Acknowledged),
            "in_progress" => Ok(ComplaintStatus::InProgress),
            "resolved" => Ok(ComplaintStatus::Resolved),
            "closed" => Ok(ComplaintStatus::Closed),
            "rejected" => Ok(ComplaintStatus::Rejected),
            _ => Err(ComplaintStatusParseError(s.to_string())),
        }
    }

    /// Label shown to citizens and staff.
    pub fn display_name(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::Acknowledged => "Acknowledged",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Closed => "Closed",
            ComplaintStatus::Rejected => "Rejected",
        }
    }

    /// Whether a complaint in this status accepts citizen feedback.
    pub fn accepts_feedback(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Closed)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = ComplaintStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid complaint status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintStatusParseError(pub String);

impl fmt::Display for ComplaintStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid complaint status: {}", self.0)
    }
}

impl std::error::Error for ComplaintStatusParseError {}

/// Triage priority of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, PriorityParseError> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(PriorityParseError(s.to_string())),
        }
    }

    /// Label shown to citizens and staff.
    pub fn display_name(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Priority {
    type Err = PriorityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid priority string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityParseError(pub String);

impl fmt::Display for PriorityParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid priority: {}", self.0)
    }
}

impl std::error::Error for PriorityParseError {}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityType::Category => "category",
            EntityType::Complaint => "complaint",
            EntityType::StatusHistoryEntry => "status_history",
            EntityType::Feedback => "feedback",
        };
        write!(f, "{}", value)
    }
}
