//! Error types for civic operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: Uuid,
        reason: String,
    },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Corrupt row for {entity_type:?}: {reason}")]
    CorruptRow { entity_type: EntityType, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Validation errors for malformed or missing input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Field {field} exceeds {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Field {field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    #[error("Unknown category: {category_id}")]
    UnknownCategory { category_id: Uuid },

    #[error("Empty update: at least one of {fields} must be supplied")]
    EmptyPatch { fields: String },
}

/// Uniqueness and referential conflicts.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConflictError {
    #[error("Feedback already submitted for complaint {complaint_id}")]
    FeedbackExists { complaint_id: Uuid },

    #[error("Reference number {reference_number} is already taken")]
    ReferenceCollision { reference_number: String },

    #[error("Category {category_id} is referenced by {complaints} complaint(s)")]
    CategoryInUse { category_id: Uuid, complaints: i64 },

    #[error("Category name {name} is already taken")]
    CategoryNameTaken { name: String },
}

/// Master error type for all civic errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CivicError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity_type:?} with id {id} not found")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CivicError {
    /// Shorthand for a not-found error on a typed id.
    pub fn not_found<I: crate::EntityIdType>(entity_type: EntityType, id: I) -> Self {
        CivicError::NotFound {
            entity_type,
            id: id.as_uuid(),
        }
    }

    /// Shorthand for a policy denial.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        CivicError::Forbidden {
            reason: reason.into(),
        }
    }

    /// Shorthand for an action not permitted by the current status.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        CivicError::InvalidState {
            reason: reason.into(),
        }
    }
}

/// Result type alias for civic operations.
pub type CivicResult<T> = Result<T, CivicError>;

// =============================================================================
// TESTS
// =============================================================================
