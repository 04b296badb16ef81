//! Civic Core - Domain Types and Rules
//!
//! Entities, identifiers and the pure functions that govern a complaint's
//! lifecycle: submission, administrative patches, feedback admission, access
//! decisions, proximity filtering and statistics. No I/O lives here; the
//! storage and API crates build on these types.

pub mod catalog;
pub mod entities;
pub mod enums;
pub mod error;
pub mod events;
pub mod filter;
pub mod geo;
pub mod identity;
pub mod lifecycle;
pub mod policy;
pub mod principal;
pub mod stats;

pub use catalog::{build_category, default_categories};
pub use entities::{
    Category, CategoryWithCount, Complaint, ComplaintDetail, ComplaintPatch, Feedback,
    FeedbackSubmission, NewCategory, NewComplaint, StatusHistoryEntry, DEFAULT_CATEGORY_COLOR,
};
pub use enums::{
    ComplaintStatus, ComplaintStatusParseError, EntityType, Priority, PriorityParseError,
};
pub use error::{
    CivicError, CivicResult, ConflictError, StorageError, ValidationError,
};
pub use events::{events_for_patch, ComplaintEvent};
pub use filter::{ComplaintFilter, OrderField, Ordering, Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use geo::{haversine_km, validate_radius, within_radius, GeoPoint, DEFAULT_RADIUS_KM, EARTH_RADIUS_KM};
pub use identity::{
    CategoryId, ComplaintId, EntityIdType, FeedbackId, HistoryEntryId, PrincipalId, Timestamp,
    CIVIC_NAMESPACE,
};
pub use lifecycle::{
    admit_feedback, apply_patch, is_valid_reference_number, reference_number_for, submit,
    PatchOutcome, Submission,
};
pub use policy::{authorize, decide, Action, Decision, DenyReason};
pub use principal::Principal;
pub use stats::ComplaintStatistics;
