//! API Request and Response Types
//!
//! Wire shapes for the REST surface. Domain values from `civic-core` are
//! converted here so handlers stay free of presentation details.

// Category types
mod category;
pub use category::*;

// Complaint types
mod complaint;
pub use complaint::*;

// Feedback types
mod feedback;
pub use feedback::*;
