//! Service Layer
//!
//! Composes the access policy, the repository and outbound event dispatch.
//! Route handlers stay thin: they parse requests, call a service and render
//! the result.

mod category_service;
mod clock;
mod complaint_service;

pub use category_service::*;
pub use clock::*;
pub use complaint_service::*;
