//! Civic Storage - Repository Trait and In-Memory Backend
//!
//! The `ComplaintRepository` trait is the only way the service layer touches
//! persisted state. `InMemoryRepository` backs development and tests; the API
//! crate provides the PostgreSQL implementation.

pub mod memory;
pub mod repository;

pub use memory::InMemoryRepository;
pub use repository::ComplaintRepository;
