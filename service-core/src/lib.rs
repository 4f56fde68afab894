//! service-core: Shared infrastructure for the clinic services.
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod observability;

