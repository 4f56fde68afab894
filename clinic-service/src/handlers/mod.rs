//! HTTP handlers for clinic-service.

pub mod admin;
pub mod health;
pub mod metrics;
pub mod patients;
pub mod reviews;

pub use admin::*;
pub use health::*;
pub use patients::*;
pub use reviews::*;
