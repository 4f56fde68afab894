pub mod admin_session;

pub use admin_session::{admin_session_middleware, has_admin_session};
