pub mod patient;
pub mod review;

pub use patient::{NewPatient, NewPrescription, Patient, Prescription, Sex};
pub use review::{NewReview, Review};

use mongodb::bson::oid::ObjectId;

/// Parses a record id from a URL segment. Anything that is not a valid
/// ObjectId cannot name a stored document, so callers treat `None` as
/// "not found".
pub fn parse_record_id(raw: &str) -> Option<ObjectId> {
    ObjectId::parse_str(raw.trim()).ok()
}

/// Current time truncated to the millisecond precision BSON stores.
pub(crate) fn now() -> chrono::DateTime<chrono::Utc> {
    mongodb::bson::DateTime::now().to_chrono()
}
