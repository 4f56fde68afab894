use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

use crate::models::{Patient, Prescription, Review};

/// Persistence for patient records.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// All patients, oldest first.
    async fn list(&self) -> Result<Vec<Patient>, AppError>;

    async fn get(&self, id: &ObjectId) -> Result<Option<Patient>, AppError>;

    async fn create(&self, patient: Patient) -> Result<Patient, AppError>;

    /// Atomically appends to `prescription` and `newPrescription` and returns
    /// the updated record, or `None` if no record has this id. Empty lists
    /// are skipped; with both empty the record is returned as is.
    async fn append_prescriptions(
        &self,
        id: &ObjectId,
        prescription: Vec<Prescription>,
        new_prescription: Vec<Prescription>,
    ) -> Result<Option<Patient>, AppError>;

    /// Sets `isCompleted` and returns the updated record.
    async fn mark_completed(&self, id: &ObjectId) -> Result<Option<Patient>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// Persistence for reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn create(&self, review: Review) -> Result<Review, AppError>;

    /// All reviews, oldest first.
    async fn list(&self) -> Result<Vec<Review>, AppError>;
}
