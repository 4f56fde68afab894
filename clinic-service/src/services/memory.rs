use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;
use std::sync::{Mutex, MutexGuard};

use super::store::{PatientStore, ReviewStore};
use crate::models::{Patient, Prescription, Review};

/// Process-local store used by tests and `STORE_BACKEND=memory` runs.
#[derive(Default)]
pub struct InMemoryStore {
    patients: Mutex<Vec<Patient>>,
    reviews: Mutex<Vec<Review>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, AppError> {
    mutex
        .lock()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("{} store mutex poisoned: {}", what, e)))
}

#[async_trait]
impl PatientStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<Patient>, AppError> {
        Ok(lock(&self.patients, "patient")?.clone())
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Patient>, AppError> {
        Ok(lock(&self.patients, "patient")?
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn create(&self, patient: Patient) -> Result<Patient, AppError> {
        lock(&self.patients, "patient")?.push(patient.clone());
        Ok(patient)
    }

    async fn append_prescriptions(
        &self,
        id: &ObjectId,
        prescription: Vec<Prescription>,
        new_prescription: Vec<Prescription>,
    ) -> Result<Option<Patient>, AppError> {
        let mut patients = lock(&self.patients, "patient")?;
        Ok(patients.iter_mut().find(|p| &p.id == id).map(|p| {
            p.append_prescriptions(prescription, new_prescription);
            p.clone()
        }))
    }

    async fn mark_completed(&self, id: &ObjectId) -> Result<Option<Patient>, AppError> {
        let mut patients = lock(&self.patients, "patient")?;
        Ok(patients.iter_mut().find(|p| &p.id == id).map(|p| {
            p.mark_completed();
            p.clone()
        }))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn create(&self, review: Review) -> Result<Review, AppError> {
        lock(&self.reviews, "review")?.push(review.clone());
        Ok(review)
    }

    async fn list(&self) -> Result<Vec<Review>, AppError> {
        Ok(lock(&self.reviews, "review")?.clone())
    }
}
