use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::store::{PatientStore, ReviewStore};
use crate::models::{Patient, Prescription, Review};

const PATIENTS: &str = "users";
const REVIEWS: &str = "reviews";

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

fn db_error(action: &str, e: impl std::fmt::Display) -> AppError {
    tracing::error!("Failed to {}: {}", action, e);
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", action, e))
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri)
            .await
            .map_err(|e| db_error("connect to MongoDB", e))?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for clinic-service");

        for (keys, name) in [
            (doc! { "email": 1 }, "email_idx"),
            (doc! { "isCompleted": 1 }, "is_completed_idx"),
            (doc! { "createdAt": 1 }, "created_at_idx"),
        ] {
            let index = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(name.to_string()).build())
                .build();
            self.patients()
                .create_index(index, None)
                .await
                .map_err(|e| db_error(&format!("create {} on {}", name, PATIENTS), e))?;
        }

        let review_created = IndexModel::builder()
            .keys(doc! { "createdAt": 1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_idx".to_string())
                    .build(),
            )
            .build();
        self.reviews()
            .create_index(review_created, None)
            .await
            .map_err(|e| db_error(&format!("create created_at_idx on {}", REVIEWS), e))?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    fn patients(&self) -> Collection<Patient> {
        self.db.collection(PATIENTS)
    }

    fn reviews(&self) -> Collection<Review> {
        self.db.collection(REVIEWS)
    }

    fn oldest_first() -> FindOptions {
        FindOptions::builder().sort(doc! { "createdAt": 1 }).build()
    }

    fn return_updated() -> FindOneAndUpdateOptions {
        FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build()
    }
}

/// `$push` clause appending each non-empty list with `$each`.
fn push_clause(
    prescription: &[Prescription],
    new_prescription: &[Prescription],
) -> Result<Document, AppError> {
    let mut push = Document::new();
    for (field, lines) in [
        ("prescription", prescription),
        ("newPrescription", new_prescription),
    ] {
        if lines.is_empty() {
            continue;
        }
        let each = mongodb::bson::to_bson(lines)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;
        push.insert(field, doc! { "$each": each });
    }
    Ok(push)
}

#[async_trait]
impl PatientStore for MongoStore {
    async fn list(&self) -> Result<Vec<Patient>, AppError> {
        self.patients()
            .find(doc! {}, Self::oldest_first())
            .await
            .map_err(|e| db_error("query patients", e))?
            .try_collect()
            .await
            .map_err(|e| db_error("read patients", e))
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Patient>, AppError> {
        self.patients()
            .find_one(doc! { "_id": *id }, None)
            .await
            .map_err(|e| db_error("find patient", e))
    }

    async fn create(&self, patient: Patient) -> Result<Patient, AppError> {
        self.patients()
            .insert_one(&patient, None)
            .await
            .map_err(|e| db_error("insert patient", e))?;
        Ok(patient)
    }

    async fn append_prescriptions(
        &self,
        id: &ObjectId,
        prescription: Vec<Prescription>,
        new_prescription: Vec<Prescription>,
    ) -> Result<Option<Patient>, AppError> {
        let push = push_clause(&prescription, &new_prescription)?;
        if push.is_empty() {
            return self.get(id).await;
        }

        let update = doc! {
            "$push": push,
            "$set": { "updatedAt": BsonDateTime::now() },
        };
        self.patients()
            .find_one_and_update(doc! { "_id": *id }, update, Self::return_updated())
            .await
            .map_err(|e| db_error("append prescriptions", e))
    }

    async fn mark_completed(&self, id: &ObjectId) -> Result<Option<Patient>, AppError> {
        let update = doc! {
            "$set": { "isCompleted": true, "updatedAt": BsonDateTime::now() },
        };
        self.patients()
            .find_one_and_update(doc! { "_id": *id }, update, Self::return_updated())
            .await
            .map_err(|e| db_error("mark patient completed", e))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| db_error("ping MongoDB", e))?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MongoStore {
    async fn create(&self, review: Review) -> Result<Review, AppError> {
        self.reviews()
            .insert_one(&review, None)
            .await
            .map_err(|e| db_error("insert review", e))?;
        Ok(review)
    }

    async fn list(&self) -> Result<Vec<Review>, AppError> {
        self.reviews()
            .find(doc! {}, Self::oldest_first())
            .await
            .map_err(|e| db_error("query reviews", e))?
            .try_collect()
            .await
            .map_err(|e| db_error("read reviews", e))
    }
}
