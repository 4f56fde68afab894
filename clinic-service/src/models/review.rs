use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Patient-submitted rating and comment, stored in `reviews`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub name: String,
    pub email: String,
    pub rating: f64,
    pub comment: String,
}

impl Review {
    pub fn new(input: NewReview) -> Self {
        Self {
            id: ObjectId::new(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            rating: input.rating,
            comment: input.comment.trim().to_string(),
            created_at: super::now(),
        }
    }
}
