use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::ValidationIssue;
use utoipa::ToSchema;
use validator::Validate;

use super::validate_not_blank;
use crate::models::{NewReview, Review};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    #[validate(
        required(message = "Name is required"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Meera")]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email address")
    )]
    #[schema(example = "meera@example.com")]
    pub email: Option<String>,

    #[validate(
        required(message = "Rating is required"),
        range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5")
    )]
    #[schema(example = 5)]
    pub rating: Option<f64>,

    #[serde(default, alias = "message")]
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: String,
}

impl CreateReviewRequest {
    pub fn into_new_review(self) -> NewReview {
        NewReview {
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            rating: self.rating.unwrap_or_default(),
            comment: self.comment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub rating: f64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id.to_hex(),
            name: r.name,
            email: r.email,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewCreatedResponse {
    pub success: bool,
    #[schema(example = "Review created")]
    pub message: String,
    pub data: ReviewResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewListResponse {
    pub success: bool,
    #[schema(example = "Reviews fetched successfully")]
    pub message: String,
    pub data: Vec<ReviewResponse>,
}

/// Failure envelope for the review routes, which report errors as
/// `{ success: false, message }` instead of the service-wide shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewFailureResponse {
    pub success: bool,
    #[schema(example = "Server error")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub errors: Option<Vec<ValidationIssue>>,
}
