use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::{
    error::{validation_issues, AppError},
    extract::ValidatedJson,
};

use crate::{
    dtos::reviews::{
        CreateReviewRequest, ReviewCreatedResponse, ReviewFailureResponse, ReviewListResponse,
    },
    models::Review,
    services::metrics,
    AppState,
};

/// Renders a failure in the review routes' `{ success: false, .. }` shape.
fn review_failure(err: AppError) -> Response {
    let (status, message, errors) = match err {
        AppError::ValidationError(errors) => (
            StatusCode::BAD_REQUEST,
            "Validation failed".to_string(),
            Some(validation_issues(&errors)),
        ),
        AppError::BadRequest(e) => (StatusCode::BAD_REQUEST, e.to_string(), None),
        other => {
            tracing::error!(error = %other, "Review request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error".to_string(),
                None,
            )
        }
    };

    (
        status,
        Json(ReviewFailureResponse {
            success: false,
            message,
            errors,
        }),
    )
        .into_response()
}

/// Submit a review
#[utoipa::path(
    post,
    path = "/api/review",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewCreatedResponse),
        (status = 400, description = "Validation error", body = ReviewFailureResponse),
        (status = 500, description = "Server error", body = ReviewFailureResponse)
    ),
    tag = "Reviews"
)]
#[tracing::instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    payload: Result<ValidatedJson<CreateReviewRequest>, AppError>,
) -> Response {
    let ValidatedJson(req) = match payload {
        Ok(payload) => payload,
        Err(e) => return review_failure(e),
    };

    match state.reviews.create(Review::new(req.into_new_review())).await {
        Ok(review) => {
            metrics::record_review_submitted();
            tracing::info!(review_id = %review.id, rating = review.rating, "Review submitted");
            (
                StatusCode::CREATED,
                Json(ReviewCreatedResponse {
                    success: true,
                    message: "Review created".to_string(),
                    data: review.into(),
                }),
            )
                .into_response()
        }
        Err(e) => review_failure(e),
    }
}

/// List all reviews
#[utoipa::path(
    get,
    path = "/api/reviews",
    responses(
        (status = 200, description = "Reviews fetched successfully", body = ReviewListResponse),
        (status = 500, description = "Server error", body = ReviewFailureResponse)
    ),
    tag = "Reviews"
)]
#[tracing::instrument(skip(state))]
pub async fn list_reviews(State(state): State<AppState>) -> Response {
    match state.reviews.list().await {
        Ok(reviews) => Json(ReviewListResponse {
            success: true,
            message: "Reviews fetched successfully".to_string(),
            data: reviews.into_iter().map(Into::into).collect(),
        })
        .into_response(),
        Err(e) => review_failure(e),
    }
}
