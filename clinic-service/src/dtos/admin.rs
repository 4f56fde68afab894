use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdminLoginRequest {
    #[serde(rename = "userId")]
    #[validate(length(min = 1, message = "User ID is required"))]
    #[schema(example = "admin")]
    pub user_id: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionStatus {
    #[serde(rename = "isAuth")]
    pub is_auth: bool,
}
