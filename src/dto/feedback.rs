use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Feedback;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddFeedbackRequest {
    pub order_id: Uuid,
    pub product_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub content: String,
    #[validate(range(min = 1, max = 5, message = "star must be between 1 and 5"))]
    pub star: i32,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditFeedbackRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub content: String,
    #[validate(range(min = 1, max = 5, message = "star must be between 1 and 5"))]
    pub star: i32,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackList {
    pub items: Vec<Feedback>,
}
