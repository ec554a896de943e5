use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Post;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PostRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    /// Post body; stored compressed.
    pub description: String,
    pub thumbnail: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostList {
    pub items: Vec<Post>,
}
