use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::UserProfile;

/// Profile fields a user may change. Email and role are managed elsewhere.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub avatar: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub user_email: String,
    /// `ADMIN` or `CUSTOMER`.
    pub role_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<UserProfile>,
}
