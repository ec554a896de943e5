use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    orders::{OrderStatus, PaymentMethod},
    user_roles::Role,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub avatar: Option<String>,
    pub address: Option<String>,
    pub is_activated: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartModelSummary {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub specification: Option<String>,
    pub price: i64,
    pub available: i32,
    /// First attachment path, empty when the model has none.
    pub image: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub model: CartModelSummary,
    pub quantity: i32,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub path: String,
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutLine {
    pub model_id: Uuid,
    pub model_name: String,
    pub product_id: Uuid,
    pub color: Option<String>,
    pub unit: String,
    pub specification: Option<String>,
    pub price: i64,
    pub available: i32,
    pub description: Option<String>,
    pub attachments: Vec<Attachment>,
    pub quantity: i32,
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutPreview {
    pub lines: Vec<CheckoutLine>,
    pub total_cost: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub model_id: Uuid,
    pub quantity: i32,
    pub cost: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer: String,
    pub delivery_address: String,
    pub note: Option<String>,
    pub order_date: DateTime<Utc>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub total_cost: i64,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Feedback {
    pub id: Uuid,
    /// Author name, or `Anonymous`.
    pub user: String,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub title: String,
    pub content: String,
    pub star: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub created_by: String,
    pub title: String,
    pub content: String,
    pub thumbnail: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub latest_update: DateTime<Utc>,
}
