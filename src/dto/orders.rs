use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Order;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlaceOrderRequest {
    #[validate(length(
        min = 2,
        max = 500,
        message = "Delivery address must be greater than 1 and less than 500 characters"
    ))]
    pub delivery_address: String,
    /// `PAY_ON_DELIVERY` or `PAYPAL`.
    pub payment_method: String,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
