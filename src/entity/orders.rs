use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Order lifecycle. The first four variants form a forward-only progression;
/// `Canceled` is a side branch off `Pending` and `Processing`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Delivering")]
    Delivering,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Canceled")]
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Delivering => "Delivering",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Canceled => "Canceled",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Pending" => Some(OrderStatus::Pending),
            "Processing" => Some(OrderStatus::Processing),
            "Delivering" => Some(OrderStatus::Delivering),
            "Delivered" => Some(OrderStatus::Delivered),
            "Canceled" => Some(OrderStatus::Canceled),
            _ => None,
        }
    }

    /// Position in the progression; `Canceled` has none.
    pub fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Delivering => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Canceled => None,
        }
    }

    /// Strictly forward: re-applying the current status is rejected.
    pub fn can_advance_to(&self, target: OrderStatus) -> bool {
        match (self.rank(), target.rank()) {
            (Some(current), Some(next)) => next > current,
            _ => false,
        }
    }

    pub fn is_cancelable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "PAY_ON_DELIVERY")]
    #[serde(rename = "PAY_ON_DELIVERY")]
    PayOnDelivery,
    #[sea_orm(string_value = "PAYPAL")]
    #[serde(rename = "PAYPAL")]
    Paypal,
}

impl PaymentMethod {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "PAY_ON_DELIVERY" => Some(PaymentMethod::PayOnDelivery),
            "PAYPAL" => Some(PaymentMethod::Paypal),
            _ => None,
        }
    }

    /// PayPal orders are already paid, so they skip the pending step.
    pub fn initial_status(&self) -> OrderStatus {
        match self {
            PaymentMethod::Paypal => OrderStatus::Processing,
            PaymentMethod::PayOnDelivery => OrderStatus::Pending,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub delivery_address: String,
    pub note: Option<String>,
    pub order_date: DateTimeWithTimeZone,
    pub delivered_date: Option<DateTimeWithTimeZone>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub total_cost: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::feedbacks::Entity")]
    Feedbacks,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::feedbacks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedbacks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_forward() {
        assert!(OrderStatus::Pending.can_advance_to(OrderStatus::Delivering));
        assert!(OrderStatus::Processing.can_advance_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivering.can_advance_to(OrderStatus::Processing));
        assert!(!OrderStatus::Delivered.can_advance_to(OrderStatus::Delivered));
    }

    #[test]
    fn canceled_is_outside_the_progression() {
        assert_eq!(OrderStatus::Canceled.rank(), None);
        assert!(!OrderStatus::Canceled.can_advance_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Pending.can_advance_to(OrderStatus::Canceled));
    }

    #[test]
    fn only_early_orders_are_cancelable() {
        assert!(OrderStatus::Pending.is_cancelable());
        assert!(OrderStatus::Processing.is_cancelable());
        assert!(!OrderStatus::Delivering.is_cancelable());
        assert!(!OrderStatus::Delivered.is_cancelable());
        assert!(!OrderStatus::Canceled.is_cancelable());
    }

    #[test]
    fn labels_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Delivering,
            OrderStatus::Delivered,
            OrderStatus::Canceled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }

    #[test]
    fn paypal_starts_processing() {
        assert_eq!(PaymentMethod::Paypal.initial_status(), OrderStatus::Processing);
        assert_eq!(
            PaymentMethod::PayOnDelivery.initial_status(),
            OrderStatus::Pending
        );
        assert_eq!(PaymentMethod::parse("CASH"), None);
    }
}
