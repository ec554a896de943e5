use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, QuerySelect, TransactionTrait};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, OrderStatus},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, current_user, ensure_admin},
    models::Order,
    response::{ApiResponse, Meta},
    services::order_service::{cancel_locked_order, notify_canceled, project_order, project_orders},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    current_user(&state.orm, user).await?;

    let orders = Orders::find()
        .order_by_desc(OrderCol::OrderDate)
        .all(&state.orm)
        .await?;
    let items = project_orders(&state.orm, orders).await?;

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Move an order forward through the lifecycle. `Canceled` follows the same
/// rule as a customer cancellation.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let target = parse_status(&payload.status)?;

    let txn = state.orm.begin().await?;
    current_user(&txn, user).await?;

    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::not_found("order", id)),
    };

    let updated = if target == OrderStatus::Canceled {
        cancel_locked_order(&txn, existing).await?
    } else {
        let current = existing.status;
        if !current.can_advance_to(target) {
            return Err(AppError::invalid(format!(
                "Cannot change order status from {} to {}",
                current.as_str(),
                target.as_str()
            )));
        }

        let mut active: OrderActive = existing.into();
        active.status = Set(target);
        if target == OrderStatus::Delivered {
            active.delivered_date = Set(Some(Utc::now().into()));
        }
        let order = active.update(&txn).await?;
        tracing::info!(
            order_id = %order.id,
            from = current.as_str(),
            to = target.as_str(),
            "order status changed"
        );
        order
    };

    txn.commit().await?;

    if updated.status == OrderStatus::Canceled {
        notify_canceled(state, updated.user_id).await;
    }

    let order = project_order(&state.orm, updated).await?;
    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}

fn parse_status(label: &str) -> Result<OrderStatus, AppError> {
    OrderStatus::parse(label).ok_or_else(|| {
        AppError::invalid(
            "The status must be one of Pending, Processing, Delivering, Delivered, Canceled",
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_canonical_status_labels() {
        assert_eq!(parse_status("Delivering").unwrap(), OrderStatus::Delivering);
        assert!(matches!(
            parse_status("delivered"),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(parse_status(""), Err(AppError::InvalidRequest(_))));
    }
}
