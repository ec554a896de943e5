use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::orders::{OrderList, PlaceOrderRequest},
    entity::{
        Users,
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel, OrderStatus, PaymentMethod},
        product_models::{Column as ModelCol, Entity as ProductModels},
        users::Column as UserCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, current_user},
    models::{Order, OrderItem},
    notify::send_notification,
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::cart_service::load_cart_rows,
    state::AppState,
};

const CANCEL_TITLE: &str = "Order canceled";
const CANCEL_BODY: &str = "Your order has been canceled successfully.";

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let customer = current_user(&state.orm, user).await?;
    let mut condition = Condition::all().add(OrderCol::UserId.eq(customer.id));

    if let Some(label) = query.status.as_deref().filter(|s| !s.is_empty()) {
        match OrderStatus::parse(label) {
            Some(status) => condition = condition.add(OrderCol::Status.eq(status)),
            // No order can carry an unknown label.
            None => {
                return Ok(ApiResponse::success(
                    "Ok",
                    OrderList { items: Vec::new() },
                    Some(Meta::total(0)),
                ));
            }
        }
    }

    let orders = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::OrderDate)
        .all(&state.orm)
        .await?;
    let items = project_orders(&state.orm, orders).await?;

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let customer = current_user(&state.orm, user).await?;
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(customer.id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::not_found("order", id)),
    };

    let order = project_order(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

/// Turn the caller's cart into an order. Order, items, stock and cart
/// removal commit together or not at all.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    payload.validate()?;
    let payment_method = PaymentMethod::parse(&payload.payment_method).ok_or_else(|| {
        AppError::invalid("The payment method must be \"PAY_ON_DELIVERY\" or \"PAYPAL\"")
    })?;

    let txn = state.orm.begin().await?;
    let customer = current_user(&txn, user).await?;

    let rows = load_cart_rows(&txn, customer.id, true).await?;
    if rows.is_empty() {
        return Err(AppError::invalid("There is no item in user cart"));
    }

    let mut total_cost: i64 = 0;
    for row in &rows {
        if row.model.available < row.item.quantity {
            return Err(AppError::invalid(format!(
                "Insufficient stock for model {}",
                row.model.name
            )));
        }
        total_cost += row.line_total();
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(customer.id),
        delivery_address: Set(payload.delivery_address),
        note: Set(payload.note),
        order_date: Set(Utc::now().into()),
        delivered_date: Set(None),
        payment_method: Set(payment_method),
        status: Set(payment_method.initial_status()),
        total_cost: Set(total_cost),
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(rows.len());
    for row in &rows {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            model_id: Set(row.model.id),
            quantity: Set(row.item.quantity),
            cost: Set(row.model.price),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item, row.model.product_id));

        ProductModels::update_many()
            .col_expr(
                ModelCol::Available,
                Expr::col(ModelCol::Available).sub(row.item.quantity),
            )
            .filter(ModelCol::Id.eq(row.model.id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(customer.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    tracing::info!(order_id = %order.id, user_id = %customer.id, total_cost, "order placed");

    Ok(ApiResponse::success(
        "New order created",
        order_from_entity(order, customer.display_name(), items),
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let customer = current_user(&txn, user).await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(customer.id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "There is no order with id = {id} in user's order list"
            ))
        })?;

    let order = cancel_locked_order(&txn, order).await?;
    txn.commit().await?;

    notify_canceled(state, order.user_id).await;

    Ok(ApiResponse::message(format!(
        "Cancel order with id = {id} successfully"
    )))
}

/// Cancel an order already locked by `txn`.
pub(crate) async fn cancel_locked_order(
    txn: &DatabaseTransaction,
    order: OrderModel,
) -> AppResult<OrderModel> {
    if !order.status.is_cancelable() {
        return Err(AppError::invalid(format!(
            "Cannot cancel order in {}",
            order.status.as_str()
        )));
    }

    let order_id = order.id;
    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Canceled);
    let order = active.update(txn).await?;
    tracing::info!(order_id = %order_id, "order canceled");
    Ok(order)
}

/// Fire-and-forget: a failed notification never fails the cancellation.
pub(crate) async fn notify_canceled(state: &AppState, user_id: Uuid) {
    if let Err(err) = send_notification(&state.orm, user_id, CANCEL_TITLE, CANCEL_BODY).await {
        tracing::warn!(error = %err, user_id = %user_id, "cancel notification failed");
    }
}

pub(crate) async fn project_order<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<Order> {
    let id = order.id;
    project_orders(conn, vec![order])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("order", id))
}

/// Attach items (with product ids) and customer names, keeping input order.
pub(crate) async fn project_orders<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<Order>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .all(conn)
        .await?;

    let model_ids: Vec<Uuid> = items.iter().map(|i| i.model_id).collect();
    let product_of: HashMap<Uuid, Uuid> = if model_ids.is_empty() {
        HashMap::new()
    } else {
        ProductModels::find()
            .filter(ModelCol::Id.is_in(model_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m.product_id))
            .collect()
    };

    let names: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u.display_name()))
        .collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
        let product_id = product_of
            .get(&item.model_id)
            .copied()
            .ok_or_else(|| AppError::not_found("model", item.model_id))?;
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item, product_id));
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            let customer = names.get(&order.user_id).cloned().unwrap_or_default();
            order_from_entity(order, customer, items)
        })
        .collect())
}

fn order_from_entity(model: OrderModel, customer: String, items: Vec<OrderItem>) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        customer,
        delivery_address: model.delivery_address,
        note: model.note,
        order_date: model.order_date.with_timezone(&Utc),
        delivered_date: model.delivered_date.map(|dt| dt.with_timezone(&Utc)),
        payment_method: model.payment_method,
        status: model.status,
        total_cost: model.total_cost,
        items,
    }
}

fn order_item_from_entity(model: OrderItemModel, product_id: Uuid) -> OrderItem {
    OrderItem {
        id: model.id,
        product_id,
        model_id: model.model_id,
        quantity: model.quantity,
        cost: model.cost,
    }
}
