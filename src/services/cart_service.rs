use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::cart::{AddToCartRequest, CartList, EditCartRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        model_attachments::{Column as AttachmentCol, Entity as ModelAttachments, Model as AttachmentModel},
        product_models::{Column as ModelCol, Entity as ProductModels, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, current_user},
    models::{Attachment, CartLine, CartModelSummary, CheckoutLine, CheckoutPreview},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// A cart line joined with the model it points at.
pub(crate) struct CartRow {
    pub item: CartModel,
    pub model: ProductModel,
}

impl CartRow {
    pub fn line_total(&self) -> i64 {
        self.model.price * i64::from(self.item.quantity)
    }
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let customer = current_user(&txn, user).await?;

    let model = ProductModels::find_by_id(payload.model_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("model", payload.model_id))?;
    if payload.quantity > model.available {
        return Err(AppError::invalid(
            "The quantity is greater than model available",
        ));
    }

    // Upsert on (user, model): an existing line gets the quantity added.
    let line = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(customer.id),
        model_id: Set(model.id),
        quantity: Set(payload.quantity),
        created_at: Set(Utc::now().into()),
    };
    CartItems::insert(line)
        .on_conflict(
            OnConflict::columns([CartCol::UserId, CartCol::ModelId])
                .value(
                    CartCol::Quantity,
                    Expr::col((CartItems, CartCol::Quantity)).add(payload.quantity),
                )
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;
    tracing::debug!(user_id = %customer.id, model_id = %model.id, quantity = payload.quantity, "cart line added");

    Ok(ApiResponse::message("Add to cart successfully"))
}

pub async fn edit_cart(
    state: &AppState,
    user: &AuthUser,
    cart_item_id: Uuid,
    payload: EditCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    let customer = current_user(&state.orm, user).await?;

    let item = CartItems::find()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(cart_item_id))
                .add(CartCol::UserId.eq(customer.id)),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("cart item", cart_item_id))?;

    if ProductModels::find_by_id(payload.model_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("model", payload.model_id));
    }

    // Stock is re-checked when the order is placed.
    let mut active: CartActive = item.into();
    active.quantity = Set(payload.quantity);
    active.update(&state.orm).await?;

    Ok(ApiResponse::message("Update cart item successfully"))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    cart_item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let customer = current_user(&state.orm, user).await?;

    let result = CartItems::delete_many()
        .filter(
            Condition::all()
                .add(CartCol::Id.eq(cart_item_id))
                .add(CartCol::UserId.eq(customer.id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("cart item", cart_item_id));
    }

    Ok(ApiResponse::message(format!(
        "Remove cart item with id = {cart_item_id} successfully"
    )))
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let customer = current_user(&state.orm, user).await?;
    let rows = load_cart_rows(&state.orm, customer.id, false).await?;
    let attachments = load_attachments(&state.orm, model_ids(&rows)).await?;

    let items: Vec<CartLine> = rows
        .into_iter()
        .map(|row| {
            let image = attachments
                .get(&row.model.id)
                .and_then(|list| list.first())
                .map(|a| a.path.clone())
                .unwrap_or_default();
            let total = row.line_total();
            CartLine {
                id: row.item.id,
                user_id: row.item.user_id,
                quantity: row.item.quantity,
                total,
                model: CartModelSummary {
                    id: row.model.id,
                    name: row.model.name,
                    color: row.model.color,
                    specification: row.model.specification,
                    price: row.model.price,
                    available: row.model.available,
                    image,
                    description: row.model.description,
                },
            }
        })
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Price the current cart without placing an order.
pub async fn checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CheckoutPreview>> {
    let customer = current_user(&state.orm, user).await?;
    let rows = load_cart_rows(&state.orm, customer.id, false).await?;
    if rows.is_empty() {
        return Err(AppError::invalid("There is no items in user cart"));
    }

    let mut attachments = load_attachments(&state.orm, model_ids(&rows)).await?;
    let total_cost: i64 = rows.iter().map(CartRow::line_total).sum();

    let lines = rows
        .into_iter()
        .map(|row| {
            let total = row.line_total();
            CheckoutLine {
                model_id: row.model.id,
                model_name: row.model.name,
                product_id: row.model.product_id,
                color: row.model.color,
                unit: row.model.unit,
                specification: row.model.specification,
                price: row.model.price,
                available: row.model.available,
                description: row.model.description,
                attachments: attachments
                    .remove(&row.model.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| Attachment {
                        path: a.path,
                        kind: a.kind,
                    })
                    .collect(),
                quantity: row.item.quantity,
                total,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "Checkout",
        CheckoutPreview { lines, total_cost },
        Some(Meta::empty()),
    ))
}

/// Cart lines of a user, oldest first. With `for_update` both the lines and
/// their models are row-locked for the enclosing transaction.
pub(crate) async fn load_cart_rows<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    for_update: bool,
) -> AppResult<Vec<CartRow>> {
    let mut items = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt);
    if for_update {
        items = items.lock(LockType::Update);
    }
    let items = items.all(conn).await?;
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = items.iter().map(|item| item.model_id).collect();
    let mut models = ProductModels::find().filter(ModelCol::Id.is_in(ids));
    if for_update {
        models = models.lock(LockType::Update);
    }
    let models: HashMap<Uuid, ProductModel> = models
        .all(conn)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    items
        .into_iter()
        .map(|item| {
            let model = models
                .get(&item.model_id)
                .cloned()
                .ok_or_else(|| AppError::not_found("model", item.model_id))?;
            Ok(CartRow { item, model })
        })
        .collect()
}

fn model_ids(rows: &[CartRow]) -> Vec<Uuid> {
    rows.iter().map(|row| row.model.id).collect()
}

async fn load_attachments<C: ConnectionTrait>(
    conn: &C,
    model_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Vec<AttachmentModel>>> {
    if model_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut grouped: HashMap<Uuid, Vec<AttachmentModel>> = HashMap::new();
    for attachment in ModelAttachments::find()
        .filter(AttachmentCol::ModelId.is_in(model_ids))
        .order_by_asc(AttachmentCol::CreatedAt)
        .all(conn)
        .await?
    {
        grouped.entry(attachment.model_id).or_default().push(attachment);
    }
    Ok(grouped)
}
