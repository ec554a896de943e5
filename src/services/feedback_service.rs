use std::collections::HashMap;

use chrono::{DateTime, Months, Utc};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::feedback::{AddFeedbackRequest, EditFeedbackRequest, FeedbackList},
    entity::{
        Users,
        feedbacks::{ActiveModel as FeedbackActive, Column as FeedbackCol, Entity as Feedbacks, Model as FeedbackModel},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{Column as OrderCol, Entity as Orders, OrderStatus},
        product_models::{Column as ModelCol, Entity as ProductModels},
        products::{ActiveModel as ProductActive, Entity as Products},
        users::Column as UserCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, current_user, ensure_admin},
    models::Feedback,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const ANONYMOUS: &str = "Anonymous";

pub const DUPLICATE_FEEDBACK: &str = "This product already has feedback for this order";

pub async fn list_by_product(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<FeedbackList>> {
    let feedbacks = Feedbacks::find()
        .filter(FeedbackCol::ProductId.eq(product_id))
        .order_by_desc(FeedbackCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let author_ids: Vec<Uuid> = feedbacks
        .iter()
        .filter(|f| !f.is_anonymous)
        .map(|f| f.user_id)
        .collect();
    let names: HashMap<Uuid, String> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        Users::find()
            .filter(UserCol::Id.is_in(author_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|u| (u.id, u.display_name()))
            .collect()
    };

    let items: Vec<Feedback> = feedbacks
        .into_iter()
        .map(|f| {
            let author = names.get(&f.user_id).cloned().unwrap_or_default();
            feedback_from_entity(f, author)
        })
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Ok", FeedbackList { items }, Some(meta)))
}

/// Rate a product from a delivered order, at most once per (order, product).
pub async fn add_feedback(
    state: &AppState,
    user: &AuthUser,
    payload: AddFeedbackRequest,
) -> AppResult<ApiResponse<Feedback>> {
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let customer = current_user(&txn, user).await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(payload.order_id))
                .add(OrderCol::UserId.eq(customer.id)),
        )
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "There is no order with id = {} in user's order list",
                payload.order_id
            ))
        })?;

    if order.status != OrderStatus::Delivered {
        return Err(AppError::invalid(
            "The order status must be \"Delivered\" to give feedback",
        ));
    }
    let delivered = order
        .delivered_date
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::invalid("The order has no delivery date"))?;
    if !within_one_month(delivered, Utc::now()) {
        return Err(AppError::invalid(
            "Feedback can only be added within 1 month from the date of delivery",
        ));
    }

    if !order_contains_product(&txn, order.id, payload.product_id).await? {
        return Err(AppError::invalid(format!(
            "There is no product with id = {} in user's order list",
            payload.product_id
        )));
    }

    let duplicate = Feedbacks::find()
        .filter(
            Condition::all()
                .add(FeedbackCol::OrderId.eq(order.id))
                .add(FeedbackCol::ProductId.eq(payload.product_id)),
        )
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::invalid(DUPLICATE_FEEDBACK));
    }

    let feedback = FeedbackActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(customer.id),
        order_id: Set(order.id),
        product_id: Set(payload.product_id),
        title: Set(payload.title),
        content: Set(payload.content),
        star: Set(payload.star),
        is_anonymous: Set(payload.is_anonymous),
        allow_edit: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await
    .map_err(|err| AppError::unique_violation(err, DUPLICATE_FEEDBACK))?;

    refresh_vote_star(&txn, feedback.product_id).await?;
    txn.commit().await?;
    tracing::info!(feedback_id = %feedback.id, product_id = %feedback.product_id, "feedback added");

    Ok(ApiResponse::success(
        "New feedback created",
        feedback_from_entity(feedback, customer.display_name()),
        Some(Meta::empty()),
    ))
}

pub async fn edit_feedback(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: EditFeedbackRequest,
) -> AppResult<ApiResponse<Feedback>> {
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let customer = current_user(&txn, user).await?;

    let existing = Feedbacks::find()
        .filter(
            Condition::all()
                .add(FeedbackCol::Id.eq(id))
                .add(FeedbackCol::UserId.eq(customer.id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("The user has no feedback with id = {id}")))?;

    if !existing.allow_edit {
        return Err(AppError::invalid("The feedback can be edited one time only"));
    }
    if !within_one_month(existing.created_at.with_timezone(&Utc), Utc::now()) {
        return Err(AppError::invalid(
            "Feedback can only be edited within 1 month from its creation date",
        ));
    }

    let mut active: FeedbackActive = existing.into();
    active.title = Set(payload.title);
    active.content = Set(payload.content);
    active.star = Set(payload.star);
    active.is_anonymous = Set(payload.is_anonymous);
    active.allow_edit = Set(false);
    let feedback = active.update(&txn).await?;

    refresh_vote_star(&txn, feedback.product_id).await?;
    txn.commit().await?;
    tracing::info!(feedback_id = %feedback.id, "feedback edited");

    Ok(ApiResponse::success(
        "Feedback updated",
        feedback_from_entity(feedback, customer.display_name()),
        Some(Meta::empty()),
    ))
}

pub async fn remove_feedback(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    current_user(&txn, user).await?;

    let existing = Feedbacks::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("feedback", id))?;
    let product_id = existing.product_id;

    Feedbacks::delete_by_id(existing.id).exec(&txn).await?;
    refresh_vote_star(&txn, product_id).await?;
    txn.commit().await?;
    tracing::info!(feedback_id = %id, product_id = %product_id, "feedback removed");

    Ok(ApiResponse::message(format!(
        "Remove feedback with id = {id} successfully"
    )))
}

/// Mean star rounded to one decimal, half away from zero.
pub fn average_star(stars: &[i32]) -> Option<f64> {
    if stars.is_empty() {
        return None;
    }
    let sum: i64 = stars.iter().map(|&s| i64::from(s)).sum();
    let mean = sum as f64 / stars.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// `now` is no later than one calendar month after `start`.
pub fn within_one_month(start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match start.checked_add_months(Months::new(1)) {
        Some(deadline) => now <= deadline,
        None => false,
    }
}

/// Recompute `vote_star` from every feedback of the product. The product row
/// stays locked until `txn` ends.
async fn refresh_vote_star(txn: &DatabaseTransaction, product_id: Uuid) -> AppResult<()> {
    let product = Products::find_by_id(product_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("product", product_id))?;

    let stars: Vec<i32> = Feedbacks::find()
        .filter(FeedbackCol::ProductId.eq(product_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|f| f.star)
        .collect();
    let vote_star = average_star(&stars);

    let mut active: ProductActive = product.into();
    active.vote_star = Set(vote_star);
    active.update(txn).await?;
    tracing::debug!(product_id = %product_id, votes = stars.len(), ?vote_star, "vote star refreshed");
    Ok(())
}

async fn order_contains_product(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    product_id: Uuid,
) -> AppResult<bool> {
    let model_ids: Vec<Uuid> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?
        .into_iter()
        .map(|item| item.model_id)
        .collect();
    if model_ids.is_empty() {
        return Ok(false);
    }

    let found = ProductModels::find()
        .filter(
            Condition::all()
                .add(ModelCol::Id.is_in(model_ids))
                .add(ModelCol::ProductId.eq(product_id)),
        )
        .one(txn)
        .await?;
    Ok(found.is_some())
}

fn feedback_from_entity(model: FeedbackModel, author: String) -> Feedback {
    Feedback {
        id: model.id,
        user: if model.is_anonymous {
            ANONYMOUS.to_string()
        } else {
            author
        },
        order_id: model.order_id,
        product_id: model.product_id,
        title: model.title,
        content: model.content,
        star: model.star,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn average_rounds_to_one_decimal() {
        assert_eq!(average_star(&[]), None);
        assert_eq!(average_star(&[4]), Some(4.0));
        assert_eq!(average_star(&[5, 4, 4]), Some(4.3));
        assert_eq!(average_star(&[5, 4]), Some(4.5));
        assert_eq!(average_star(&[1, 2, 2]), Some(1.7));
    }

    #[test]
    fn window_is_one_calendar_month() {
        let delivered = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        // Jan 31 + 1 month clamps to Feb 29 in a leap year.
        let deadline = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        assert!(within_one_month(delivered, delivered));
        assert!(within_one_month(delivered, deadline));
        assert!(!within_one_month(delivered, deadline + Duration::seconds(1)));
    }

    #[test]
    fn anonymous_feedback_hides_the_author() {
        let model = FeedbackModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            title: "Clear".into(),
            content: "No bubbles".into(),
            star: 5,
            is_anonymous: true,
            allow_edit: true,
            created_at: Utc::now().into(),
        };
        assert_eq!(feedback_from_entity(model, "Lan Tran".into()).user, ANONYMOUS);
    }
}
