mod common;

use chrono::{Duration, Utc};
use glass_ecommerce_api::{
    dto::{
        feedback::{AddFeedbackRequest, EditFeedbackRequest},
        orders::UpdateOrderStatusRequest,
    },
    entity::{
        Feedbacks, Orders, Products,
        feedbacks::ActiveModel as FeedbackActive,
        orders::ActiveModel as OrderActive,
        user_roles::Role,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Order,
    services::{admin_service, feedback_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

fn feedback(order_id: Uuid, product_id: Uuid, star: i32) -> AddFeedbackRequest {
    AddFeedbackRequest {
        order_id,
        product_id,
        title: "Solid pane".into(),
        content: "Arrived without scratches".into(),
        star,
        is_anonymous: false,
    }
}

async fn delivered_order(
    state: &AppState,
    admin: &AuthUser,
    user: &AuthUser,
    model_id: Uuid,
) -> anyhow::Result<Order> {
    let order = common::place_order_for(state, user, model_id, 1).await?;
    admin_service::update_order_status(
        state,
        admin,
        order.id,
        UpdateOrderStatusRequest {
            status: "Delivered".into(),
        },
    )
    .await?;
    Ok(order)
}

async fn vote_star(state: &AppState, product_id: Uuid) -> anyhow::Result<Option<f64>> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product missing"))?;
    Ok(product.vote_star)
}

#[tokio::test]
async fn feedback_requires_a_delivered_order() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::create_user(&state, "buyer@glass.test", Role::Customer).await?;
    let fixture = common::create_model(&state, "Panel", 100, 10).await?;

    let order = common::place_order_for(&state, &user, fixture.model_id, 1).await?;
    let result =
        feedback_service::add_feedback(&state, &user, feedback(order.id, fixture.product_id, 5))
            .await;
    assert!(matches!(result, Err(AppError::InvalidRequest(_))));

    let result = feedback_service::add_feedback(
        &state,
        &user,
        feedback(Uuid::new_v4(), fixture.product_id, 5),
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn feedback_window_closes_one_month_after_delivery() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "admin@glass.test", Role::Admin).await?;
    let user = common::create_user(&state, "buyer@glass.test", Role::Customer).await?;
    let fixture = common::create_model(&state, "Panel", 100, 10).await?;

    let order = delivered_order(&state, &admin, &user, fixture.model_id).await?;
    let stored = Orders::find_by_id(order.id).one(&state.orm).await?.unwrap();
    let mut active: OrderActive = stored.into();
    active.delivered_date = Set(Some((Utc::now() - Duration::days(40)).into()));
    active.update(&state.orm).await?;

    let result =
        feedback_service::add_feedback(&state, &user, feedback(order.id, fixture.product_id, 4))
            .await;
    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    Ok(())
}

#[tokio::test]
async fn product_must_belong_to_the_order() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "admin@glass.test", Role::Admin).await?;
    let user = common::create_user(&state, "buyer@glass.test", Role::Customer).await?;
    let bought = common::create_model(&state, "Panel", 100, 10).await?;
    let elsewhere = common::create_model(&state, "Mirror", 100, 10).await?;

    let order = delivered_order(&state, &admin, &user, bought.model_id).await?;
    let result =
        feedback_service::add_feedback(&state, &user, feedback(order.id, elsewhere.product_id, 4))
            .await;
    assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    Ok(())
}

#[tokio::test]
async fn vote_star_tracks_every_mutation() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "admin@glass.test", Role::Admin).await?;
    let alice = common::create_user(&state, "alice@glass.test", Role::Customer).await?;
    let bob = common::create_user(&state, "bob@glass.test", Role::Customer).await?;
    let fixture = common::create_model(&state, "Panel", 100, 10).await?;

    let first = delivered_order(&state, &admin, &alice, fixture.model_id).await?;
    let second = delivered_order(&state, &admin, &bob, fixture.model_id).await?;

    let created =
        feedback_service::add_feedback(&state, &alice, feedback(first.id, fixture.product_id, 5))
            .await?
            .data
            .unwrap();
    assert_eq!(vote_star(&state, fixture.product_id).await?, Some(5.0));

    let duplicate =
        feedback_service::add_feedback(&state, &alice, feedback(first.id, fixture.product_id, 1))
            .await;
    assert!(matches!(duplicate, Err(AppError::InvalidRequest(_))));

    let mut anonymous = feedback(second.id, fixture.product_id, 4);
    anonymous.is_anonymous = true;
    let hidden = feedback_service::add_feedback(&state, &bob, anonymous)
        .await?
        .data
        .unwrap();
    assert_eq!(hidden.user, feedback_service::ANONYMOUS);
    assert_eq!(vote_star(&state, fixture.product_id).await?, Some(4.5));

    let edit = EditFeedbackRequest {
        title: "Changed my mind".into(),
        content: "Edge chipped after a week".into(),
        star: 2,
        is_anonymous: false,
    };
    feedback_service::edit_feedback(&state, &alice, created.id, edit).await?;
    assert_eq!(vote_star(&state, fixture.product_id).await?, Some(3.0));

    let listed = feedback_service::list_by_product(&state, fixture.product_id)
        .await?
        .data
        .unwrap();
    assert_eq!(listed.items.len(), 2);
    assert!(listed.items.iter().any(|f| f.user == feedback_service::ANONYMOUS));
    assert!(listed.items.iter().any(|f| f.user == "Test alice"));

    feedback_service::remove_feedback(&state, &admin, hidden.id).await?;
    assert_eq!(vote_star(&state, fixture.product_id).await?, Some(2.0));
    feedback_service::remove_feedback(&state, &admin, created.id).await?;
    assert_eq!(vote_star(&state, fixture.product_id).await?, None);

    assert!(Feedbacks::find().all(&state.orm).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn feedback_can_be_edited_once_within_a_month() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "admin@glass.test", Role::Admin).await?;
    let user = common::create_user(&state, "buyer@glass.test", Role::Customer).await?;
    let other = common::create_user(&state, "other@glass.test", Role::Customer).await?;
    let fixture = common::create_model(&state, "Panel", 100, 10).await?;

    let order = delivered_order(&state, &admin, &user, fixture.model_id).await?;
    let created =
        feedback_service::add_feedback(&state, &user, feedback(order.id, fixture.product_id, 3))
            .await?
            .data
            .unwrap();

    let edit = || EditFeedbackRequest {
        title: "Update".into(),
        content: "Still fine".into(),
        star: 4,
        is_anonymous: false,
    };

    assert!(matches!(
        feedback_service::edit_feedback(&state, &other, created.id, edit()).await,
        Err(AppError::NotFound(_))
    ));
    feedback_service::edit_feedback(&state, &user, created.id, edit()).await?;
    assert!(matches!(
        feedback_service::edit_feedback(&state, &user, created.id, edit()).await,
        Err(AppError::InvalidRequest(_))
    ));

    // Reopen editing but age the row past the window.
    let stored = Feedbacks::find_by_id(created.id).one(&state.orm).await?.unwrap();
    let mut active: FeedbackActive = stored.into();
    active.allow_edit = Set(true);
    active.created_at = Set((Utc::now() - Duration::days(40)).into());
    active.update(&state.orm).await?;
    assert!(matches!(
        feedback_service::edit_feedback(&state, &user, created.id, edit()).await,
        Err(AppError::InvalidRequest(_))
    ));

    assert!(matches!(
        feedback_service::remove_feedback(&state, &user, created.id).await,
        Err(AppError::Forbidden)
    ));
    Ok(())
}

#[tokio::test]
async fn unique_index_rejection_reads_as_duplicate_feedback() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "admin@glass.test", Role::Admin).await?;
    let user = common::create_user(&state, "buyer@glass.test", Role::Customer).await?;
    let fixture = common::create_model(&state, "Panel", 100, 10).await?;

    let order = delivered_order(&state, &admin, &user, fixture.model_id).await?;
    feedback_service::add_feedback(&state, &user, feedback(order.id, fixture.product_id, 5))
        .await?;

    // A second writer that slipped past the lookup still hits the index.
    let second = FeedbackActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        order_id: Set(order.id),
        product_id: Set(fixture.product_id),
        title: Set("Again".into()),
        content: Set("Same order, same product".into()),
        star: Set(1),
        is_anonymous: Set(false),
        allow_edit: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await;
    let err = match second {
        Ok(_) => anyhow::bail!("duplicate feedback row was stored"),
        Err(err) => err,
    };

    let mapped = AppError::unique_violation(err, feedback_service::DUPLICATE_FEEDBACK);
    assert!(matches!(
        mapped,
        AppError::InvalidRequest(ref msg) if msg == feedback_service::DUPLICATE_FEEDBACK
    ));
    Ok(())
}
