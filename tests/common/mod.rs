#![allow(dead_code)]

use std::sync::OnceLock;

use chrono::Utc;
use glass_ecommerce_api::{
    db::run_migrations,
    dto::{cart::AddToCartRequest, orders::PlaceOrderRequest},
    entity::{
        model_attachments::ActiveModel as AttachmentActive,
        product_models::ActiveModel as ModelActive,
        products::ActiveModel as ProductActive,
        user_roles::{ActiveModel as RoleActive, Role},
        users::ActiveModel as UserActive,
    },
    middleware::auth::AuthUser,
    models::Order,
    services::{cart_service, order_service, user_service::hash_password},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use uuid::Uuid;

pub const PASSWORD: &str = "secret123";

static PASSWORD_HASH: OnceLock<String> = OnceLock::new();

/// Fresh in-memory database with the full schema. A single connection keeps
/// every query on the same in-memory database.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let orm = Database::connect(options).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, "test-secret"))
}

pub async fn create_user(state: &AppState, email: &str, role: Role) -> anyhow::Result<AuthUser> {
    // Hashing is slow in debug builds, so every fixture user shares one hash.
    let password_hash = match PASSWORD_HASH.get() {
        Some(hash) => hash.clone(),
        None => {
            let hash = hash_password(PASSWORD).map_err(|e| anyhow::anyhow!(e.to_string()))?;
            PASSWORD_HASH.get_or_init(|| hash).clone()
        }
    };
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        first_name: Set("Test".into()),
        last_name: Set(email.split('@').next().unwrap_or_default().to_string()),
        phone_number: Set(None),
        gender: Set(None),
        dob: Set(None),
        avatar: Set(None),
        address: Set(None),
        is_activated: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    RoleActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        role: Set(role),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

pub struct Fixture {
    pub product_id: Uuid,
    pub model_id: Uuid,
}

/// One product with a single model carrying one image.
pub async fn create_model(
    state: &AppState,
    name: &str,
    price: i64,
    available: i32,
) -> anyhow::Result<Fixture> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(None),
        vote_star: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    let model = ModelActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        name: Set(format!("{name} standard")),
        unit: Set("m2".into()),
        color: Set(Some("clear".into())),
        specification: Set(Some("8mm".into())),
        price: Set(price),
        available: Set(available),
        description: Set(None),
    }
    .insert(&state.orm)
    .await?;

    AttachmentActive {
        id: Set(Uuid::new_v4()),
        model_id: Set(model.id),
        path: Set(format!("/images/{}.jpg", model.id)),
        kind: Set("image".into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(Fixture {
        product_id: product.id,
        model_id: model.id,
    })
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    model_id: Uuid,
    quantity: i32,
) -> anyhow::Result<()> {
    cart_service::add_to_cart(state, user, AddToCartRequest { model_id, quantity }).await?;
    Ok(())
}

pub fn order_request(payment_method: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        delivery_address: "12 Hang Bac, Hanoi".into(),
        payment_method: payment_method.into(),
        note: None,
    }
}

/// Cart one model and place a pay-on-delivery order for it.
pub async fn place_order_for(
    state: &AppState,
    user: &AuthUser,
    model_id: Uuid,
    quantity: i32,
) -> anyhow::Result<Order> {
    add_to_cart(state, user, model_id, quantity).await?;
    let resp = order_service::place_order(state, user, order_request("PAY_ON_DELIVERY")).await?;
    resp.data
        .ok_or_else(|| anyhow::anyhow!("order response carried no data"))
}
