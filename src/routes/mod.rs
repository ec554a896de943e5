use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod cart;
pub mod doc;
pub mod feedbacks;
pub mod health;
pub mod orders;
pub mod params;
pub mod posts;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/me", users::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/posts", posts::router())
        .nest("/admin", admin::router())
        .merge(feedbacks::router())
}
