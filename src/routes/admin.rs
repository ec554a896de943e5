use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderList, UpdateOrderStatusRequest},
        posts::PostRequest,
        users::{ChangeRoleRequest, EditUserRequest, UserList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, Post, UserProfile},
    response::ApiResponse,
    routes::params::PageQuery,
    services::{admin_service, feedback_service, post_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/users", get(list_users))
        .route("/users/role", put(change_user_role))
        .route("/users/{id}", get(get_user).put(edit_user))
        .route("/users/{id}/status", patch(toggle_user_status))
        .route("/feedbacks/{id}", delete(remove_feedback))
        .route("/posts", post(add_post))
        .route("/posts/{id}", put(edit_post).delete(remove_post))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    responses(
    (status = 200, description = "Get all orders (admin only)", body = ApiResponse<OrderList>),
    (status = 403, description = "Forbidden"),
    (status = 500, description = "Internal Server Error"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Order>),
        (status = 400, description = "Unknown label or backward transition"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("page" = Option<i64>, Query, description = "Page of 20 users, default 1"),
    ),
    responses(
        (status = 200, description = "Users ordered by id", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = user_service::list_users(&state, &user, query.page()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserProfile>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = user_service::get_user_by_id(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = EditUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserProfile>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn edit_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditUserRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = user_service::edit_user(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/status",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Activation flipped", body = ApiResponse<UserProfile>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_user_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = user_service::toggle_user_status(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/role",
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role replaced", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Unknown role"),
        (status = 404, description = "No account with that email"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn change_user_role(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangeRoleRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::change_user_role(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/feedbacks/{id}",
    params(("id" = Uuid, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Feedback not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn remove_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = feedback_service::remove_feedback(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/posts",
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post created", body = ApiResponse<Post>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn add_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PostRequest>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let resp = post_service::add_post(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<Post>),
        (status = 404, description = "Post not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn edit_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostRequest>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let resp = post_service::edit_post(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Post not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn remove_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = post_service::remove_post(&state, &user, id).await?;
    Ok(Json(resp))
}
