use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::feedback::{AddFeedbackRequest, EditFeedbackRequest, FeedbackList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Feedback,
    response::ApiResponse,
    services::feedback_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feedbacks", post(add_feedback))
        .route("/feedbacks/{id}", put(edit_feedback))
        .route("/products/{id}/feedbacks", get(list_by_product))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/feedbacks",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Feedback of a product, newest first", body = ApiResponse<FeedbackList>)
    ),
    tag = "Feedbacks"
)]
pub async fn list_by_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FeedbackList>>> {
    let resp = feedback_service::list_by_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/feedbacks",
    request_body = AddFeedbackRequest,
    responses(
        (status = 200, description = "Feedback created", body = ApiResponse<Feedback>),
        (status = 400, description = "Order not delivered, window closed or product not in order"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Feedbacks"
)]
pub async fn add_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddFeedbackRequest>,
) -> AppResult<Json<ApiResponse<Feedback>>> {
    let resp = feedback_service::add_feedback(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/feedbacks/{id}",
    params(("id" = Uuid, Path, description = "Feedback ID")),
    request_body = EditFeedbackRequest,
    responses(
        (status = 200, description = "Feedback updated", body = ApiResponse<Feedback>),
        (status = 400, description = "Already edited or older than one month"),
        (status = 404, description = "Feedback not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Feedbacks"
)]
pub async fn edit_feedback(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditFeedbackRequest>,
) -> AppResult<Json<ApiResponse<Feedback>>> {
    let resp = feedback_service::edit_feedback(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
