use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::posts::PostList,
    error::AppResult,
    models::Post,
    response::ApiResponse,
    routes::params::PageQuery,
    services::post_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{id}", get(get_post))
}

#[utoipa::path(
    get,
    path = "/api/posts",
    params(
        ("page" = Option<i64>, Query, description = "Page of 10 posts; 0 or absent returns all")
    ),
    responses(
        (status = 200, description = "Posts, newest first", body = ApiResponse<PostList>)
    ),
    tag = "Posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<PostList>>> {
    let resp = post_service::list_posts(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post found", body = ApiResponse<Post>),
        (status = 404, description = "Post not found"),
    ),
    tag = "Posts"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Post>>> {
    let resp = post_service::get_post_by_id(&state, id).await?;
    Ok(Json(resp))
}
