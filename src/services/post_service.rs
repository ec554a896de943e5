use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;
use validator::Validate;

use crate::{
    codec::{compress, decompress},
    dto::posts::{PostList, PostRequest},
    entity::{
        Users,
        posts::{ActiveModel as PostActive, Column as PostCol, Entity as Posts, Model as PostModel},
        users::Column as UserCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, current_user, ensure_admin},
    models::Post,
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    state::AppState,
};

pub const POSTS_PAGE_SIZE: u64 = 10;

/// Newest first. A page <= 0 returns every post.
pub async fn list_posts(state: &AppState, query: PageQuery) -> AppResult<ApiResponse<PostList>> {
    let mut finder = Posts::find().order_by_desc(PostCol::CreatedAt);
    if let Some((offset, limit)) = query.window(POSTS_PAGE_SIZE) {
        finder = finder.offset(offset).limit(limit);
    }
    let posts = finder.all(&state.orm).await?;

    let author_ids: Vec<Uuid> = posts.iter().map(|p| p.user_id).collect();
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

    let items = posts
        .into_iter()
        .map(|p| {
            let author = names.get(&p.user_id).cloned().unwrap_or_default();
            post_from_entity(p, author)
        })
        .collect::<AppResult<Vec<Post>>>()?;

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Ok", PostList { items }, Some(meta)))
}

pub async fn get_post_by_id(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Post>> {
    let post = Posts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("post", id))?;
    let author = Users::find_by_id(post.user_id)
        .one(&state.orm)
        .await?
        .map(|u| u.display_name())
        .unwrap_or_default();

    Ok(ApiResponse::success(
        "OK",
        post_from_entity(post, author)?,
        Some(Meta::empty()),
    ))
}

pub async fn add_post(
    state: &AppState,
    user: &AuthUser,
    payload: PostRequest,
) -> AppResult<ApiResponse<Post>> {
    ensure_admin(user)?;
    payload.validate()?;
    let author = current_user(&state.orm, user).await?;

    let now = Utc::now();
    let post = PostActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(author.id),
        title: Set(payload.title),
        content: Set(compress(&payload.description)?),
        thumbnail: Set(thumbnail_to_storage(payload.thumbnail.as_deref())),
        created_at: Set(now.into()),
        latest_update: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    tracing::info!(post_id = %post.id, "post created");

    Ok(ApiResponse::success(
        "New post created",
        post_from_entity(post, author.display_name())?,
        Some(Meta::empty()),
    ))
}

pub async fn edit_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PostRequest,
) -> AppResult<ApiResponse<Post>> {
    ensure_admin(user)?;
    payload.validate()?;
    current_user(&state.orm, user).await?;

    let existing = Posts::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("post", id))?;
    let author_id = existing.user_id;

    let mut active: PostActive = existing.into();
    active.title = Set(payload.title);
    active.content = Set(compress(&payload.description)?);
    active.thumbnail = Set(thumbnail_to_storage(payload.thumbnail.as_deref()));
    active.latest_update = Set(Utc::now().into());
    let post = active.update(&state.orm).await?;

    let author = Users::find_by_id(author_id)
        .one(&state.orm)
        .await?
        .map(|u| u.display_name())
        .unwrap_or_default();

    Ok(ApiResponse::success(
        "Post updated",
        post_from_entity(post, author)?,
        Some(Meta::empty()),
    ))
}

pub async fn remove_post(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    current_user(&state.orm, user).await?;

    let result = Posts::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("post", id));
    }
    tracing::info!(post_id = %id, "post removed");

    Ok(ApiResponse::message(format!(
        "Remove post with id = {id} successfully"
    )))
}

/// Absent stays absent, an empty list becomes `""`, otherwise JSON array text.
pub fn thumbnail_to_storage(thumbnail: Option<&[String]>) -> Option<String> {
    match thumbnail {
        None => None,
        Some([]) => Some(String::new()),
        Some(list) => Some(serde_json::to_string(list).unwrap_or_default()),
    }
}

pub fn thumbnail_from_storage(stored: Option<&str>) -> Option<Vec<String>> {
    match stored {
        None => None,
        Some("") => Some(Vec::new()),
        Some(text) => Some(serde_json::from_str(text).unwrap_or_else(|_| vec![text.to_string()])),
    }
}

fn post_from_entity(model: PostModel, created_by: String) -> AppResult<Post> {
    Ok(Post {
        id: model.id,
        created_by,
        title: model.title,
        content: decompress(&model.content)?,
        thumbnail: thumbnail_from_storage(model.thumbnail.as_deref()),
        created_at: model.created_at.with_timezone(&Utc),
        latest_update: model.latest_update.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_storage_policy() {
        assert_eq!(thumbnail_to_storage(None), None);
        let empty: Vec<String> = Vec::new();
        assert_eq!(thumbnail_to_storage(Some(empty.as_slice())), Some(String::new()));

        let list = vec!["a.png".to_string(), "b.png".to_string()];
        let stored = thumbnail_to_storage(Some(list.as_slice()));
        assert_eq!(stored.as_deref(), Some(r#"["a.png","b.png"]"#));
        assert_eq!(thumbnail_from_storage(stored.as_deref()), Some(list));
    }

    #[test]
    fn stored_thumbnail_reads_back() {
        assert_eq!(thumbnail_from_storage(None), None);
        assert_eq!(thumbnail_from_storage(Some("")), Some(Vec::new()));
        // A bare path reads as a single thumbnail.
        assert_eq!(
            thumbnail_from_storage(Some("legacy.png")),
            Some(vec!["legacy.png".to_string()])
        );
    }

    #[test]
    fn corrupt_body_is_a_codec_error() {
        let model = PostModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "t".into(),
            content: "%%%".into(),
            thumbnail: None,
            created_at: Utc::now().into(),
            latest_update: Utc::now().into(),
        };
        assert!(matches!(
            post_from_entity(model, String::new()),
            Err(AppError::Codec(_))
        ));
    }
}
