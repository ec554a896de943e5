mod common;

use chrono::{Duration, TimeZone, Utc};
use glass_ecommerce_api::{
    codec::compress,
    dto::posts::PostRequest,
    entity::{Posts, posts::ActiveModel as PostActive, user_roles::Role},
    error::AppError,
    routes::params::PageQuery,
    services::post_service,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

#[tokio::test]
async fn pages_are_windows_of_ten_newest_first() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "admin@glass.test", Role::Admin).await?;

    let base = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    for n in 1..=25 {
        let at = base + Duration::hours(n);
        PostActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(admin.user_id),
            title: Set(format!("Post {n}")),
            content: Set(compress(&format!("Body {n}"))?),
            thumbnail: Set(None),
            created_at: Set(at.into()),
            latest_update: Set(at.into()),
        }
        .insert(&state.orm)
        .await?;
    }

    let all = post_service::list_posts(&state, PageQuery::new(0))
        .await?
        .data
        .unwrap();
    assert_eq!(all.items.len(), 25);
    assert_eq!(all.items[0].title, "Post 25");

    let second = post_service::list_posts(&state, PageQuery::new(2))
        .await?
        .data
        .unwrap();
    let titles: Vec<String> = second.items.iter().map(|p| p.title.clone()).collect();
    let expected: Vec<String> = (6..=15).rev().map(|n| format!("Post {n}")).collect();
    assert_eq!(titles, expected);
    assert_eq!(second.items[0].content, "Body 15");

    let past_end = post_service::list_posts(&state, PageQuery::new(4))
        .await?
        .data
        .unwrap();
    assert!(past_end.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn admin_manages_posts_and_body_is_stored_compressed() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "admin@glass.test", Role::Admin).await?;
    let reader = common::create_user(&state, "reader@glass.test", Role::Customer).await?;

    let body = "Kính cường lực bền gấp 5 lần kính thường.";
    let request = || PostRequest {
        title: "Why tempered glass".into(),
        description: body.into(),
        thumbnail: Some(Vec::new()),
    };

    assert!(matches!(
        post_service::add_post(&state, &reader, request()).await,
        Err(AppError::Forbidden)
    ));

    let created = post_service::add_post(&state, &admin, request())
        .await?
        .data
        .unwrap();
    assert_eq!(created.content, body);
    assert_eq!(created.thumbnail, Some(Vec::new()));
    assert_eq!(created.created_by, "Test admin");

    let stored = Posts::find_by_id(created.id).one(&state.orm).await?.unwrap();
    assert_ne!(stored.content, body);
    assert_eq!(stored.thumbnail.as_deref(), Some(""));

    let edited = post_service::edit_post(
        &state,
        &admin,
        created.id,
        PostRequest {
            title: "Why tempered glass (updated)".into(),
            description: "Shorter body".into(),
            thumbnail: Some(vec!["/img/a.png".into(), "/img/b.png".into()]),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(edited.content, "Shorter body");
    assert_eq!(edited.thumbnail.map(|t| t.len()), Some(2));
    assert!(edited.latest_update >= created.latest_update);

    let fetched = post_service::get_post_by_id(&state, created.id)
        .await?
        .data
        .unwrap();
    assert_eq!(fetched.title, "Why tempered glass (updated)");

    post_service::remove_post(&state, &admin, created.id).await?;
    assert!(matches!(
        post_service::get_post_by_id(&state, created.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        post_service::remove_post(&state, &admin, created.id).await,
        Err(AppError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn far_pages_are_empty() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::create_user(&state, "admin@glass.test", Role::Admin).await?;
    post_service::add_post(
        &state,
        &admin,
        PostRequest {
            title: "Only".into(),
            description: "Body".into(),
            thumbnail: None,
        },
    )
    .await?;

    for page in [1_000_000_000_000_000_000, i64::MAX] {
        let list = post_service::list_posts(&state, PageQuery::new(page))
            .await?
            .data
            .unwrap();
        assert!(list.items.is_empty());
    }
    Ok(())
}
