use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use uuid::Uuid;

use crate::{entity::notifications::ActiveModel as NotificationActive, error::AppResult};

pub async fn send_notification<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    title: &str,
    body: &str,
) -> AppResult<()> {
    NotificationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        title: Set(title.to_string()),
        body: Set(body.to_string()),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;

    Ok(())
}
