use crate::error::RepoError;
use crate::schema::{ChannelKind, Inbox, InboxStatus};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create(
    db: &PgPool,
    name: &str,
    channel_kind: ChannelKind,
    channel_config_id: Uuid,
    greeting_text: Option<&str>,
    auto_assign: bool,
) -> Result<Inbox, RepoError> {
    sqlx::query_as::<_, Inbox>(
        r#"
        INSERT INTO inboxes (id, name, channel_kind, channel_config_id, status, qr_code, greeting_text, auto_assign, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, 'disconnected', NULL, $4, $5, now(), now())
        RETURNING id, name, channel_kind, channel_config_id, status, qr_code, greeting_text, auto_assign, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(channel_kind)
    .bind(channel_config_id)
    .bind(greeting_text)
    .bind(auto_assign)
    .fetch_one(db)
    .await
    .map_err(RepoError::from)
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Inbox, RepoError> {
    sqlx::query_as::<_, Inbox>(
        r#"SELECT id, name, channel_kind, channel_config_id, status, qr_code, greeting_text, auto_assign, created_at, updated_at FROM inboxes WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or(RepoError::NotFound)
}

pub async fn list(db: &PgPool) -> Result<Vec<Inbox>, RepoError> {
    sqlx::query_as::<_, Inbox>(
        r#"SELECT id, name, channel_kind, channel_config_id, status, qr_code, greeting_text, auto_assign, created_at, updated_at FROM inboxes ORDER BY created_at"#,
    )
    .fetch_all(db)
    .await
    .map_err(RepoError::from)
}

/// Atomic per §4.5: a single UPDATE, no read-modify-write.
pub async fn update_status(db: &PgPool, id: Uuid, status: InboxStatus) -> Result<(), RepoError> {
    let result = sqlx::query("UPDATE inboxes SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

/// Sets status `qr_code` and stores the data URL in one statement (§4.5).
pub async fn set_qr_code(db: &PgPool, id: Uuid, data_url: &str) -> Result<(), RepoError> {
    let result = sqlx::query(
        "UPDATE inboxes SET status = 'qr_code', qr_code = $1, updated_at = now() WHERE id = $2",
    )
    .bind(data_url)
    .bind(id)
    .execute(db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

/// Transitions to `status` and nulls the cached QR image in one statement (§4.5).
pub async fn clear_qr_code(db: &PgPool, id: Uuid, status: InboxStatus) -> Result<(), RepoError> {
    let result = sqlx::query(
        "UPDATE inboxes SET status = $1, qr_code = NULL, updated_at = now() WHERE id = $2",
    )
    .bind(status)
    .bind(id)
    .execute(db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), RepoError> {
    let result = sqlx::query("DELETE FROM inboxes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}
