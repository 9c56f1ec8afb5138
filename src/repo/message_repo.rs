use crate::error::RepoError;
use crate::schema::{ContentKind, Message, MessageStatus, SenderKind};
use sqlx::PgPool;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "id, conversation_id, inbox_id, sender_kind, sender_id, content, content_kind, source_id, status, private, created_at";

pub async fn find_by_source(
    db: &PgPool,
    inbox_id: Uuid,
    source_id: &str,
) -> Result<Option<Message>, RepoError> {
    sqlx::query_as::<_, Message>(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE inbox_id = $1 AND source_id = $2"
    ))
    .bind(inbox_id)
    .bind(source_id)
    .fetch_optional(db)
    .await
    .map_err(RepoError::from)
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Message, RepoError> {
    sqlx::query_as::<_, Message>(&format!("SELECT {SELECT_COLUMNS} FROM messages WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(RepoError::NotFound)
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    db: &PgPool,
    conversation_id: Uuid,
    inbox_id: Uuid,
    sender_kind: SenderKind,
    sender_id: Option<Uuid>,
    content: Option<&str>,
    content_kind: ContentKind,
    source_id: Option<&str>,
    status: MessageStatus,
) -> Result<Message, RepoError> {
    sqlx::query_as::<_, Message>(&format!(
        r#"
        INSERT INTO messages (id, conversation_id, inbox_id, sender_kind, sender_id, content, content_kind, source_id, status, private, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, false, now())
        RETURNING {SELECT_COLUMNS}
        "#
    ))
    .bind(conversation_id)
    .bind(inbox_id)
    .bind(sender_kind)
    .bind(sender_id)
    .bind(content)
    .bind(content_kind)
    .bind(source_id)
    .bind(status)
    .fetch_one(db)
    .await
    .map_err(RepoError::from)
}

pub async fn list_by_conversation(
    db: &PgPool,
    conversation_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>, RepoError> {
    sqlx::query_as::<_, Message>(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE conversation_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(conversation_id)
    .bind(limit.clamp(1, 200))
    .bind(offset.max(0))
    .fetch_all(db)
    .await
    .map_err(RepoError::from)
}

pub async fn last_for_conversation(db: &PgPool, conversation_id: Uuid) -> Result<Option<Message>, RepoError> {
    sqlx::query_as::<_, Message>(&format!(
        "SELECT {SELECT_COLUMNS} FROM messages WHERE conversation_id = $1 ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(conversation_id)
    .fetch_optional(db)
    .await
    .map_err(RepoError::from)
}

/// Applies the monotonic status rule (§4.3 "Receipt/status algorithm", §3
/// invariant). Loads then conditionally writes rather than a single
/// `CASE`-guarded UPDATE, since the ordering rule is richer than SQL's
/// native comparison on the enum.
pub async fn update_status_by_source(
    db: &PgPool,
    inbox_id: Uuid,
    source_id: &str,
    new_status: MessageStatus,
) -> Result<(), RepoError> {
    let Some(current) = find_by_source(db, inbox_id, source_id).await? else {
        return Err(RepoError::NotFound);
    };

    if !current.status.can_advance_to(&new_status) {
        return Ok(());
    }

    sqlx::query("UPDATE messages SET status = $1 WHERE id = $2")
        .bind(new_status)
        .bind(current.id)
        .execute(db)
        .await?;
    Ok(())
}
