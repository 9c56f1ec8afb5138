use crate::error::RepoError;
use crate::schema::{Attachment, AttachmentKind};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create(
    db: &PgPool,
    message_id: Uuid,
    kind: AttachmentKind,
    url: &str,
    filename: Option<&str>,
    size_bytes: Option<i64>,
    mime_type: &str,
) -> Result<Attachment, RepoError> {
    sqlx::query_as::<_, Attachment>(
        r#"
        INSERT INTO attachments (id, message_id, kind, url, filename, size_bytes, mime_type, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, now())
        RETURNING id, message_id, kind, url, filename, size_bytes, mime_type, created_at
        "#,
    )
    .bind(message_id)
    .bind(kind)
    .bind(url)
    .bind(filename)
    .bind(size_bytes)
    .bind(mime_type)
    .fetch_one(db)
    .await
    .map_err(RepoError::from)
}

pub async fn list_for_message(db: &PgPool, message_id: Uuid) -> Result<Vec<Attachment>, RepoError> {
    sqlx::query_as::<_, Attachment>(
        r#"SELECT id, message_id, kind, url, filename, size_bytes, mime_type, created_at FROM attachments WHERE message_id = $1"#,
    )
    .bind(message_id)
    .fetch_all(db)
    .await
    .map_err(RepoError::from)
}
