use crate::error::RepoError;
use crate::schema::ContactInbox;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn find_by_source(
    db: &PgPool,
    inbox_id: Uuid,
    source_id: &str,
) -> Result<Option<ContactInbox>, RepoError> {
    sqlx::query_as::<_, ContactInbox>(
        r#"SELECT id, contact_id, inbox_id, source_id, created_at FROM contact_inboxes WHERE inbox_id = $1 AND source_id = $2"#,
    )
    .bind(inbox_id)
    .bind(source_id)
    .fetch_optional(db)
    .await
    .map_err(RepoError::from)
}

/// Atomic under the unique index on (inbox_id, source_id) (§4.5). A race
/// between two inbound events for a brand-new contact collapses to a single
/// row: the loser's insert is absorbed by `ON CONFLICT DO NOTHING` and falls
/// back to the lookup the winner just created.
pub async fn find_or_create_by_source(
    db: &PgPool,
    inbox_id: Uuid,
    source_id: &str,
    contact_id: Uuid,
) -> Result<ContactInbox, RepoError> {
    if let Some(existing) = find_by_source(db, inbox_id, source_id).await? {
        return Ok(existing);
    }

    let inserted = sqlx::query_as::<_, ContactInbox>(
        r#"
        INSERT INTO contact_inboxes (id, contact_id, inbox_id, source_id, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, now())
        ON CONFLICT (inbox_id, source_id) DO NOTHING
        RETURNING id, contact_id, inbox_id, source_id, created_at
        "#,
    )
    .bind(contact_id)
    .bind(inbox_id)
    .bind(source_id)
    .fetch_optional(db)
    .await?;

    match inserted {
        Some(row) => Ok(row),
        None => find_by_source(db, inbox_id, source_id)
            .await?
            .ok_or(RepoError::NotFound),
    }
}
