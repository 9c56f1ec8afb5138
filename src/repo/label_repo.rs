use crate::error::RepoError;
use crate::schema::Label;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list(db: &PgPool) -> Result<Vec<Label>, RepoError> {
    sqlx::query_as::<_, Label>("SELECT id, title, color, created_at FROM labels ORDER BY title")
        .fetch_all(db)
        .await
        .map_err(RepoError::from)
}

pub async fn create(db: &PgPool, title: &str, color: &str) -> Result<Label, RepoError> {
    sqlx::query_as::<_, Label>(
        r#"
        INSERT INTO labels (id, title, color, created_at)
        VALUES (gen_random_uuid(), $1, $2, now())
        RETURNING id, title, color, created_at
        "#,
    )
    .bind(title)
    .bind(color)
    .fetch_one(db)
    .await
    .map_err(RepoError::from)
}

pub async fn list_for_conversation(db: &PgPool, conversation_id: Uuid) -> Result<Vec<Label>, RepoError> {
    sqlx::query_as::<_, Label>(
        r#"
        SELECT l.id, l.title, l.color, l.created_at
        FROM labels l
        JOIN conversation_labels cl ON cl.label_id = l.id
        WHERE cl.conversation_id = $1
        ORDER BY l.title
        "#,
    )
    .bind(conversation_id)
    .fetch_all(db)
    .await
    .map_err(RepoError::from)
}

/// Idempotent on the junction table (§4.6 "AddLabel/RemoveLabel").
pub async fn add_label(db: &PgPool, conversation_id: Uuid, label_id: Uuid) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO conversation_labels (conversation_id, label_id, created_at)
        VALUES ($1, $2, now())
        ON CONFLICT (conversation_id, label_id) DO NOTHING
        "#,
    )
    .bind(conversation_id)
    .bind(label_id)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn remove_label(db: &PgPool, conversation_id: Uuid, label_id: Uuid) -> Result<(), RepoError> {
    sqlx::query("DELETE FROM conversation_labels WHERE conversation_id = $1 AND label_id = $2")
        .bind(conversation_id)
        .bind(label_id)
        .execute(db)
        .await?;
    Ok(())
}
