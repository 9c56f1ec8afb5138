use crate::error::RepoError;
use crate::schema::{Conversation, ConversationStatus};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

/// Filter contract for `List` (§4.5): every field is optional, `limit`
/// defaults to 50, ordering defaults to `last_message_at DESC NULLS LAST`.
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    pub inbox_id: Option<Uuid>,
    pub status: Option<ConversationStatus>,
    pub assignee_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub favorite: Option<bool>,
    pub archived: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const SELECT_COLUMNS: &str = "id, inbox_id, contact_id, contact_inbox_id, assignee_id, status, priority, unread_count, favorite, archived, last_message_at, created_at, updated_at";

pub async fn list(db: &PgPool, filter: ConversationFilter) -> Result<Vec<Conversation>, RepoError> {
    let mut qb = QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM conversations WHERE 1 = 1"));

    if let Some(inbox_id) = filter.inbox_id {
        qb.push(" AND inbox_id = ").push_bind(inbox_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(assignee_id) = filter.assignee_id {
        qb.push(" AND assignee_id = ").push_bind(assignee_id);
    }
    if let Some(contact_id) = filter.contact_id {
        qb.push(" AND contact_id = ").push_bind(contact_id);
    }
    if let Some(favorite) = filter.favorite {
        qb.push(" AND favorite = ").push_bind(favorite);
    }
    if let Some(archived) = filter.archived {
        qb.push(" AND archived = ").push_bind(archived);
    }

    qb.push(" ORDER BY last_message_at DESC NULLS LAST");
    qb.push(" LIMIT ").push_bind(filter.limit.unwrap_or(50).clamp(1, 200));
    qb.push(" OFFSET ").push_bind(filter.offset.unwrap_or(0).max(0));

    qb.build_query_as::<Conversation>()
        .fetch_all(db)
        .await
        .map_err(RepoError::from)
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Conversation, RepoError> {
    sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {SELECT_COLUMNS} FROM conversations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or(RepoError::NotFound)
}

/// Finds the most recent conversation for a contact-inbox regardless of
/// status (§3 invariant: "a ContactInbox has at most one non-resolved
/// Conversation" — the pipeline reopens this one if it was resolved).
pub async fn find_latest_by_contact_inbox(
    db: &PgPool,
    contact_inbox_id: Uuid,
) -> Result<Option<Conversation>, RepoError> {
    sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {SELECT_COLUMNS} FROM conversations WHERE contact_inbox_id = $1 ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(contact_inbox_id)
    .fetch_optional(db)
    .await
    .map_err(RepoError::from)
}

pub async fn create(
    db: &PgPool,
    inbox_id: Uuid,
    contact_id: Uuid,
    contact_inbox_id: Uuid,
) -> Result<Conversation, RepoError> {
    sqlx::query_as::<_, Conversation>(&format!(
        r#"
        INSERT INTO conversations (id, inbox_id, contact_id, contact_inbox_id, assignee_id, status, priority, unread_count, favorite, archived, last_message_at, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, $2, $3, NULL, 'open', 0, 0, false, false, NULL, now(), now())
        RETURNING {SELECT_COLUMNS}
        "#
    ))
    .bind(inbox_id)
    .bind(contact_id)
    .bind(contact_inbox_id)
    .fetch_one(db)
    .await
    .map_err(RepoError::from)
}

pub async fn reopen(db: &PgPool, id: Uuid) -> Result<(), RepoError> {
    sqlx::query("UPDATE conversations SET status = 'open', updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Bumps `last_message_at` and, for contact-sent messages, increments unread
/// (§4.3 step 8, §3 invariant "unread increments only on inbound contact messages").
pub async fn record_inbound_message(
    db: &PgPool,
    id: Uuid,
    timestamp: chrono::DateTime<chrono::Utc>,
    increment_unread: bool,
) -> Result<(), RepoError> {
    if increment_unread {
        sqlx::query(
            "UPDATE conversations SET last_message_at = $1, unread_count = unread_count + 1, updated_at = now() WHERE id = $2",
        )
        .bind(timestamp)
        .bind(id)
        .execute(db)
        .await?;
    } else {
        sqlx::query("UPDATE conversations SET last_message_at = $1, updated_at = now() WHERE id = $2")
            .bind(timestamp)
            .bind(id)
            .execute(db)
            .await?;
    }
    Ok(())
}

pub async fn record_outbound_message(
    db: &PgPool,
    id: Uuid,
    timestamp: chrono::DateTime<chrono::Utc>,
) -> Result<(), RepoError> {
    sqlx::query("UPDATE conversations SET last_message_at = $1, updated_at = now() WHERE id = $2")
        .bind(timestamp)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_status(db: &PgPool, id: Uuid, status: ConversationStatus) -> Result<(), RepoError> {
    let result = sqlx::query("UPDATE conversations SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

pub async fn set_assignee(db: &PgPool, id: Uuid, assignee_id: Option<Uuid>) -> Result<(), RepoError> {
    let result = sqlx::query("UPDATE conversations SET assignee_id = $1, updated_at = now() WHERE id = $2")
        .bind(assignee_id)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

pub async fn mark_as_read(db: &PgPool, id: Uuid) -> Result<(), RepoError> {
    let result = sqlx::query("UPDATE conversations SET unread_count = 0, updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

pub async fn set_favorite(db: &PgPool, id: Uuid, favorite: bool) -> Result<(), RepoError> {
    let result = sqlx::query("UPDATE conversations SET favorite = $1, updated_at = now() WHERE id = $2")
        .bind(favorite)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

pub async fn set_archived(db: &PgPool, id: Uuid, archived: bool) -> Result<(), RepoError> {
    let result = sqlx::query("UPDATE conversations SET archived = $1, updated_at = now() WHERE id = $2")
        .bind(archived)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

pub async fn set_priority(db: &PgPool, id: Uuid, priority: i32) -> Result<(), RepoError> {
    let result = sqlx::query("UPDATE conversations SET priority = $1, updated_at = now() WHERE id = $2")
        .bind(priority)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}
