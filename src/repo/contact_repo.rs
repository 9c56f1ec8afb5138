use crate::error::RepoError;
use crate::schema::Contact;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn find_by_phone(db: &PgPool, phone: &str) -> Result<Option<Contact>, RepoError> {
    sqlx::query_as::<_, Contact>(
        r#"SELECT id, name, email, phone, avatar_url, custom_attributes, created_at, updated_at FROM contacts WHERE phone = $1"#,
    )
    .bind(phone)
    .fetch_optional(db)
    .await
    .map_err(RepoError::from)
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Contact, RepoError> {
    sqlx::query_as::<_, Contact>(
        r#"SELECT id, name, email, phone, avatar_url, custom_attributes, created_at, updated_at FROM contacts WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or(RepoError::NotFound)
}

pub async fn create(db: &PgPool, name: &str, phone: Option<&str>) -> Result<Contact, RepoError> {
    sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (id, name, email, phone, avatar_url, custom_attributes, created_at, updated_at)
        VALUES (gen_random_uuid(), $1, NULL, $2, NULL, '{}'::jsonb, now(), now())
        RETURNING id, name, email, phone, avatar_url, custom_attributes, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(phone)
    .fetch_one(db)
    .await
    .map_err(RepoError::from)
}

/// Updates the display name when the provider reports a different one on a
/// later inbound event (§4.3 step 2, "if found and display name changed, update").
pub async fn update_name(db: &PgPool, id: Uuid, name: &str) -> Result<(), RepoError> {
    sqlx::query("UPDATE contacts SET name = $1, updated_at = now() WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
