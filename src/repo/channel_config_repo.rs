use crate::error::RepoError;
use crate::schema::WhatsappChannelConfig;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_whatsapp(db: &PgPool) -> Result<WhatsappChannelConfig, RepoError> {
    sqlx::query_as::<_, WhatsappChannelConfig>(
        r#"
        INSERT INTO whatsapp_channel_configs (id, phone_number, identity, provider_tag, created_at, updated_at)
        VALUES (gen_random_uuid(), NULL, NULL, 'whatsapp', now(), now())
        RETURNING id, phone_number, identity, provider_tag, created_at, updated_at
        "#,
    )
    .fetch_one(db)
    .await
    .map_err(RepoError::from)
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<WhatsappChannelConfig, RepoError> {
    sqlx::query_as::<_, WhatsappChannelConfig>(
        r#"SELECT id, phone_number, identity, provider_tag, created_at, updated_at FROM whatsapp_channel_configs WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or(RepoError::NotFound)
}

/// Fills in phone and identity on pair-success (§4.3 "QR/connect/disconnect events").
pub async fn set_paired(
    db: &PgPool,
    id: Uuid,
    phone_number: &str,
    identity: &str,
) -> Result<(), RepoError> {
    let result = sqlx::query(
        "UPDATE whatsapp_channel_configs SET phone_number = $1, identity = $2, updated_at = now() WHERE id = $3",
    )
    .bind(phone_number)
    .bind(identity)
    .bind(id)
    .execute(db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}
