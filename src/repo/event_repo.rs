use sqlx::PgPool;
use uuid::Uuid;

/// Appends one audit row (§3 `AuditEvent`, §4.3 step 9). Never part of the
/// caller's correctness path: failures here are logged and swallowed by
/// [`crate::pipeline`].
pub async fn record(
    db: &PgPool,
    trace_id: Option<Uuid>,
    source: &str,
    action: &str,
    payload: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO events (id, trace_id, source, action, payload, created_at) VALUES (gen_random_uuid(), $1, $2, $3, $4, now())"#,
    )
    .bind(trace_id)
    .bind(source)
    .bind(action)
    .bind(payload)
    .execute(db)
    .await?;
    Ok(())
}
