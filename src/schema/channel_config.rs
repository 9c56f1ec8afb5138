use chrono::{DateTime, Utc};
use forge::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider-specific session material for one paired WhatsApp-kind inbox.
/// Opaque to everything outside the channel session: the core only ever
/// reads `identity` to decide whether a `Connect` can bypass the QR flow.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[forge::model]
pub struct WhatsappChannelConfig {
    pub id: Uuid,
    pub phone_number: Option<String>,
    pub identity: Option<String>,
    pub provider_tag: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
