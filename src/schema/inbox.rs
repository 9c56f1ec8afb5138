use chrono::{DateTime, Utc};
use forge::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[forge::forge_enum]
pub enum ChannelKind {
    Whatsapp,
    Telegram,
    Api,
}

#[forge::forge_enum]
pub enum InboxStatus {
    Disconnected,
    Connecting,
    QrCode,
    Connected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[forge::model]
pub struct Inbox {
    pub id: Uuid,
    pub name: String,
    pub channel_kind: ChannelKind,
    pub channel_config_id: Uuid,
    pub status: InboxStatus,
    pub qr_code: Option<String>,
    pub greeting_text: Option<String>,
    pub auto_assign: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
