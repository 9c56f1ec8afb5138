use chrono::{DateTime, Utc};
use forge::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[forge::forge_enum]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Document,
    Sticker,
    Location,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[forge::model]
pub struct Attachment {
    pub id: Uuid,
    pub message_id: Uuid,
    pub kind: AttachmentKind,
    pub url: String,
    pub filename: Option<String>,
    pub size_bytes: Option<i64>,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}
