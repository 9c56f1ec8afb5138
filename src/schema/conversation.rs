use chrono::{DateTime, Utc};
use forge::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[forge::forge_enum]
pub enum ConversationStatus {
    Open,
    Pending,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[forge::model]
pub struct Conversation {
    pub id: Uuid,
    pub inbox_id: Uuid,
    pub contact_id: Uuid,
    pub contact_inbox_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub status: ConversationStatus,
    pub priority: i32,
    pub unread_count: i32,
    pub favorite: bool,
    pub archived: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Composed read model for `GET /conversations/:id`: the conversation plus
/// just enough of its neighbors that the UI doesn't need three round trips.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationWithDetails {
    pub conversation: Conversation,
    pub contact: super::Contact,
    pub inbox: super::Inbox,
    pub last_message: Option<super::Message>,
}
