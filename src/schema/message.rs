use chrono::{DateTime, Utc};
use forge::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[forge::forge_enum]
pub enum SenderKind {
    Contact,
    User,
    System,
    Bot,
}

#[forge::forge_enum]
pub enum ContentKind {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Sticker,
    Location,
}

#[forge::forge_enum]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    /// Ordinal used for the monotonic-advance check; `Failed` is a terminal
    /// side branch rather than part of the pending<sent<delivered<read chain,
    /// so it is handled separately in [`MessageStatus::can_advance_to`].
    fn rank(&self) -> u8 {
        match self {
            MessageStatus::Pending => 0,
            MessageStatus::Sent => 1,
            MessageStatus::Delivered => 2,
            MessageStatus::Read => 3,
            MessageStatus::Failed => 0,
        }
    }

    /// Whether moving from `self` (the current, persisted status) to `next`
    /// is a legal transition per the monotonic-status invariant in §3/§4.3.
    /// `Failed` is terminal: once reached, no further transition applies.
    pub fn can_advance_to(&self, next: &MessageStatus) -> bool {
        if matches!(self, MessageStatus::Failed) {
            return false;
        }
        match next {
            MessageStatus::Failed => self.rank() < MessageStatus::Read.rank(),
            MessageStatus::Read => self.rank() <= MessageStatus::Delivered.rank(),
            _ => self.rank() <= next.rank(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[forge::model]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub inbox_id: Uuid,
    pub sender_kind: SenderKind,
    pub sender_id: Option<Uuid>,
    pub content: Option<String>,
    pub content_kind: ContentKind,
    pub source_id: Option<String>,
    pub status: MessageStatus,
    pub private: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_advances_forward_only() {
        assert!(MessageStatus::Pending.can_advance_to(&MessageStatus::Sent));
        assert!(MessageStatus::Sent.can_advance_to(&MessageStatus::Delivered));
        assert!(MessageStatus::Delivered.can_advance_to(&MessageStatus::Read));
        assert!(!MessageStatus::Delivered.can_advance_to(&MessageStatus::Sent));
        assert!(!MessageStatus::Read.can_advance_to(&MessageStatus::Delivered));
    }

    #[test]
    fn read_overwrites_any_non_read_state() {
        assert!(MessageStatus::Pending.can_advance_to(&MessageStatus::Read));
        assert!(MessageStatus::Sent.can_advance_to(&MessageStatus::Read));
        assert!(MessageStatus::Delivered.can_advance_to(&MessageStatus::Read));
    }

    #[test]
    fn failed_reachable_from_any_non_read_state() {
        assert!(MessageStatus::Pending.can_advance_to(&MessageStatus::Failed));
        assert!(MessageStatus::Sent.can_advance_to(&MessageStatus::Failed));
        assert!(MessageStatus::Delivered.can_advance_to(&MessageStatus::Failed));
        assert!(!MessageStatus::Read.can_advance_to(&MessageStatus::Failed));
    }

    #[test]
    fn failed_is_terminal() {
        assert!(!MessageStatus::Failed.can_advance_to(&MessageStatus::Pending));
        assert!(!MessageStatus::Failed.can_advance_to(&MessageStatus::Sent));
        assert!(!MessageStatus::Failed.can_advance_to(&MessageStatus::Delivered));
        assert!(!MessageStatus::Failed.can_advance_to(&MessageStatus::Read));
        assert!(!MessageStatus::Failed.can_advance_to(&MessageStatus::Failed));
    }
}
