pub mod manager;
pub mod store;
pub mod stub;
pub mod whatsapp;

pub use manager::SessionManager;

use crate::error::ChannelError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Status reported by [`ChannelSession::status`], mirrors `schema::InboxStatus`
/// but lives independently of it: a session is the *authoritative* source,
/// the persisted `Inbox.status` is a cache refreshed on every transition (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    Disconnected,
    Connecting,
    QrCode,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
    Sticker,
    Location,
}

#[derive(Debug, Clone)]
pub struct OutboundMedia {
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
    pub mime: String,
    pub filename: Option<String>,
    pub caption: Option<String>,
}

/// A raw occurrence observed by a live [`ChannelSession`], normalized enough
/// that the Event Pipeline never needs to know which provider produced it.
/// This is the language-neutral `IncomingEvent` shape from §4.3, expressed
/// as a Rust enum rather than a single struct with an optional-everything
/// `kind` tag field.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Message {
        source_id: String,
        contact_source_id: String,
        contact_display_name: String,
        is_from_me: bool,
        content: Option<String>,
        media: Option<IncomingMedia>,
        timestamp: DateTime<Utc>,
    },
    Receipt {
        source_id: String,
        status: crate::schema::MessageStatus,
    },
    QrCode {
        code: String,
        data_url: String,
    },
    Connected {
        phone: String,
        identity: String,
    },
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct IncomingMedia {
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
    pub mime: String,
    pub filename: Option<String>,
}

/// One-way capability the Manager hands to every [`ChannelSession`] at
/// construction so sessions can publish events without importing the
/// pipeline or services crate — breaking the cyclic reference the design
/// notes (§9) call out explicitly.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn handle(&self, inbox_id: Uuid, event: ChannelEvent);
}

/// The shared capability set every channel kind implements (§9: "Dynamic
/// per-inbox polymorphism"). Kinds not yet implemented (Telegram, API)
/// return [`ChannelError::UnsupportedKind`] from their constructor rather
/// than from every method, so the Manager never has to special-case them
/// once one has been registered.
#[async_trait]
pub trait ChannelSession: Send + Sync {
    async fn connect(&self) -> Result<(), ChannelError>;
    async fn disconnect(&self);
    async fn logout(&self) -> Result<(), ChannelError>;

    async fn send_text(&self, target: &str, body: &str) -> Result<String, ChannelError>;
    async fn send_media(&self, target: &str, media: OutboundMedia) -> Result<String, ChannelError>;

    fn status(&self) -> ChannelStatus;
    fn qr_image(&self) -> Option<String>;
    fn identity(&self) -> Option<String>;
    fn phone(&self) -> Option<String>;
}

pub type SharedSession = Arc<dyn ChannelSession>;

/// Strips a provider routing suffix after `@` and normalizes to `+<digits>`.
pub fn phone_from_source_id(source_id: &str) -> String {
    let digits = source_id.split('@').next().unwrap_or(source_id);
    if digits.starts_with('+') {
        digits.to_string()
    } else {
        format!("+{digits}")
    }
}

/// The send target is ambiguous (§9 open question): it accepts both phone
/// strings and pre-parsed identifiers. Disambiguated by presence of `@`: a
/// provider identifier always carries its routing suffix, a plain phone
/// number never does.
pub fn is_provider_identifier(target: &str) -> bool {
    target.contains('@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_provider_suffix_and_prepends_plus() {
        assert_eq!(
            phone_from_source_id("5511988887777@provider"),
            "+5511988887777"
        );
    }

    #[test]
    fn leaves_plain_digits_alone_besides_prefixing() {
        assert_eq!(phone_from_source_id("5511988887777"), "+5511988887777");
    }

    #[test]
    fn does_not_double_prefix_already_plus_prefixed() {
        assert_eq!(phone_from_source_id("+5511988887777"), "+5511988887777");
    }

    #[test]
    fn disambiguates_target_by_at_sign() {
        assert!(is_provider_identifier("5511988887777@provider"));
        assert!(!is_provider_identifier("+5511988887777"));
    }
}
