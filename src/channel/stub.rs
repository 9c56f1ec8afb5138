//! Channel kinds named by `schema::ChannelKind` but not yet backed by a real
//! provider integration. The design notes (§9, "Dynamic per-inbox
//! polymorphism") call for unsupported kinds to fail once, at construction,
//! rather than on every call — so the Manager can treat every registered
//! session uniformly afterward.

use super::{ChannelError, ChannelSession, ChannelStatus, OutboundMedia};
use async_trait::async_trait;

pub struct UnsupportedSession {
    kind: &'static str,
}

impl UnsupportedSession {
    pub fn new(kind: &'static str) -> Result<Self, ChannelError> {
        Err(ChannelError::UnsupportedKind(kind.to_string()))
    }
}

#[async_trait]
impl ChannelSession for UnsupportedSession {
    async fn connect(&self) -> Result<(), ChannelError> {
        Err(ChannelError::UnsupportedKind(self.kind.to_string()))
    }

    async fn disconnect(&self) {}

    async fn logout(&self) -> Result<(), ChannelError> {
        Err(ChannelError::UnsupportedKind(self.kind.to_string()))
    }

    async fn send_text(&self, _target: &str, _body: &str) -> Result<String, ChannelError> {
        Err(ChannelError::UnsupportedKind(self.kind.to_string()))
    }

    async fn send_media(
        &self,
        _target: &str,
        _media: OutboundMedia,
    ) -> Result<String, ChannelError> {
        Err(ChannelError::UnsupportedKind(self.kind.to_string()))
    }

    fn status(&self) -> ChannelStatus {
        ChannelStatus::Disconnected
    }

    fn qr_image(&self) -> Option<String> {
        None
    }

    fn identity(&self) -> Option<String> {
        None
    }

    fn phone(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_fails_for_unsupported_kind() {
        assert!(matches!(
            UnsupportedSession::new("telegram"),
            Err(ChannelError::UnsupportedKind(_))
        ));
    }
}
