//! Session Manager (§3): the registry of live [`ChannelSession`]s keyed by
//! inbox id, held behind a lock that is never held across a session's own
//! async calls (§3 "never block the registry on a provider round trip").

use super::store::SessionStore;
use super::whatsapp::WhatsAppSession;
use super::{ChannelSession, ChannelStatus, EventSink, SharedSession};
use crate::error::ChannelError;
use crate::schema::ChannelKind;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    store: SessionStore,
    sink: Arc<dyn EventSink>,
    media_dir: String,
    restore_stagger: Duration,
}

impl SessionManager {
    pub fn new(
        whatsapp_store_path: impl Into<String>,
        media_dir: impl Into<String>,
        sink: Arc<dyn EventSink>,
        restore_stagger: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store: SessionStore::new(whatsapp_store_path),
            sink,
            media_dir: media_dir.into(),
            restore_stagger,
        }
    }

    /// Registers and connects a new session for `inbox_id`, replacing any
    /// existing one. The lock is never held across the session's own async
    /// calls (§3 "never block the registry on a provider round trip").
    pub async fn connect(
        &self,
        inbox_id: Uuid,
        kind: ChannelKind,
        identity: Option<String>,
    ) -> Result<(), ChannelError> {
        // §4.2: reject if an entry exists and reports connected; a
        // disconnected or mid-pairing leftover entry is safe to replace.
        if let Some(existing) = self.get(inbox_id).await
            && existing.status() == ChannelStatus::Connected
        {
            return Err(ChannelError::AlreadyConnected);
        }

        let session = self.build_session_for(inbox_id, kind, identity).await?;
        session.connect().await?;
        self.sessions.write().await.insert(inbox_id, session);
        Ok(())
    }

    async fn build_session_for(
        &self,
        inbox_id: Uuid,
        kind: ChannelKind,
        identity: Option<String>,
    ) -> Result<SharedSession, ChannelError> {
        match kind {
            ChannelKind::Whatsapp => {
                // Whichever identity ends up backing the session's store file
                // MUST be the same one we hand back to the session, so it is
                // the identity persisted on pair-success (§2 `Load(identity)
                // -> Device`) — a freshly minted device's identity is never
                // discarded in favor of some other value (e.g. the phone
                // number), or `RestoreConnections` would load an empty store.
                let (store, resolved_identity) = match identity {
                    Some(identity) => {
                        let store = self
                            .store
                            .load(&identity)
                            .await
                            .map_err(|e| ChannelError::Provider(e.to_string()))?;
                        (store, identity)
                    }
                    None => self
                        .store
                        .new_device()
                        .await
                        .map(|(identity, store)| (store, identity))
                        .map_err(|e| ChannelError::Provider(e.to_string()))?,
                };
                Ok(WhatsAppSession::new(
                    inbox_id,
                    self.sink.clone(),
                    store,
                    Some(resolved_identity),
                    self.media_dir.clone(),
                ))
            }
            ChannelKind::Telegram => Err(ChannelError::UnsupportedKind("telegram".into())),
            ChannelKind::Api => Err(ChannelError::UnsupportedKind("api".into())),
        }
    }

    pub async fn disconnect(&self, inbox_id: Uuid) -> Result<(), ChannelError> {
        let session = self.get(inbox_id).await.ok_or(ChannelError::NotFound)?;
        session.disconnect().await;
        Ok(())
    }

    pub async fn logout(&self, inbox_id: Uuid) -> Result<(), ChannelError> {
        let session = self.get(inbox_id).await.ok_or(ChannelError::NotFound)?;
        session.logout().await
    }

    pub async fn remove(&self, inbox_id: Uuid) {
        if let Some(session) = self.sessions.write().await.remove(&inbox_id) {
            session.disconnect().await;
        }
    }

    pub async fn get(&self, inbox_id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&inbox_id).cloned()
    }

    pub async fn get_connected(&self, inbox_id: Uuid) -> Result<SharedSession, ChannelError> {
        // §4.2: `GetConnected` reports `ErrNotConnected` whether there is no
        // entry at all or an entry that isn't connected yet.
        let session = self.get(inbox_id).await.ok_or(ChannelError::NotConnected)?;
        if session.status() != ChannelStatus::Connected {
            return Err(ChannelError::NotConnected);
        }
        Ok(session)
    }

    pub async fn status(&self, inbox_id: Uuid) -> ChannelStatus {
        match self.get(inbox_id).await {
            Some(session) => session.status(),
            None => ChannelStatus::Disconnected,
        }
    }

    /// Reconnects every inbox with a persisted identity at process startup,
    /// staggered so a restart doesn't open every provider connection in the
    /// same instant (§5 "Startup restore").
    pub async fn restore_connections(
        &self,
        inboxes: Vec<(Uuid, ChannelKind, Option<String>)>,
    ) {
        for (inbox_id, kind, identity) in inboxes {
            if identity.is_none() {
                continue;
            }
            if let Err(e) = self.connect(inbox_id, kind, identity).await {
                tracing::error!(%inbox_id, error = %e, "failed to restore channel session");
            }
            tokio::time::sleep(self.restore_stagger).await;
        }
    }

    /// Disconnects every live session, waiting at most one second total
    /// (§5 "Cancellation") rather than per-session.
    pub async fn shutdown(&self) {
        let sessions: Vec<SharedSession> = self.sessions.write().await.drain().map(|(_, v)| v).collect();
        let _ = tokio::time::timeout(Duration::from_secs(1), disconnect_all(sessions)).await;
    }

    #[cfg(test)]
    pub(crate) async fn insert_for_test(&self, inbox_id: Uuid, session: SharedSession) {
        self.sessions.write().await.insert(inbox_id, session);
    }
}

async fn disconnect_all(sessions: Vec<SharedSession>) {
    let mut handles = Vec::with_capacity(sessions.len());
    for session in sessions {
        handles.push(tokio::spawn(async move { session.disconnect().await }));
    }
    for handle in handles {
        let _ = handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelEvent, EventSink, OutboundMedia};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct NoopSink;

    #[async_trait]
    impl EventSink for NoopSink {
        async fn handle(&self, _inbox_id: Uuid, _event: ChannelEvent) {}
    }

    struct FakeSession {
        status: std::sync::Mutex<ChannelStatus>,
        disconnected: AtomicBool,
    }

    impl FakeSession {
        fn new(status: ChannelStatus) -> Arc<Self> {
            Arc::new(Self {
                status: std::sync::Mutex::new(status),
                disconnected: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl ChannelSession for FakeSession {
        async fn connect(&self) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn disconnect(&self) {
            self.disconnected.store(true, Ordering::SeqCst);
            *self.status.lock().unwrap() = ChannelStatus::Disconnected;
        }

        async fn logout(&self) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn send_text(&self, _target: &str, _body: &str) -> Result<String, ChannelError> {
            Err(ChannelError::NotConnected)
        }

        async fn send_media(
            &self,
            _target: &str,
            _media: OutboundMedia,
        ) -> Result<String, ChannelError> {
            Err(ChannelError::NotConnected)
        }

        fn status(&self) -> ChannelStatus {
            *self.status.lock().unwrap()
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

    fn test_manager() -> SessionManager {
        SessionManager::new("/tmp/chatcore-test", "/tmp/chatcore-test-media", Arc::new(NoopSink), Duration::from_millis(0))
    }

    #[tokio::test]
    async fn connect_rejects_when_already_connected() {
        let manager = test_manager();
        let inbox_id = Uuid::new_v4();
        manager
            .insert_for_test(inbox_id, FakeSession::new(ChannelStatus::Connected))
            .await;

        let result = manager.connect(inbox_id, ChannelKind::Whatsapp, None).await;
        assert!(matches!(result, Err(ChannelError::AlreadyConnected)));
    }

    #[tokio::test]
    async fn get_connected_fails_when_not_connected() {
        let manager = test_manager();
        let inbox_id = Uuid::new_v4();
        manager
            .insert_for_test(inbox_id, FakeSession::new(ChannelStatus::Disconnected))
            .await;

        let result = manager.get_connected(inbox_id).await;
        assert!(matches!(result, Err(ChannelError::NotConnected)));
    }

    #[tokio::test]
    async fn get_connected_fails_with_not_connected_when_no_entry_exists() {
        let manager = test_manager();
        let result = manager.get_connected(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ChannelError::NotConnected)));
    }

    #[tokio::test]
    async fn shutdown_signals_every_session_and_empties_the_registry() {
        let manager = test_manager();
        let a = FakeSession::new(ChannelStatus::Connected);
        let b = FakeSession::new(ChannelStatus::Connected);
        manager.insert_for_test(Uuid::new_v4(), a.clone()).await;
        manager.insert_for_test(Uuid::new_v4(), b.clone()).await;

        manager.shutdown().await;

        assert!(a.disconnected.load(Ordering::SeqCst));
        assert!(b.disconnected.load(Ordering::SeqCst));
        assert_eq!(manager.sessions.read().await.len(), 0);
    }

    #[tokio::test]
    async fn status_reports_disconnected_for_unregistered_inbox() {
        let manager = test_manager();
        assert_eq!(manager.status(Uuid::new_v4()).await, ChannelStatus::Disconnected);
    }
}
