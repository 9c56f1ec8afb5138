//! Event Pipeline (§4.3): turns channel events into durable state with
//! idempotency and uniqueness guarantees, and dispatches outbound sends back
//! through the Session Manager. One pipeline instance serves every inbox,
//! reached through the [`crate::channel::EventSink`] capability handed to
//! each channel session.

use crate::channel::{ChannelEvent, EventSink, MediaKind as ChannelMediaKind, OutboundMedia};
use crate::channel::manager::SessionManager;
use crate::error::{ChannelError, PipelineError, RepoError};
use crate::hub::{BroadcastEvent, BroadcastHub, BroadcastKind};
use crate::repo::{
    attachment_repo, channel_config_repo, contact_inbox_repo, contact_repo, conversation_repo,
    event_repo, inbox_repo, message_repo,
};
use crate::schema::{
    AttachmentKind, ChannelKind as SchemaChannelKind, ContentKind, InboxStatus, Message,
    MessageStatus, SenderKind,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct SendMessageRequest {
    pub content: Option<String>,
    pub media: Option<OutboundMedia>,
}

pub struct EventPipeline {
    db: PgPool,
    hub: Arc<BroadcastHub>,
    manager: Arc<SessionManager>,
    media_dir: String,
}

impl EventPipeline {
    pub fn new(
        db: PgPool,
        hub: Arc<BroadcastHub>,
        manager: Arc<SessionManager>,
        media_dir: String,
    ) -> Arc<Self> {
        Arc::new(Self { db, hub, manager, media_dir })
    }

    fn content_kind_for(media: Option<ChannelMediaKind>) -> ContentKind {
        match media {
            None => ContentKind::Text,
            Some(ChannelMediaKind::Image) => ContentKind::Image,
            Some(ChannelMediaKind::Video) => ContentKind::Video,
            Some(ChannelMediaKind::Audio) => ContentKind::Audio,
            Some(ChannelMediaKind::Document) => ContentKind::Document,
            Some(ChannelMediaKind::Sticker) => ContentKind::Sticker,
            Some(ChannelMediaKind::Location) => ContentKind::Location,
        }
    }

    fn attachment_kind_for(media: ChannelMediaKind) -> AttachmentKind {
        match media {
            ChannelMediaKind::Image => AttachmentKind::Image,
            ChannelMediaKind::Video => AttachmentKind::Video,
            ChannelMediaKind::Audio => AttachmentKind::Audio,
            ChannelMediaKind::Document => AttachmentKind::Document,
            ChannelMediaKind::Sticker => AttachmentKind::Sticker,
            ChannelMediaKind::Location => AttachmentKind::Location,
        }
    }

    fn audit(&self, trace_id: Uuid, action: &str, payload: serde_json::Value) {
        let db = self.db.clone();
        let action = action.to_string();
        tokio::spawn(async move {
            if let Err(e) = event_repo::record(&db, Some(trace_id), "pipeline", &action, payload).await {
                tracing::warn!(error = %e, action, "failed to persist audit event");
            }
        });
    }

    fn broadcast_message(&self, inbox_id: Uuid, message: &Message) {
        self.hub.broadcast(BroadcastEvent {
            kind: BroadcastKind::Message,
            inbox_id,
            data: serde_json::to_value(message).unwrap_or_default(),
        });
    }

    fn broadcast_conversation(&self, inbox_id: Uuid, conversation_id: Uuid) {
        let db = self.db.clone();
        let hub = self.hub.clone();
        tokio::spawn(async move {
            match conversation_repo::get(&db, conversation_id).await {
                Ok(conv) => hub.broadcast(BroadcastEvent {
                    kind: BroadcastKind::ConversationUpdate,
                    inbox_id,
                    data: serde_json::to_value(conv).unwrap_or_default(),
                }),
                Err(e) => tracing::warn!(error = %e, "failed to reload conversation for broadcast"),
            }
        });
    }

    /// Inbound-message algorithm (§4.3), steps 1-9.
    async fn handle_message(
        &self,
        inbox_id: Uuid,
        source_id: String,
        contact_source_id: String,
        contact_display_name: String,
        is_from_me: bool,
        content: Option<String>,
        media: Option<crate::channel::IncomingMedia>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        let trace_id = Uuid::new_v4();

        // Step 1: idempotency guard.
        if message_repo::find_by_source(&self.db, inbox_id, &source_id)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let phone = crate::channel::phone_from_source_id(&contact_source_id);

        // Step 2: resolve Contact.
        let contact = match contact_repo::find_by_phone(&self.db, &phone).await? {
            Some(existing) => {
                if existing.name != contact_display_name {
                    contact_repo::update_name(&self.db, existing.id, &contact_display_name).await?;
                }
                existing
            }
            None => contact_repo::create(&self.db, &contact_display_name, Some(&phone)).await?,
        };

        // Step 3: resolve ContactInbox.
        let contact_inbox = contact_inbox_repo::find_or_create_by_source(
            &self.db,
            inbox_id,
            &contact_source_id,
            contact.id,
        )
        .await?;

        // Step 4: resolve Conversation, reopening it if the latest one for
        // this contact-inbox was resolved (§3 invariant: at most one
        // non-resolved Conversation per ContactInbox at any time).
        let conversation = match conversation_repo::find_latest_by_contact_inbox(&self.db, contact_inbox.id).await? {
            Some(conv) if matches!(conv.status, crate::schema::ConversationStatus::Resolved) => {
                conversation_repo::reopen(&self.db, conv.id).await?;
                conversation_repo::get(&self.db, conv.id).await?
            }
            Some(conv) => conv,
            None => conversation_repo::create(&self.db, inbox_id, contact.id, contact_inbox.id).await?,
        };

        // Step 5/6: sender-kind and content-kind.
        let sender_kind = if is_from_me { SenderKind::User } else { SenderKind::Contact };
        let content_kind = Self::content_kind_for(media.as_ref().map(|m| m.kind));

        // Step 7: persist Message as "delivered" (received by us).
        let message = message_repo::create(
            &self.db,
            conversation.id,
            inbox_id,
            sender_kind,
            None,
            content.as_deref(),
            content_kind,
            Some(&source_id),
            MessageStatus::Delivered,
        )
        .await?;

        if let Some(media) = media {
            let filename = media
                .filename
                .clone()
                .unwrap_or_else(|| format!("{}", Uuid::new_v4()));
            let size_bytes = media.bytes.len() as i64;
            let disk_path = format!("{}/{filename}", self.media_dir);
            if let Err(e) = tokio::fs::write(&disk_path, &media.bytes).await {
                tracing::warn!(error = %e, path = disk_path, "failed to persist inbound media to disk");
            }
            if let Err(e) = attachment_repo::create(
                &self.db,
                message.id,
                Self::attachment_kind_for(media.kind),
                &format!("/media/{filename}"),
                Some(&filename),
                Some(size_bytes),
                &media.mime,
            )
            .await
            {
                tracing::warn!(error = %e, "failed to persist attachment row");
            }
        }

        // Step 8: update Conversation.
        let increment_unread = matches!(sender_kind, SenderKind::Contact);
        conversation_repo::record_inbound_message(&self.db, conversation.id, timestamp, increment_unread).await?;

        // Step 9: broadcast deltas + audit row.
        self.broadcast_message(inbox_id, &message);
        self.broadcast_conversation(inbox_id, conversation.id);
        self.audit(
            trace_id,
            "message_ingested",
            serde_json::json!({
                "inbox_id": inbox_id,
                "message_id": message.id,
                "conversation_id": conversation.id,
            }),
        );

        Ok(())
    }

    async fn handle_receipt(&self, inbox_id: Uuid, source_id: String, status: MessageStatus) {
        if let Err(e) = message_repo::update_status_by_source(&self.db, inbox_id, &source_id, status).await {
            tracing::warn!(%inbox_id, source_id, error = %e, "failed to apply receipt");
        }
    }

    async fn handle_qr(&self, inbox_id: Uuid, data_url: String) {
        if let Err(e) = inbox_repo::set_qr_code(&self.db, inbox_id, &data_url).await {
            tracing::warn!(%inbox_id, error = %e, "failed to persist qr code");
            return;
        }
        self.hub.broadcast(BroadcastEvent {
            kind: BroadcastKind::Qr,
            inbox_id,
            data: serde_json::json!({ "qr_code": data_url }),
        });
        self.audit(Uuid::new_v4(), "qr_issued", serde_json::json!({ "inbox_id": inbox_id }));
    }

    async fn handle_connected(&self, inbox_id: Uuid, phone: String, identity: String) {
        if let Err(e) = inbox_repo::clear_qr_code(&self.db, inbox_id, InboxStatus::Connected).await {
            tracing::warn!(%inbox_id, error = %e, "failed to clear qr code on connect");
        }
        if let Ok(inbox) = inbox_repo::get(&self.db, inbox_id).await
            && inbox.channel_kind == SchemaChannelKind::Whatsapp
            && let Err(e) = channel_config_repo::set_paired(&self.db, inbox.channel_config_id, &phone, &identity).await
        {
            tracing::warn!(%inbox_id, error = %e, "failed to persist paired channel config");
        }
        self.hub.broadcast(BroadcastEvent {
            kind: BroadcastKind::ConnectionStatus,
            inbox_id,
            data: serde_json::json!({ "status": "connected", "phone": phone }),
        });
        self.audit(
            Uuid::new_v4(),
            "channel_connected",
            serde_json::json!({ "inbox_id": inbox_id, "phone": phone }),
        );
    }

    async fn handle_disconnected(&self, inbox_id: Uuid) {
        if let Err(e) = inbox_repo::update_status(&self.db, inbox_id, InboxStatus::Disconnected).await {
            tracing::warn!(%inbox_id, error = %e, "failed to persist disconnect status");
        }
        self.hub.broadcast(BroadcastEvent {
            kind: BroadcastKind::ConnectionStatus,
            inbox_id,
            data: serde_json::json!({ "status": "disconnected" }),
        });
        self.audit(
            Uuid::new_v4(),
            "channel_disconnected",
            serde_json::json!({ "inbox_id": inbox_id }),
        );
    }

    /// Outbound send algorithm (§4.3 `SendMessage`).
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        req: SendMessageRequest,
        sender_id: Uuid,
    ) -> Result<Message, PipelineError> {
        let conversation = conversation_repo::get(&self.db, conversation_id)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => PipelineError::ConversationNotFound(conversation_id),
                other => other.into(),
            })?;

        let session = self.manager.get_connected(conversation.inbox_id).await?;

        let target = {
            let inbox = inbox_repo::get(&self.db, conversation.inbox_id).await?;
            let config = channel_config_repo::get(&self.db, inbox.channel_config_id).await?;
            config.phone_number.ok_or(ChannelError::NotConnected)?
        };

        let (source_id, content_kind) = match req.media {
            Some(media) => {
                let kind = Self::content_kind_for(Some(media.kind));
                let source_id = session.send_media(&target, media).await?;
                (source_id, kind)
            }
            None => {
                let body = req.content.clone().unwrap_or_default();
                let source_id = session.send_text(&target, &body).await?;
                (source_id, ContentKind::Text)
            }
        };

        let message = message_repo::create(
            &self.db,
            conversation.id,
            conversation.inbox_id,
            SenderKind::User,
            Some(sender_id),
            req.content.as_deref(),
            content_kind,
            Some(&source_id),
            MessageStatus::Sent,
        )
        .await?;

        conversation_repo::record_outbound_message(&self.db, conversation.id, message.created_at).await?;
        self.broadcast_message(conversation.inbox_id, &message);

        Ok(message)
    }
}

#[async_trait]
impl EventSink for EventPipeline {
    async fn handle(&self, inbox_id: Uuid, event: ChannelEvent) {
        match event {
            ChannelEvent::Message {
                source_id,
                contact_source_id,
                contact_display_name,
                is_from_me,
                content,
                media,
                timestamp,
            } => {
                if let Err(e) = self
                    .handle_message(
                        inbox_id,
                        source_id,
                        contact_source_id,
                        contact_display_name,
                        is_from_me,
                        content,
                        media,
                        timestamp,
                    )
                    .await
                {
                    tracing::error!(%inbox_id, error = %e, "failed to process inbound message");
                }
            }
            ChannelEvent::Receipt { source_id, status } => {
                self.handle_receipt(inbox_id, source_id, status).await;
            }
            ChannelEvent::QrCode { data_url, .. } => {
                self.handle_qr(inbox_id, data_url).await;
            }
            ChannelEvent::Connected { phone, identity } => {
                self.handle_connected(inbox_id, phone, identity).await;
            }
            ChannelEvent::Disconnected => {
                self.handle_disconnected(inbox_id).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelSession, ChannelStatus};
    use crate::schema::ConversationStatus;
    use forge::testing::*;
    use std::time::Duration;

    async fn setup() -> (IsolatedTestDb, PgPool) {
        let base = TestDatabase::embedded().await.unwrap();
        let db = base.isolated("pipeline").await.unwrap();
        db.run_sql(&forge::get_internal_sql()).await.unwrap();
        db.run_sql(
            r#"
            CREATE TABLE whatsapp_channel_configs (
                id uuid PRIMARY KEY,
                phone_number text,
                identity text,
                provider_tag text NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now(),
                updated_at timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE inboxes (
                id uuid PRIMARY KEY,
                name text NOT NULL,
                channel_kind text NOT NULL,
                channel_config_id uuid NOT NULL,
                status text NOT NULL,
                qr_code text,
                greeting_text text,
                auto_assign boolean NOT NULL DEFAULT false,
                created_at timestamptz NOT NULL DEFAULT now(),
                updated_at timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE contacts (
                id uuid PRIMARY KEY,
                name text NOT NULL,
                email text,
                phone text,
                avatar_url text,
                custom_attributes jsonb NOT NULL DEFAULT '{}'::jsonb,
                created_at timestamptz NOT NULL DEFAULT now(),
                updated_at timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE contact_inboxes (
                id uuid PRIMARY KEY,
                contact_id uuid NOT NULL,
                inbox_id uuid NOT NULL,
                source_id text NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now(),
                UNIQUE (inbox_id, source_id)
            );

            CREATE TABLE conversations (
                id uuid PRIMARY KEY,
                inbox_id uuid NOT NULL,
                contact_id uuid NOT NULL,
                contact_inbox_id uuid NOT NULL,
                assignee_id uuid,
                status text NOT NULL,
                priority int NOT NULL DEFAULT 0,
                unread_count int NOT NULL DEFAULT 0,
                favorite boolean NOT NULL DEFAULT false,
                archived boolean NOT NULL DEFAULT false,
                last_message_at timestamptz,
                created_at timestamptz NOT NULL DEFAULT now(),
                updated_at timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE messages (
                id uuid PRIMARY KEY,
                conversation_id uuid NOT NULL,
                inbox_id uuid NOT NULL,
                sender_kind text NOT NULL,
                sender_id uuid,
                content text,
                content_kind text NOT NULL,
                source_id text,
                status text NOT NULL,
                private boolean NOT NULL DEFAULT false,
                created_at timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE attachments (
                id uuid PRIMARY KEY,
                message_id uuid NOT NULL,
                kind text NOT NULL,
                url text NOT NULL,
                filename text,
                size_bytes bigint,
                mime_type text NOT NULL,
                created_at timestamptz NOT NULL DEFAULT now()
            );

            CREATE TABLE events (
                id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                trace_id uuid,
                source text NOT NULL,
                action text NOT NULL,
                payload jsonb NOT NULL DEFAULT '{}'::jsonb,
                created_at timestamptz NOT NULL DEFAULT now()
            );
            "#,
        )
        .await
        .unwrap();
        let pool = db.pool().clone();
        (db, pool)
    }

    async fn seed_inbox(pool: &PgPool) -> (Uuid, Uuid) {
        let config_id = Uuid::new_v4();
        sqlx::query("INSERT INTO whatsapp_channel_configs (id, provider_tag) VALUES ($1, 'whatsapp')")
            .bind(config_id)
            .execute(pool)
            .await
            .unwrap();
        let inbox_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO inboxes (id, name, channel_kind, channel_config_id, status, auto_assign) VALUES ($1, 'Support', 'whatsapp', $2, 'disconnected', false)",
        )
        .bind(inbox_id)
        .bind(config_id)
        .execute(pool)
        .await
        .unwrap();
        (inbox_id, config_id)
    }

    struct NoopSink;

    #[async_trait]
    impl EventSink for NoopSink {
        async fn handle(&self, _inbox_id: Uuid, _event: ChannelEvent) {}
    }

    struct FakeSession {
        status: std::sync::Mutex<ChannelStatus>,
    }

    #[async_trait]
    impl ChannelSession for FakeSession {
        async fn connect(&self) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn disconnect(&self) {
            *self.status.lock().unwrap() = ChannelStatus::Disconnected;
        }

        async fn logout(&self) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn send_text(&self, _target: &str, _body: &str) -> Result<String, ChannelError> {
            Ok("wamid.sent-1".to_string())
        }

        async fn send_media(&self, _target: &str, _media: OutboundMedia) -> Result<String, ChannelError> {
            Ok("wamid.sent-media".to_string())
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
            Some("+15551234567".into())
        }
    }

    fn test_pipeline(pool: PgPool) -> (Arc<EventPipeline>, Arc<SessionManager>) {
        let hub = BroadcastHub::new(16);
        let manager = Arc::new(SessionManager::new(
            "/tmp/chatcore-pipeline-test",
            "/tmp/chatcore-pipeline-media",
            Arc::new(NoopSink),
            Duration::from_millis(0),
        ));
        let pipeline = EventPipeline::new(pool, hub, manager.clone(), "/tmp/chatcore-pipeline-media".to_string());
        (pipeline, manager)
    }

    fn inbound_event(source_id: &str, contact_source_id: &str, content: &str) -> ChannelEvent {
        ChannelEvent::Message {
            source_id: source_id.to_string(),
            contact_source_id: contact_source_id.to_string(),
            contact_display_name: "Ada".to_string(),
            is_from_me: false,
            content: Some(content.to_string()),
            media: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn inbound_message_creates_contact_and_conversation() {
        let (_db, pool) = setup().await;
        let (inbox_id, _config_id) = seed_inbox(&pool).await;
        let (pipeline, _manager) = test_pipeline(pool.clone());

        pipeline
            .handle(inbox_id, inbound_event("wamid.1", "15551234567@s.whatsapp.net", "hello"))
            .await;

        let contact = contact_repo::find_by_phone(&pool, "+15551234567")
            .await
            .unwrap()
            .expect("contact should have been created");
        assert_eq!(contact.name, "Ada");

        let conversations = conversation_repo::list(
            &pool,
            crate::repo::ConversationFilter {
                inbox_id: Some(inbox_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].status, ConversationStatus::Open);
        assert_eq!(conversations[0].unread_count, 1);

        let messages = message_repo::list_by_conversation(&pool, conversations[0].id, 10, 0)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].status, MessageStatus::Delivered);
    }

    #[tokio::test]
    async fn redelivering_the_same_source_id_is_a_no_op() {
        let (_db, pool) = setup().await;
        let (inbox_id, _config_id) = seed_inbox(&pool).await;
        let (pipeline, _manager) = test_pipeline(pool.clone());

        let event = inbound_event("wamid.dup", "15551234567@s.whatsapp.net", "hello");
        pipeline.handle(inbox_id, event.clone()).await;
        pipeline.handle(inbox_id, event).await;

        let all = message_repo::find_by_source(&pool, inbox_id, "wamid.dup").await.unwrap();
        assert!(all.is_some());

        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM messages WHERE source_id = $1")
            .bind("wamid.dup")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn reply_after_resolution_reopens_the_conversation_instead_of_branching() {
        let (_db, pool) = setup().await;
        let (inbox_id, _config_id) = seed_inbox(&pool).await;
        let (pipeline, _manager) = test_pipeline(pool.clone());

        pipeline
            .handle(inbox_id, inbound_event("wamid.1", "15551234567@s.whatsapp.net", "first"))
            .await;
        let first = conversation_repo::list(
            &pool,
            crate::repo::ConversationFilter {
                inbox_id: Some(inbox_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(first.len(), 1);
        conversation_repo::set_status(&pool, first[0].id, ConversationStatus::Resolved)
            .await
            .unwrap();

        pipeline
            .handle(inbox_id, inbound_event("wamid.2", "15551234567@s.whatsapp.net", "second"))
            .await;

        let after = conversation_repo::list(
            &pool,
            crate::repo::ConversationFilter {
                inbox_id: Some(inbox_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(after.len(), 1, "reply should reopen, not branch");
        assert_eq!(after[0].id, first[0].id);
        assert_eq!(after[0].status, ConversationStatus::Open);

        let messages = message_repo::list_by_conversation(&pool, first[0].id, 10, 0).await.unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn send_message_dispatches_through_connected_session_and_marks_sent() {
        let (_db, pool) = setup().await;
        let (inbox_id, config_id) = seed_inbox(&pool).await;
        channel_config_repo::set_paired(&pool, config_id, "+15559998888", "identity-1")
            .await
            .unwrap();

        let (pipeline, manager) = test_pipeline(pool.clone());
        manager
            .insert_for_test(
                inbox_id,
                std::sync::Arc::new(FakeSession {
                    status: std::sync::Mutex::new(ChannelStatus::Connected),
                }),
            )
            .await;

        let contact = contact_repo::create(&pool, "Ada", Some("+15551234567")).await.unwrap();
        let contact_inbox = contact_inbox_repo::find_or_create_by_source(
            &pool,
            inbox_id,
            "15551234567@s.whatsapp.net",
            contact.id,
        )
        .await
        .unwrap();
        let conversation = conversation_repo::create(&pool, inbox_id, contact.id, contact_inbox.id)
            .await
            .unwrap();

        let message = pipeline
            .send_message(
                conversation.id,
                SendMessageRequest {
                    content: Some("on my way".to_string()),
                    media: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!(message.status, MessageStatus::Sent);
        assert_eq!(message.sender_kind, SenderKind::User);
        assert_eq!(message.source_id.as_deref(), Some("wamid.sent-1"));
    }

    #[tokio::test]
    async fn send_message_fails_when_no_session_is_registered() {
        let (_db, pool) = setup().await;
        let (inbox_id, _config_id) = seed_inbox(&pool).await;
        let (pipeline, _manager) = test_pipeline(pool.clone());

        let contact = contact_repo::create(&pool, "Ada", Some("+15551234567")).await.unwrap();
        let contact_inbox = contact_inbox_repo::find_or_create_by_source(
            &pool,
            inbox_id,
            "15551234567@s.whatsapp.net",
            contact.id,
        )
        .await
        .unwrap();
        let conversation = conversation_repo::create(&pool, inbox_id, contact.id, contact_inbox.id)
            .await
            .unwrap();

        let result = pipeline
            .send_message(
                conversation.id,
                SendMessageRequest { content: Some("hi".to_string()), media: None },
                Uuid::new_v4(),
            )
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::Channel(ChannelError::NotFound))
        ));
    }
}
