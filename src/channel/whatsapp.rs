//! WhatsApp-kind [`ChannelSession`](super::ChannelSession): QR pairing, event
//! callback wiring, media upload/download, and outbound text/media dispatch.
//! One instance per inbox, owned exclusively by the
//! [`super::manager::SessionManager`] (§3 Ownership).

use super::{
    ChannelError, ChannelEvent, ChannelSession, ChannelStatus, EventSink, IncomingMedia,
    MediaKind, OutboundMedia, is_provider_identifier,
};
use async_trait::async_trait;
use base64::Engine;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;
use wacore::download::MediaType;
use wacore::proto_helpers::MessageExt;
use wacore::types::events::Event;
use waproto::whatsapp as wa;
use whatsapp_rust::bot::Bot;
use whatsapp_rust::store::SqliteStore;
use whatsapp_rust::upload::UploadResponse;
use whatsapp_rust::{ChatStateEvent, Jid};
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

struct Inner {
    status: ChannelStatus,
    qr_image: Option<String>,
    identity: Option<String>,
    phone: Option<String>,
}

pub struct WhatsAppSession {
    inbox_id: Uuid,
    sink: Arc<dyn EventSink>,
    store: Arc<SqliteStore>,
    media_dir: String,
    inner: std::sync::Mutex<Inner>,
    client: Arc<tokio::sync::OnceCell<Arc<whatsapp_rust::Client>>>,
    shutdown: AsyncMutex<Option<tokio::sync::oneshot::Sender<()>>>,
    task: AsyncMutex<Option<tokio::task::JoinHandle<()>>>,
    /// Lets the provider event callback (which only ever sees `&self`
    /// indirectly through a spawned task) obtain a strong handle to update
    /// `inner` — see [`WhatsAppSession::connect`].
    self_weak: std::sync::Mutex<Option<std::sync::Weak<WhatsAppSession>>>,
}

impl WhatsAppSession {
    pub fn new(
        inbox_id: Uuid,
        sink: Arc<dyn EventSink>,
        store: Arc<SqliteStore>,
        identity: Option<String>,
        media_dir: String,
    ) -> Arc<Self> {
        let session = Arc::new(Self {
            inbox_id,
            sink,
            store,
            media_dir,
            inner: std::sync::Mutex::new(Inner {
                status: ChannelStatus::Disconnected,
                qr_image: None,
                identity,
                phone: None,
            }),
            client: Arc::new(tokio::sync::OnceCell::new()),
            shutdown: AsyncMutex::new(None),
            task: AsyncMutex::new(None),
            self_weak: std::sync::Mutex::new(None),
        });
        *session.self_weak.lock().unwrap() = Some(Arc::downgrade(&session));
        session
    }

    fn set_status(&self, status: ChannelStatus) {
        self.inner.lock().unwrap().status = status;
    }

    fn set_qr(&self, qr: Option<String>) {
        self.inner.lock().unwrap().qr_image = qr;
    }

    /// Sets phone and status on pair-success. `identity` (the Session
    /// Store's lookup key, assigned at construction by
    /// [`super::manager::SessionManager::build_session_for`]) is left
    /// untouched — it must stay equal to the store file this session was
    /// opened against, never the phone number (§2 `Load(identity) -> Device`).
    fn set_connected(&self, phone: String) {
        let mut inner = self.inner.lock().unwrap();
        inner.status = ChannelStatus::Connected;
        inner.qr_image = None;
        inner.phone = Some(phone);
    }

}

fn render_qr_data_url(code: &str) -> Option<String> {
    let qr = qrcode::QrCode::new(code.as_bytes()).ok()?;
    let image = qr.render::<image::Luma<u8>>().build();
    let mut png_bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .ok()?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes);
    Some(format!("data:image/png;base64,{encoded}"))
}

fn media_type_from_kind(kind: MediaKind) -> Option<MediaType> {
    match kind {
        MediaKind::Image => Some(MediaType::Image),
        MediaKind::Video => Some(MediaType::Video),
        MediaKind::Audio => Some(MediaType::Audio),
        MediaKind::Document => Some(MediaType::Document),
        MediaKind::Sticker | MediaKind::Location => None,
    }
}

fn build_media_message(
    kind: MediaKind,
    upload: &UploadResponse,
    mime: &str,
    filename: Option<&str>,
    caption: Option<String>,
) -> Option<wa::Message> {
    let common = || {
        (
            Some(upload.url.clone()),
            Some(upload.direct_path.clone()),
            Some(upload.media_key.clone()),
            Some(upload.file_sha256.clone()),
            Some(upload.file_enc_sha256.clone()),
            Some(upload.file_length),
        )
    };

    Some(match kind {
        MediaKind::Image => {
            let (url, direct_path, media_key, file_sha256, file_enc_sha256, file_length) = common();
            wa::Message {
                image_message: Some(Box::new(wa::message::ImageMessage {
                    url,
                    direct_path,
                    media_key,
                    file_sha256,
                    file_enc_sha256,
                    file_length,
                    mimetype: Some(mime.to_string()),
                    caption,
                    ..Default::default()
                })),
                ..Default::default()
            }
        }
        MediaKind::Video => {
            let (url, direct_path, media_key, file_sha256, file_enc_sha256, file_length) = common();
            wa::Message {
                video_message: Some(Box::new(wa::message::VideoMessage {
                    url,
                    direct_path,
                    media_key,
                    file_sha256,
                    file_enc_sha256,
                    file_length,
                    mimetype: Some(mime.to_string()),
                    caption,
                    ..Default::default()
                })),
                ..Default::default()
            }
        }
        MediaKind::Audio => {
            let (url, direct_path, media_key, file_sha256, file_enc_sha256, file_length) = common();
            wa::Message {
                audio_message: Some(Box::new(wa::message::AudioMessage {
                    url,
                    direct_path,
                    media_key,
                    file_sha256,
                    file_enc_sha256,
                    file_length,
                    mimetype: Some(mime.to_string()),
                    ..Default::default()
                })),
                ..Default::default()
            }
        }
        MediaKind::Document => {
            let (url, direct_path, media_key, file_sha256, file_enc_sha256, file_length) = common();
            wa::Message {
                document_message: Some(Box::new(wa::message::DocumentMessage {
                    url,
                    direct_path,
                    media_key,
                    file_sha256,
                    file_enc_sha256,
                    file_length,
                    mimetype: Some(mime.to_string()),
                    file_name: filename.map(str::to_string),
                    caption,
                    ..Default::default()
                })),
                ..Default::default()
            }
        }
        MediaKind::Sticker | MediaKind::Location => return None,
    })
}

#[async_trait]
impl ChannelSession for WhatsAppSession {
    async fn connect(&self) -> Result<(), ChannelError> {
        if self.status() == ChannelStatus::Connected {
            return Err(ChannelError::AlreadyConnected);
        }

        self.set_status(ChannelStatus::Connecting);

        let inbox_id = self.inbox_id;
        let sink = self.sink.clone();
        let store = self.store.clone();
        let media_dir = self.media_dir.clone();
        let session = self
            .self_weak
            .lock()
            .unwrap()
            .as_ref()
            .and_then(std::sync::Weak::upgrade)
            .expect("self_weak set in WhatsAppSession::new");

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
        *self.shutdown.lock().await = Some(shutdown_tx);

        let client_cell_for_task = self.client.clone();
        let event_session = session.clone();
        let task = tokio::spawn(async move {
            let build_result = Bot::builder()
                .with_backend(store)
                .with_transport_factory(TokioWebSocketTransportFactory::new())
                .with_http_client(UreqHttpClient::new())
                .on_event(move |event, client| {
                    let session = event_session.clone();
                    let media_dir = media_dir.clone();
                    async move {
                        handle_provider_event(&session, event, client, &media_dir).await;
                    }
                })
                .build()
                .await;

            let mut bot = match build_result {
                Ok(bot) => bot,
                Err(e) => {
                    tracing::error!(inbox_id = %inbox_id, error = %e, "failed to build whatsapp bot");
                    sink.handle(inbox_id, ChannelEvent::Disconnected).await;
                    return;
                }
            };

            let (cs_tx, mut cs_rx) = tokio::sync::mpsc::unbounded_channel::<ChatStateEvent>();
            bot.client()
                .register_chatstate_handler(Arc::new(move |event: ChatStateEvent| {
                    let _ = cs_tx.send(event);
                }))
                .await;
            tokio::spawn(async move { while cs_rx.recv().await.is_some() {} });

            let handle = match bot.run().await {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::error!(inbox_id = %inbox_id, error = %e, "whatsapp bot failed to start");
                    sink.handle(inbox_id, ChannelEvent::Disconnected).await;
                    return;
                }
            };
            let _ = client_cell_for_task.set(bot.client().clone());

            // keep-alive: block here until told to tear down. Disconnect()
            // must return within 1s of signalling (§5 Cancellation).
            tokio::select! {
                _ = shutdown_rx => {
                    drop(handle);
                    tracing::info!(inbox_id = %inbox_id, "whatsapp session disconnected by operator");
                }
            }
        });

        *self.task.lock().await = Some(task);
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.lock().await.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(1), task).await;
        }
        self.set_status(ChannelStatus::Disconnected);
        self.set_qr(None);
    }

    async fn logout(&self) -> Result<(), ChannelError> {
        if let Some(client) = self.client.get() {
            client
                .logout()
                .await
                .map_err(|e| ChannelError::Provider(e.to_string()))?;
        }
        self.inner.lock().unwrap().identity = None;
        self.disconnect().await;
        Ok(())
    }

    async fn send_text(&self, target: &str, body: &str) -> Result<String, ChannelError> {
        if self.status() != ChannelStatus::Connected {
            return Err(ChannelError::NotConnected);
        }
        let client = self.client.get().ok_or(ChannelError::NotConnected)?;

        let jid = resolve_jid(target)?;
        let msg = wa::Message {
            conversation: Some(body.to_string()),
            ..Default::default()
        };
        client
            .send_message(jid, msg)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn send_media(&self, target: &str, media: OutboundMedia) -> Result<String, ChannelError> {
        if self.status() != ChannelStatus::Connected {
            return Err(ChannelError::NotConnected);
        }
        let client = self.client.get().ok_or(ChannelError::NotConnected)?;
        let jid = resolve_jid(target)?;

        let media_type = media_type_from_kind(media.kind)
            .ok_or_else(|| ChannelError::UnsupportedKind(format!("{:?}", media.kind)))?;

        let upload = client
            .upload(media.bytes, media_type)
            .await
            .map_err(|e| ChannelError::UploadFailed(e.to_string()))?;

        let msg = build_media_message(
            media.kind,
            &upload,
            &media.mime,
            media.filename.as_deref(),
            media.caption,
        )
        .ok_or_else(|| ChannelError::UnsupportedKind(format!("{:?}", media.kind)))?;

        client
            .send_message(jid, msg)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    fn status(&self) -> ChannelStatus {
        self.inner.lock().unwrap().status
    }

    fn qr_image(&self) -> Option<String> {
        self.inner.lock().unwrap().qr_image.clone()
    }

    fn identity(&self) -> Option<String> {
        self.inner.lock().unwrap().identity.clone()
    }

    fn phone(&self) -> Option<String> {
        self.inner.lock().unwrap().phone.clone()
    }
}

fn resolve_jid(target: &str) -> Result<Jid, ChannelError> {
    let raw = if is_provider_identifier(target) {
        target.to_string()
    } else {
        format!("{}@s.whatsapp.net", target.trim_start_matches('+'))
    };
    raw.parse::<Jid>()
        .map_err(|e| ChannelError::SendFailed(format!("invalid jid {raw}: {e}")))
}

fn should_process_inbound_message(chat_id: &str, is_from_me: bool) -> bool {
    if is_from_me {
        return false;
    }
    !chat_id.eq_ignore_ascii_case("status@broadcast")
}

async fn download_media(
    client: &Arc<whatsapp_rust::Client>,
    media: &dyn wacore::download::Downloadable,
    path: &str,
) -> Option<Vec<u8>> {
    let mut buf = std::io::Cursor::new(Vec::new());
    if let Err(e) = client.download_to_file(media, &mut buf).await {
        tracing::error!(path, error = %e, "failed to download media");
        return None;
    }
    Some(buf.into_inner())
}

async fn extract_media(
    client: &Arc<whatsapp_rust::Client>,
    msg: &wa::Message,
    msg_id: &str,
    media_dir: &str,
) -> Option<IncomingMedia> {
    let base = msg.get_base_message();

    if let Some(img) = &base.image_message {
        let mime = img.mimetype.clone().unwrap_or_else(|| "image/jpeg".into());
        let path = format!("{media_dir}/{msg_id}.jpg");
        return download_media(client, img.as_ref(), &path).await.map(|bytes| IncomingMedia {
            kind: MediaKind::Image,
            bytes,
            mime,
            filename: Some(format!("{msg_id}.jpg")),
        });
    }
    if let Some(vid) = &base.video_message {
        let mime = vid.mimetype.clone().unwrap_or_else(|| "video/mp4".into());
        let path = format!("{media_dir}/{msg_id}.mp4");
        return download_media(client, vid.as_ref(), &path).await.map(|bytes| IncomingMedia {
            kind: MediaKind::Video,
            bytes,
            mime,
            filename: Some(format!("{msg_id}.mp4")),
        });
    }
    if let Some(aud) = &base.audio_message {
        let mime = aud.mimetype.clone().unwrap_or_else(|| "audio/ogg".into());
        let path = format!("{media_dir}/{msg_id}.ogg");
        return download_media(client, aud.as_ref(), &path).await.map(|bytes| IncomingMedia {
            kind: MediaKind::Audio,
            bytes,
            mime,
            filename: Some(format!("{msg_id}.ogg")),
        });
    }
    if let Some(doc) = &base.document_message {
        let mime = doc
            .mimetype
            .clone()
            .unwrap_or_else(|| "application/octet-stream".into());
        let ext = mime.split('/').next_back().unwrap_or("bin");
        let path = format!("{media_dir}/{msg_id}.{ext}");
        let filename = doc.file_name.clone().unwrap_or_else(|| format!("{msg_id}.{ext}"));
        return download_media(client, doc.as_ref(), &path).await.map(|bytes| IncomingMedia {
            kind: MediaKind::Document,
            bytes,
            mime,
            filename: Some(filename),
        });
    }
    None
}

/// Resolves the provider's stored full name, business name, push name, or
/// finally a phone-derived display, in that order (§4.1 "Contact-name
/// resolution"). `whatsapp_rust`'s message info carries whichever of these
/// the provider's contact cache had available.
fn resolve_display_name(push_name: Option<&str>, sender: &str) -> String {
    push_name
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| super::phone_from_source_id(sender))
}

async fn handle_provider_event(
    session: &Arc<WhatsAppSession>,
    event: Event,
    client: Arc<whatsapp_rust::Client>,
    media_dir: &str,
) {
    let inbox_id = session.inbox_id;
    let sink = &session.sink;
    match event {
        Event::PairingQrCode { code, timeout } => {
            qr2term::print_qr(&code).ok();
            let data_url = render_qr_data_url(&code).unwrap_or_default();
            session.set_status(ChannelStatus::QrCode);
            session.set_qr(Some(data_url.clone()));
            sink.handle(
                inbox_id,
                ChannelEvent::QrCode {
                    code,
                    data_url,
                },
            )
            .await;

            // §4.1: a qr_code -> disconnected transition on timeout clears
            // the cached image, unless pairing already succeeded in the
            // meantime.
            let timeout_session = session.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if timeout_session.status() == ChannelStatus::QrCode {
                    timeout_session.set_status(ChannelStatus::Disconnected);
                    timeout_session.set_qr(None);
                    timeout_session.sink.handle(inbox_id, ChannelEvent::Disconnected).await;
                }
            });
        }
        Event::Connected(info) => {
            let phone = info.to_string();
            session.set_connected(phone.clone());
            // The store key assigned at construction (§2), not the phone
            // number, is what must be persisted and later fed back into
            // `SessionManager::connect` to reload this exact device.
            let identity = session
                .identity()
                .unwrap_or_else(|| phone.clone());
            sink.handle(
                inbox_id,
                ChannelEvent::Connected {
                    phone,
                    identity,
                },
            )
            .await;
        }
        Event::LoggedOut(_) => {
            session.set_status(ChannelStatus::Disconnected);
            session.set_qr(None);
            sink.handle(inbox_id, ChannelEvent::Disconnected).await;
        }
        Event::Message(msg, msg_info) => {
            let chat_id = msg_info.source.chat.to_string();
            if !should_process_inbound_message(&chat_id, msg_info.source.is_from_me) {
                return;
            }

            let sender_id = msg_info.source.sender.to_string();
            let text = msg.text_content().map(|s| s.to_string());
            let media = extract_media(&client, &msg, &msg_info.id, media_dir).await;
            let display_name = resolve_display_name(msg_info.push_name.as_deref(), &sender_id);

            sink.handle(
                inbox_id,
                ChannelEvent::Message {
                    source_id: msg_info.id.clone(),
                    contact_source_id: sender_id,
                    contact_display_name: display_name,
                    is_from_me: msg_info.source.is_from_me,
                    content: text,
                    media,
                    timestamp: chrono::Utc::now(),
                },
            )
            .await;

            let receipt_sender = msg_info.source.is_group.then(|| msg_info.source.sender.clone());
            if let Err(e) = client
                .mark_as_read(&msg_info.source.chat, receipt_sender.as_ref(), vec![msg_info.id])
                .await
            {
                tracing::warn!(error = %e, "failed to mark as read");
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_self_sent_messages() {
        assert!(!should_process_inbound_message("25491067@s.whatsapp.net", true));
    }

    #[test]
    fn skips_status_broadcast_messages() {
        assert!(!should_process_inbound_message("status@broadcast", false));
        assert!(!should_process_inbound_message("STATUS@BROADCAST", false));
    }

    #[test]
    fn processes_normal_inbound_messages() {
        assert!(should_process_inbound_message("25491067@s.whatsapp.net", false));
    }

    #[test]
    fn falls_back_to_phone_derived_display_name_when_push_name_empty() {
        assert_eq!(
            resolve_display_name(None, "5511988887777@s.whatsapp.net"),
            "+5511988887777"
        );
        assert_eq!(resolve_display_name(Some(""), "5511988887777"), "+5511988887777");
    }

    #[test]
    fn uses_push_name_when_present() {
        assert_eq!(resolve_display_name(Some("Alice"), "5511988887777"), "Alice");
    }
}
