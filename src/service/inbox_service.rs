//! Inbox Service: the operator-facing half of inbox lifecycle management.
//! Delegates connection state entirely to the [`crate::channel::manager::SessionManager`];
//! this service only ever touches the persisted `Inbox`/`WhatsappChannelConfig`
//! rows, mirroring the separation the design notes (§9) require between the
//! Manager and everything that calls it.

use crate::channel::manager::SessionManager;
use crate::error::{ChannelError, RepoError};
use crate::repo::{channel_config_repo, inbox_repo};
use crate::schema::{ChannelKind, Inbox};
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_whatsapp_inbox(
    db: &sqlx::PgPool,
    name: &str,
    greeting_text: Option<&str>,
    auto_assign: bool,
) -> Result<Inbox, RepoError> {
    let config = channel_config_repo::create_whatsapp(db).await?;
    inbox_repo::create(db, name, ChannelKind::Whatsapp, config.id, greeting_text, auto_assign).await
}

pub async fn delete_inbox(
    db: &sqlx::PgPool,
    manager: &SessionManager,
    id: Uuid,
) -> Result<(), RepoError> {
    manager.remove(id).await;
    inbox_repo::delete(db, id).await
}

pub async fn connect(
    db: &sqlx::PgPool,
    manager: &SessionManager,
    id: Uuid,
) -> Result<(), ChannelError> {
    let inbox = inbox_repo::get(db, id)
        .await
        .map_err(|_| ChannelError::NotFound)?;
    let config = channel_config_repo::get(db, inbox.channel_config_id)
        .await
        .map_err(|_| ChannelError::NotFound)?;
    manager.connect(id, inbox.channel_kind, config.identity).await
}

pub async fn disconnect(manager: &SessionManager, id: Uuid) -> Result<(), ChannelError> {
    manager.disconnect(id).await
}

/// Every inbox with a persisted identity, for [`SessionManager::restore_connections`]
/// at startup (§5 "Startup restore"). Inboxes that never completed pairing
/// are skipped by the manager itself once `identity` comes back `None`.
pub async fn list_for_restore(
    db: &sqlx::PgPool,
) -> Result<Vec<(Uuid, ChannelKind, Option<String>)>, RepoError> {
    let inboxes = inbox_repo::list(db).await?;
    let mut out = Vec::with_capacity(inboxes.len());
    for inbox in inboxes {
        let identity = match inbox.channel_kind {
            ChannelKind::Whatsapp => channel_config_repo::get(db, inbox.channel_config_id)
                .await
                .map(|c| c.identity)
                .unwrap_or(None),
            _ => None,
        };
        out.push((inbox.id, inbox.channel_kind, identity));
    }
    Ok(out)
}

/// Current QR data URL and live status for polling clients (§6.1 `GET /inboxes/:id/qrcode`).
pub async fn qr_code(
    db: &sqlx::PgPool,
    manager: &Arc<SessionManager>,
    id: Uuid,
) -> Result<(Option<String>, crate::channel::ChannelStatus), RepoError> {
    let inbox = inbox_repo::get(db, id).await?;
    let status = manager.status(id).await;
    Ok((inbox.qr_code, status))
}
