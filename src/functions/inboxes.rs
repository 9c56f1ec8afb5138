//! Inbox lifecycle endpoints (§6.1 `/inboxes*`). Thin glue between forge's
//! query/mutation boundary and [`crate::service::inbox_service`]; the
//! Manager and Hub are reached through [`crate::state::app_state`] since
//! forge's `ctx` only ever hands us the database pool.

use crate::channel::ChannelStatus;
use crate::repo::inbox_repo;
use crate::schema::{ChannelKind, Inbox, InboxStatus};
use crate::service::inbox_service;
use crate::state::app_state;
use forge::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `Inbox` with its status overridden by the live Channel Session, the way
/// §6.1 describes `GET /inboxes` ("list / fetch with live status from
/// Manager") — the persisted column is only a cache refreshed on transition.
#[derive(Debug, Clone, Serialize)]
pub struct InboxView {
    #[serde(flatten)]
    pub inbox: Inbox,
}

fn channel_status_to_inbox_status(status: ChannelStatus) -> InboxStatus {
    match status {
        ChannelStatus::Disconnected => InboxStatus::Disconnected,
        ChannelStatus::Connecting => InboxStatus::Connecting,
        ChannelStatus::QrCode => InboxStatus::QrCode,
        ChannelStatus::Connected => InboxStatus::Connected,
    }
}

async fn with_live_status(mut inbox: Inbox) -> InboxView {
    let state = app_state();
    if let Some(session) = state.manager.get(inbox.id).await {
        inbox.status = channel_status_to_inbox_status(session.status());
        inbox.qr_code = session.qr_image().or(inbox.qr_code);
    }
    InboxView { inbox }
}

#[derive(Debug, Deserialize)]
pub struct CreateInboxInput {
    pub name: String,
    pub channel_kind: ChannelKind,
    pub greeting_text: Option<String>,
    #[serde(default)]
    pub auto_assign: bool,
}

#[forge::mutation(public)]
pub async fn create_inbox(ctx: &MutationContext, input: CreateInboxInput) -> Result<Inbox> {
    if !matches!(input.channel_kind, ChannelKind::Whatsapp) {
        return Err(ForgeError::Validation(
            "only whatsapp-kind inboxes can be created today".into(),
        ));
    }
    if input.name.trim().is_empty() {
        return Err(ForgeError::Validation("name must not be empty".into()));
    }
    inbox_service::create_whatsapp_inbox(
        ctx.db(),
        &input.name,
        input.greeting_text.as_deref(),
        input.auto_assign,
    )
    .await
    .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct ListInboxesInput {}

#[forge::query(public)]
pub async fn list_inboxes(ctx: &QueryContext, _input: ListInboxesInput) -> Result<Vec<InboxView>> {
    let inboxes = inbox_repo::list(ctx.db()).await?;
    let mut views = Vec::with_capacity(inboxes.len());
    for inbox in inboxes {
        views.push(with_live_status(inbox).await);
    }
    Ok(views)
}

#[derive(Debug, Deserialize)]
pub struct GetInboxInput {
    pub inbox_id: Uuid,
}

#[forge::query(public)]
pub async fn get_inbox(ctx: &QueryContext, input: GetInboxInput) -> Result<InboxView> {
    let inbox = inbox_repo::get(ctx.db(), input.inbox_id).await?;
    Ok(with_live_status(inbox).await)
}

#[derive(Debug, Deserialize)]
pub struct DeleteInboxInput {
    pub inbox_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DeleteInboxOutput {
    pub deleted: bool,
}

/// Logs out (if still connected) and cascades the delete (§6.1 `DELETE /inboxes/:id`).
#[forge::mutation(public)]
pub async fn delete_inbox(ctx: &MutationContext, input: DeleteInboxInput) -> Result<DeleteInboxOutput> {
    let state = app_state();
    inbox_service::delete_inbox(ctx.db(), &state.manager, input.inbox_id).await?;
    Ok(DeleteInboxOutput { deleted: true })
}

#[derive(Debug, Deserialize)]
pub struct ConnectInboxInput {
    pub inbox_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ConnectInboxOutput {
    pub status: InboxStatus,
}

/// Non-blocking: the session is launched in a background task by the
/// Manager, so the endpoint returns as soon as `connect()` has been
/// dispatched (§6.1 "202-semantics").
#[forge::mutation(public)]
pub async fn connect_inbox(ctx: &MutationContext, input: ConnectInboxInput) -> Result<ConnectInboxOutput> {
    let state = app_state();
    inbox_service::connect(ctx.db(), &state.manager, input.inbox_id).await?;
    let status = channel_status_to_inbox_status(state.manager.status(input.inbox_id).await);
    Ok(ConnectInboxOutput { status })
}

#[derive(Debug, Deserialize)]
pub struct DisconnectInboxInput {
    pub inbox_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DisconnectInboxOutput {
    pub status: InboxStatus,
}

#[forge::mutation(public)]
pub async fn disconnect_inbox(
    _ctx: &MutationContext,
    input: DisconnectInboxInput,
) -> Result<DisconnectInboxOutput> {
    let state = app_state();
    inbox_service::disconnect(&state.manager, input.inbox_id).await?;
    Ok(DisconnectInboxOutput {
        status: InboxStatus::Disconnected,
    })
}

#[derive(Debug, Deserialize)]
pub struct InboxQrCodeInput {
    pub inbox_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct InboxQrCodeOutput {
    pub qr_code: Option<String>,
    pub status: InboxStatus,
}

/// Suitable for polling (§6.1 `GET /inboxes/:id/qrcode`): returns whichever
/// QR image the live session currently caches, falling back to the
/// persisted one if no session is registered.
#[forge::query(public)]
pub async fn inbox_qrcode(ctx: &QueryContext, input: InboxQrCodeInput) -> Result<InboxQrCodeOutput> {
    let state = app_state();
    let (persisted_qr, live_status) =
        crate::service::inbox_service::qr_code(ctx.db(), &state.manager, input.inbox_id)
            .await?;
    let qr_code = match state.manager.get(input.inbox_id).await {
        Some(session) => session.qr_image().or(persisted_qr),
        None => persisted_qr,
    };
    Ok(InboxQrCodeOutput {
        qr_code,
        status: channel_status_to_inbox_status(live_status),
    })
}
