//! Conversation and message endpoints (§6.1 `/conversations*`). Pure
//! orchestration over [`crate::service::conversation_service`] and
//! [`crate::pipeline::EventPipeline`]: no business logic lives here, only
//! input shaping.

use crate::pipeline::SendMessageRequest;
use crate::repo::{ConversationFilter, message_repo};
use crate::schema::{Conversation, ConversationStatus, ConversationWithDetails, Message};
use crate::service::conversation_service;
use crate::state::app_state;
use forge::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListConversationsInput {
    pub inbox_id: Option<Uuid>,
    pub status: Option<ConversationStatus>,
    pub assignee_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub favorite: Option<bool>,
    pub archived: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[forge::query(public)]
pub async fn list_conversations(
    ctx: &QueryContext,
    input: ListConversationsInput,
) -> Result<Vec<Conversation>> {
    let filter = ConversationFilter {
        inbox_id: input.inbox_id,
        status: input.status,
        assignee_id: input.assignee_id,
        contact_id: input.contact_id,
        favorite: input.favorite,
        archived: input.archived,
        limit: input.limit,
        offset: input.offset,
    };
    crate::repo::conversation_repo::list(ctx.db(), filter)
        .await
        .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct GetConversationInput {
    pub conversation_id: Uuid,
}

#[forge::query(public)]
pub async fn get_conversation(
    ctx: &QueryContext,
    input: GetConversationInput,
) -> Result<ConversationWithDetails> {
    conversation_service::get_with_details(ctx.db(), input.conversation_id)
        .await
        .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct UpdateConversationInput {
    pub conversation_id: Uuid,
    pub status: Option<ConversationStatus>,
    pub priority: Option<i32>,
    pub assignee_id: Option<Uuid>,
    pub favorite: Option<bool>,
    pub archived: Option<bool>,
}

/// Partial update (§6.1 `PUT /conversations/:id`): every field is optional
/// and applied independently, in the order listed, so a caller can set just
/// `{priority}` without touching assignment or flags.
#[forge::mutation(public)]
pub async fn update_conversation(
    ctx: &MutationContext,
    input: UpdateConversationInput,
) -> Result<Conversation> {
    let db = ctx.db();
    if let Some(status) = input.status {
        crate::repo::conversation_repo::set_status(db, input.conversation_id, status).await?;
    }
    if let Some(priority) = input.priority {
        crate::repo::conversation_repo::set_priority(db, input.conversation_id, priority).await?;
    }
    if input.assignee_id.is_some() {
        crate::repo::conversation_repo::set_assignee(db, input.conversation_id, input.assignee_id)
            .await?;
    }
    if let Some(favorite) = input.favorite {
        crate::repo::conversation_repo::set_favorite(db, input.conversation_id, favorite).await?;
    }
    if let Some(archived) = input.archived {
        crate::repo::conversation_repo::set_archived(db, input.conversation_id, archived).await?;
    }
    crate::repo::conversation_repo::get(db, input.conversation_id)
        .await
        .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct ConversationIdInput {
    pub conversation_id: Uuid,
}

#[forge::mutation(public)]
pub async fn mark_conversation_read(
    ctx: &MutationContext,
    input: ConversationIdInput,
) -> Result<Conversation> {
    conversation_service::mark_as_read(ctx.db(), input.conversation_id)
        .await
        .map_err(Into::into)
}

/// Swaps between `open` and `resolved` (§4.6 `ToggleStatus`), the way a
/// "resolve"/"reopen" UI control would without the caller naming a target
/// status the way `PUT /conversations/:id` does.
#[forge::mutation(public)]
pub async fn toggle_conversation_status(
    ctx: &MutationContext,
    input: ConversationIdInput,
) -> Result<Conversation> {
    conversation_service::toggle_status(ctx.db(), input.conversation_id)
        .await
        .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct ToggleConversationFlagInput {
    pub conversation_id: Uuid,
    pub value: bool,
}

#[forge::mutation(public)]
pub async fn set_conversation_favorite(
    ctx: &MutationContext,
    input: ToggleConversationFlagInput,
) -> Result<Conversation> {
    conversation_service::set_favorite(ctx.db(), input.conversation_id, input.value)
        .await
        .map_err(Into::into)
}

#[forge::mutation(public)]
pub async fn set_conversation_archived(
    ctx: &MutationContext,
    input: ToggleConversationFlagInput,
) -> Result<Conversation> {
    conversation_service::set_archived(ctx.db(), input.conversation_id, input.value)
        .await
        .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct AssignConversationInput {
    pub conversation_id: Uuid,
    pub assignee_id: Option<Uuid>,
}

#[forge::mutation(public)]
pub async fn assign_conversation(
    ctx: &MutationContext,
    input: AssignConversationInput,
) -> Result<Conversation> {
    conversation_service::assign(ctx.db(), input.conversation_id, input.assignee_id)
        .await
        .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct ListConversationMessagesInput {
    pub conversation_id: Uuid,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paged, newest first, default limit 50 (§6.1 `GET /conversations/:id/messages`).
#[forge::query(public)]
pub async fn list_conversation_messages(
    ctx: &QueryContext,
    input: ListConversationMessagesInput,
) -> Result<Vec<Message>> {
    message_repo::list_by_conversation(
        ctx.db(),
        input.conversation_id,
        input.limit.unwrap_or(50),
        input.offset.unwrap_or(0),
    )
    .await
    .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct SendConversationMessageInput {
    pub conversation_id: Uuid,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendConversationMessageOutput {
    pub message: Message,
}

/// Text-only send (§6.1 "Send text (media variant via multipart)" — media
/// uploads arrive through forge's multipart handling, out of scope here, and
/// are translated into the same [`SendMessageRequest`] before reaching
/// [`crate::pipeline::EventPipeline::send_message`]).
#[forge::mutation(public)]
pub async fn send_conversation_message(
    ctx: &MutationContext,
    input: SendConversationMessageInput,
) -> Result<SendConversationMessageOutput> {
    let sender_id = ctx
        .user_id()
        .ok_or_else(|| ForgeError::Unauthorized("operator identity required to send".into()))?;

    let state = app_state();
    let message = state
        .pipeline
        .send_message(
            input.conversation_id,
            SendMessageRequest {
                content: input.content,
                media: None,
            },
            sender_id,
        )
        .await?;

    Ok(SendConversationMessageOutput { message })
}
