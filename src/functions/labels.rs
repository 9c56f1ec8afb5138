//! Label endpoints (§3 `Label`/`ConversationLabel`, §4.6 `AddLabel/RemoveLabel`).
//! Labels are global, idempotent attach/detach on the junction table.

use crate::repo::label_repo;
use crate::schema::Label;
use crate::service::conversation_service;
use forge::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListLabelsInput {}

#[forge::query(public)]
pub async fn list_labels(ctx: &QueryContext, _input: ListLabelsInput) -> Result<Vec<Label>> {
    label_repo::list(ctx.db()).await.map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct CreateLabelInput {
    pub title: String,
    pub color: String,
}

#[forge::mutation(public)]
pub async fn create_label(ctx: &MutationContext, input: CreateLabelInput) -> Result<Label> {
    if input.title.trim().is_empty() {
        return Err(ForgeError::Validation("label title must not be empty".into()));
    }
    label_repo::create(ctx.db(), &input.title, &input.color)
        .await
        .map_err(Into::into)
}

#[derive(Debug, Deserialize)]
pub struct ConversationLabelInput {
    pub conversation_id: Uuid,
    pub label_id: Uuid,
}

#[derive(Debug, serde::Serialize)]
pub struct ConversationLabelOutput {
    pub ok: bool,
}

#[forge::mutation(public)]
pub async fn add_conversation_label(
    ctx: &MutationContext,
    input: ConversationLabelInput,
) -> Result<ConversationLabelOutput> {
    conversation_service::add_label(ctx.db(), input.conversation_id, input.label_id).await?;
    Ok(ConversationLabelOutput { ok: true })
}

#[forge::mutation(public)]
pub async fn remove_conversation_label(
    ctx: &MutationContext,
    input: ConversationLabelInput,
) -> Result<ConversationLabelOutput> {
    conversation_service::remove_label(ctx.db(), input.conversation_id, input.label_id).await?;
    Ok(ConversationLabelOutput { ok: true })
}
