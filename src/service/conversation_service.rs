//! Conversation Service (§4.6): thin orchestration over the repositories,
//! composing repository reads into response shapes without holding any
//! state of its own.

use crate::error::RepoError;
use crate::repo::{conversation_repo, label_repo, message_repo};
use crate::schema::{Contact, Conversation, ConversationStatus, ConversationWithDetails, Inbox};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn toggle_status(db: &PgPool, id: Uuid) -> Result<Conversation, RepoError> {
    let conversation = conversation_repo::get(db, id).await?;
    let next = match conversation.status {
        ConversationStatus::Resolved => ConversationStatus::Open,
        _ => ConversationStatus::Resolved,
    };
    conversation_repo::set_status(db, id, next).await?;
    conversation_repo::get(db, id).await
}

pub async fn assign(db: &PgPool, id: Uuid, assignee_id: Option<Uuid>) -> Result<Conversation, RepoError> {
    conversation_repo::set_assignee(db, id, assignee_id).await?;
    conversation_repo::get(db, id).await
}

pub async fn mark_as_read(db: &PgPool, id: Uuid) -> Result<Conversation, RepoError> {
    conversation_repo::mark_as_read(db, id).await?;
    conversation_repo::get(db, id).await
}

pub async fn set_favorite(db: &PgPool, id: Uuid, favorite: bool) -> Result<Conversation, RepoError> {
    conversation_repo::set_favorite(db, id, favorite).await?;
    conversation_repo::get(db, id).await
}

pub async fn set_archived(db: &PgPool, id: Uuid, archived: bool) -> Result<Conversation, RepoError> {
    conversation_repo::set_archived(db, id, archived).await?;
    conversation_repo::get(db, id).await
}

pub async fn add_label(db: &PgPool, id: Uuid, label_id: Uuid) -> Result<(), RepoError> {
    label_repo::add_label(db, id, label_id).await
}

pub async fn remove_label(db: &PgPool, id: Uuid, label_id: Uuid) -> Result<(), RepoError> {
    label_repo::remove_label(db, id, label_id).await
}

/// Joins Contact, Inbox, and the last Message for the detail view (§4.6 `GetWithDetails`).
pub async fn get_with_details(db: &PgPool, id: Uuid) -> Result<ConversationWithDetails, RepoError> {
    let conversation = conversation_repo::get(db, id).await?;
    let contact: Contact = crate::repo::contact_repo::get(db, conversation.contact_id).await?;
    let inbox: Inbox = crate::repo::inbox_repo::get(db, conversation.inbox_id).await?;
    let last_message = message_repo::last_for_conversation(db, conversation.id).await?;

    Ok(ConversationWithDetails {
        conversation,
        contact,
        inbox,
        last_message,
    })
}
