use forge::prelude::ForgeError;

/// Errors raised by a [`crate::channel::ChannelSession`]. Surfaced verbatim
/// to callers so the Manager and Event Pipeline can branch on the exact
/// failure kind per §4.1/§7; never retried automatically by the core.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel session for this inbox is not connected")]
    NotConnected,
    #[error("an attempt to connect an already-connected inbox")]
    AlreadyConnected,
    #[error("no channel session registered for this inbox")]
    NotFound,
    #[error("unsupported attachment or channel kind: {0}")]
    UnsupportedKind(String),
    #[error("media upload failed: {0}")]
    UploadFailed(String),
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("provider error: {0}")]
    Provider(String),
}

/// Errors raised inside the Event Pipeline (§4.3).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(uuid::Uuid),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Errors raised by a repository (§4.5). `NotFound` and `Conflict` are
/// expected, caller-actionable outcomes, not programming errors.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("entity not found")]
    NotFound,
    #[error("uniqueness conflict, caller should refetch: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ChannelError> for ForgeError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::NotConnected
            | ChannelError::AlreadyConnected
            | ChannelError::NotFound => ForgeError::Validation(err.to_string()),
            ChannelError::UnsupportedKind(_) => ForgeError::Validation(err.to_string()),
            ChannelError::UploadFailed(_) | ChannelError::SendFailed(_) | ChannelError::Provider(_) => {
                ForgeError::Internal(err.to_string())
            }
        }
    }
}

impl From<RepoError> for ForgeError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ForgeError::NotFound(err.to_string()),
            RepoError::Conflict(msg) => ForgeError::Validation(msg),
            RepoError::Database(e) => ForgeError::Database(e.to_string()),
        }
    }
}

impl From<PipelineError> for ForgeError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::ConversationNotFound(id) => {
                ForgeError::NotFound(format!("conversation {id} not found"))
            }
            PipelineError::Channel(e) => e.into(),
            PipelineError::Repo(e) => e.into(),
        }
    }
}
