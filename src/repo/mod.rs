//! Thin accessors (§4.5), each a `sqlx::query`/`sqlx::query_as` call against
//! `&PgPool`. The Event Pipeline's inbound-message write (§4.3 steps 2-8) is
//! not wrapped in a database transaction; it relies on the ordering
//! guarantee instead (Contact -> ContactInbox -> Conversation -> Message, so
//! every referent exists before its dependent insert) and on find-or-create
//! idempotency at each step. None of these repos know about each other —
//! composition happens one level up, in `crate::service` and `crate::pipeline`.

pub mod attachment_repo;
pub mod channel_config_repo;
pub mod contact_inbox_repo;
pub mod contact_repo;
pub mod conversation_repo;
pub mod event_repo;
pub mod inbox_repo;
pub mod label_repo;
pub mod message_repo;

pub use conversation_repo::ConversationFilter;
