use chrono::{DateTime, Utc};
use forge::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identity of a [`Contact`](super::Contact) as seen on one [`Inbox`](super::Inbox),
/// keyed by the external network's own id for that contact (`source_id`).
/// `(inbox_id, source_id)` is unique — enforced by a database constraint,
/// not by application logic, so concurrent first-contact races resolve cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[forge::model]
pub struct ContactInbox {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub inbox_id: Uuid,
    pub source_id: String,
    pub created_at: DateTime<Utc>,
}
