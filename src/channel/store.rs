//! Session Store (§2.1): persisted, provider-specific device/session material.
//! Opaque to the rest of the core; the Manager only ever asks it to load an
//! existing device by identity or mint a new one before pairing.
//!
//! Each identity gets its own `whatsapp_rust::store::SqliteStore` backend
//! file, since many inboxes can be paired concurrently.

use anyhow::Context;
use std::sync::Arc;
use whatsapp_rust::store::SqliteStore;

pub struct SessionStore {
    base_path: String,
}

impl SessionStore {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for(&self, identity: &str) -> String {
        format!("{}/{}.db", self.base_path, identity)
    }

    /// Loads the device backing an already-paired identity.
    pub async fn load(&self, identity: &str) -> anyhow::Result<Arc<SqliteStore>> {
        let store = SqliteStore::new(&self.path_for(identity))
            .await
            .with_context(|| format!("failed to load whatsapp device store for {identity}"))?;
        Ok(Arc::new(store))
    }

    /// Mints a fresh, unpaired device. The caller is responsible for
    /// persisting the identity once `OnConnected` reports it (§4.3 routing).
    pub async fn new_device(&self) -> anyhow::Result<(String, Arc<SqliteStore>)> {
        let identity = uuid::Uuid::new_v4().to_string();
        let store = SqliteStore::new(&self.path_for(&identity))
            .await
            .context("failed to create new whatsapp device store")?;
        Ok((identity, Arc::new(store)))
    }

    pub async fn all(&self) -> anyhow::Result<Vec<String>> {
        let mut identities = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str()
                && let Some(identity) = name.strip_suffix(".db")
            {
                identities.push(identity.to_string());
            }
        }
        Ok(identities)
    }
}
