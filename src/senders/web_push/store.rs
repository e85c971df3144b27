//! Subscription repositories for the Web Push sender.
//!
//! - [`InMemoryStore`]: lost on restart, VAPID keys regenerated every run;
//! - [`FileStore`]: one JSON document holding the VAPID keys and every
//!   subscription, rewritten on each change.

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use super::VapidKeys;

/// Browser push subscription, as produced by `PushManager.subscribe()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("subscription file i/o: {0}")]
    Io(#[from] io::Error),

    #[error("subscription file is corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to generate VAPID keys: {0}")]
    Keys(String),
}

/// Persistence of subscriptions, keyed by endpoint.
#[async_trait]
pub trait SubscriptionStore: Send + Sync + 'static {
    async fn load_all(&self) -> Result<Vec<Subscription>, StoreError>;

    /// Inserts or replaces the subscription with the same endpoint.
    async fn store(&self, subscription: Subscription) -> Result<(), StoreError>;

    /// Removes the subscription with `endpoint`; absent endpoints are ignored.
    async fn delete(&self, endpoint: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    subscriptions: RwLock<BTreeMap<String, Subscription>>,
}

#[async_trait]
impl SubscriptionStore for InMemoryStore {
    async fn load_all(&self) -> Result<Vec<Subscription>, StoreError> {
        Ok(self.subscriptions.read().await.values().cloned().collect())
    }

    async fn store(&self, subscription: Subscription) -> Result<(), StoreError> {
        self.subscriptions
            .write()
            .await
            .insert(subscription.endpoint.clone(), subscription);
        Ok(())
    }

    async fn delete(&self, endpoint: &str) -> Result<(), StoreError> {
        self.subscriptions.write().await.remove(endpoint);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vapid: Option<VapidKeys>,
    #[serde(default)]
    subscriptions: Vec<Subscription>,
}

/// JSON file repository.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    doc: RwLock<Document>,
}

impl FileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Document::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    /// Keys persisted by a previous run, or fresh ones written to the file.
    pub fn vapid_keys(&mut self) -> Result<VapidKeys, StoreError> {
        let doc = self.doc.get_mut();
        if let Some(keys) = &doc.vapid {
            return Ok(keys.clone());
        }
        let keys = VapidKeys::generate().map_err(|err| StoreError::Keys(err.to_string()))?;
        doc.vapid = Some(keys.clone());
        std::fs::write(&self.path, serde_json::to_vec_pretty(doc)?)?;
        tracing::info!(path = %self.path.display(), "generated VAPID keys");
        Ok(keys)
    }

    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(doc)?).await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for FileStore {
    async fn load_all(&self) -> Result<Vec<Subscription>, StoreError> {
        Ok(self.doc.read().await.subscriptions.clone())
    }

    async fn store(&self, subscription: Subscription) -> Result<(), StoreError> {
        let mut doc = self.doc.write().await;
        doc.subscriptions
            .retain(|s| s.endpoint != subscription.endpoint);
        doc.subscriptions.push(subscription);
        self.save(&doc).await
    }

    async fn delete(&self, endpoint: &str) -> Result<(), StoreError> {
        let mut doc = self.doc.write().await;
        let before = doc.subscriptions.len();
        doc.subscriptions.retain(|s| s.endpoint != endpoint);
        if doc.subscriptions.len() == before {
            return Ok(());
        }
        self.save(&doc).await
    }
}
