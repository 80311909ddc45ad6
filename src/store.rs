//! Link store abstraction and the in-memory backend
//!
//! The store exclusively owns every [`ShortLink`]. All mutation goes through
//! [`LinkStore::put`] and [`LinkStore::resolve`], each atomic per code.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::LinkError;
use crate::model::ShortLink;

/// Durable mapping from short code to [`ShortLink`]
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    /// Inserts a new record with `visit_count = 0`.
    ///
    /// Fails with [`LinkError::CodeConflict`] if any record, expired or not, already
    /// holds `code`.
    async fn put(
        &self,
        code: &str,
        target_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink, LinkError>;

    /// Returns the active record for `code` without touching its visit count.
    async fn get(&self, code: &str) -> Result<ShortLink, LinkError>;

    /// Returns the target URL of an active record and counts the visit.
    async fn resolve(&self, code: &str) -> Result<String, LinkError>;

    /// True if any record occupies `code`, including expired ones.
    async fn exists(&self, code: &str) -> Result<bool, LinkError>;
}

/// Builds a fresh record, enforcing `expires_at > created_at`
pub(crate) fn new_record(
    code: &str,
    target_url: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<ShortLink, LinkError> {
    let created_at = Utc::now();
    if let Some(expires_at) = expires_at {
        if expires_at <= created_at {
            return Err(LinkError::InvalidInput(
                "expiration must be after creation time".to_string(),
            ));
        }
    }

    Ok(ShortLink {
        code: code.to_string(),
        target_url: target_url.to_string(),
        created_at,
        expires_at,
        visit_count: 0,
    })
}

/// Process-local store backed by a `HashMap`
///
/// A single `RwLock` guards the map, which makes every operation linearizable.
#[derive(Default)]
pub struct MemoryStore {
    links: RwLock<HashMap<String, ShortLink>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, expired ones included
    pub async fn len(&self) -> usize {
        self.links.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.links.read().await.is_empty()
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn put(
        &self,
        code: &str,
        target_url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink, LinkError> {
        let record = new_record(code, target_url, expires_at)?;

        let mut links = self.links.write().await;
        if links.contains_key(code) {
            return Err(LinkError::CodeConflict(code.to_string()));
        }
        links.insert(code.to_string(), record.clone());

        Ok(record)
    }

    async fn get(&self, code: &str) -> Result<ShortLink, LinkError> {
        let links = self.links.read().await;
        links
            .get(code)
            .filter(|link| link.is_active_at(Utc::now()))
            .cloned()
            .ok_or_else(|| LinkError::NotFound(code.to_string()))
    }

    async fn resolve(&self, code: &str) -> Result<String, LinkError> {
        let mut links = self.links.write().await;
        match links.get_mut(code) {
            Some(link) if link.is_active_at(Utc::now()) => {
                link.visit_count += 1;
                Ok(link.target_url.clone())
            }
            _ => Err(LinkError::NotFound(code.to_string())),
        }
    }

    async fn exists(&self, code: &str) -> Result<bool, LinkError> {
        Ok(self.links.read().await.contains_key(code))
    }
}
