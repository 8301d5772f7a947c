//! Ports to the wiki: page storage and the discovery/sampling queries.
//!
//! The engine only talks to these traits. `vic-mediawiki` implements them over
//! the MediaWiki Action API; [`crate::MemoryStore`] and [`crate::MemoryQuery`]
//! implement them in memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("page does not exist: {0}")]
    Missing(String),

    #[error("page is protected: {0}")]
    Locked(String),

    #[error("edit conflict on {0}")]
    EditConflict(String),

    #[error("edit to {title} was blocked: {reason}")]
    Blocked { title: String, reason: String },

    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl StoreError {
    /// Failures that may succeed when the same request is repeated later
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::EditConflict(_) | Self::Transport(_))
    }

    /// The store accepted the request but refused to write the page
    #[must_use]
    pub const fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::Locked(_) | Self::EditConflict(_) | Self::Blocked { .. }
        )
    }
}

/// Titled page storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn exists(&self, title: &str) -> StoreResult<bool>;

    /// Current text of `title`; [`StoreError::Missing`] when the page does not exist
    async fn fetch(&self, title: &str, resolve_redirect: bool) -> StoreResult<String>;

    /// Replace the text of `title`, creating the page when needed
    async fn save(&self, title: &str, text: &str, summary: &str) -> StoreResult<()>;

    /// Like [`DocumentStore::fetch`], with a missing page mapped to `None`
    async fn fetch_optional(
        &self,
        title: &str,
        resolve_redirect: bool,
    ) -> StoreResult<Option<String>> {
        match self.fetch(title, resolve_redirect).await {
            Ok(text) => Ok(Some(text)),
            Err(StoreError::Missing(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

/// A recently edited page with its category tags (without namespace prefix)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentPage {
    pub title: String,
    pub tags: BTreeSet<String>,
}

impl RecentPage {
    pub fn new<I, T>(title: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            title: title.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Read-only queries over the wiki
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Up to `n` random titles of already-promoted files (without namespace)
    async fn sample_random(&self, n: usize) -> StoreResult<Vec<String>>;

    /// Pages under `prefix` edited within the last `within_days` days
    async fn recently_edited(&self, prefix: &str, within_days: u32) -> StoreResult<Vec<RecentPage>>;
}

/// Store wrapper that reads through and logs writes instead of performing them
#[derive(Debug)]
pub struct DryRunStore<S> {
    inner: S,
}

impl<S> DryRunStore<S> {
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for DryRunStore<S> {
    async fn exists(&self, title: &str) -> StoreResult<bool> {
        self.inner.exists(title).await
    }

    async fn fetch(&self, title: &str, resolve_redirect: bool) -> StoreResult<String> {
        self.inner.fetch(title, resolve_redirect).await
    }

    async fn save(&self, title: &str, text: &str, summary: &str) -> StoreResult<()> {
        log::info!(
            "[dry-run] would save [[{title}]] ({} bytes): {summary}",
            text.len()
        );
        Ok(())
    }
}
