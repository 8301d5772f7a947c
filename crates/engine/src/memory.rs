//! In-memory implementations of the ports, for offline runs and tests.

use crate::ports::{DocumentStore, QueryService, RecentPage, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use vic_wikitext::normalize_title;

/// One save accepted by a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEdit {
    pub title: String,
    pub text: String,
    pub summary: String,
}

/// Page map keyed by normalized title
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: Mutex<BTreeMap<String, String>>,
    saves: Mutex<Vec<SavedEdit>>,
    refusals: Mutex<HashMap<String, StoreError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(self, title: &str, text: &str) -> Self {
        self.insert(title, text);
        self
    }

    /// Make every save of `title` fail with `error`
    #[must_use]
    pub fn refusing(self, title: &str, error: StoreError) -> Self {
        lock(&self.refusals).insert(normalize_title(title), error);
        self
    }

    pub fn insert(&self, title: &str, text: &str) {
        lock(&self.pages).insert(normalize_title(title), text.to_string());
    }

    /// Current text of `title`, without redirect handling
    #[must_use]
    pub fn page(&self, title: &str) -> Option<String> {
        lock(&self.pages).get(&normalize_title(title)).cloned()
    }

    /// Saves accepted so far, in order
    #[must_use]
    pub fn saves(&self) -> Vec<SavedEdit> {
        lock(&self.saves).clone()
    }

    /// Saves of `title` accepted so far
    #[must_use]
    pub fn saves_of(&self, title: &str) -> usize {
        let key = normalize_title(title);
        lock(&self.saves)
            .iter()
            .filter(|edit| normalize_title(&edit.title) == key)
            .count()
    }
}

/// Target of a `#REDIRECT [[Target]]` page
fn redirect_target(text: &str) -> Option<&str> {
    let head = text.trim_start();
    if !head
        .get(..9)
        .is_some_and(|word| word.eq_ignore_ascii_case("#redirect"))
    {
        return None;
    }
    let open = head.find("[[")? + 2;
    let close = head[open..].find("]]")? + open;
    let target = head[open..close].split('|').next()?.trim();
    (!target.is_empty()).then_some(target)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn exists(&self, title: &str) -> StoreResult<bool> {
        Ok(lock(&self.pages).contains_key(&normalize_title(title)))
    }

    async fn fetch(&self, title: &str, resolve_redirect: bool) -> StoreResult<String> {
        let pages = lock(&self.pages);
        let text = pages
            .get(&normalize_title(title))
            .ok_or_else(|| StoreError::Missing(title.to_string()))?;

        if resolve_redirect {
            if let Some(target) = redirect_target(text) {
                return pages
                    .get(&normalize_title(target))
                    .cloned()
                    .ok_or_else(|| StoreError::Missing(target.to_string()));
            }
        }
        Ok(text.clone())
    }

    async fn save(&self, title: &str, text: &str, summary: &str) -> StoreResult<()> {
        let key = normalize_title(title);
        if let Some(err) = lock(&self.refusals).get(&key) {
            return Err(err.clone());
        }

        lock(&self.pages).insert(key, text.to_string());
        lock(&self.saves).push(SavedEdit {
            title: title.to_string(),
            text: text.to_string(),
            summary: summary.to_string(),
        });
        Ok(())
    }
}

/// Canned query answers
#[derive(Debug, Default)]
pub struct MemoryQuery {
    sample: Vec<String>,
    recent: Vec<RecentPage>,
    failure: Option<StoreError>,
}

impl MemoryQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sample<I, T>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.sample = titles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_recent(mut self, page: RecentPage) -> Self {
        self.recent.push(page);
        self
    }

    /// Make every query fail with `error`
    #[must_use]
    pub fn failing(mut self, error: StoreError) -> Self {
        self.failure = Some(error);
        self
    }

    fn check(&self) -> StoreResult<()> {
        self.failure.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl QueryService for MemoryQuery {
    async fn sample_random(&self, n: usize) -> StoreResult<Vec<String>> {
        self.check()?;
        Ok(self.sample.iter().take(n).cloned().collect())
    }

    async fn recently_edited(&self, prefix: &str, _within_days: u32) -> StoreResult<Vec<RecentPage>> {
        self.check()?;
        let prefix = normalize_title(prefix);
        Ok(self
            .recent
            .iter()
            .filter(|page| normalize_title(&page.title).starts_with(&prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_titles_compare_with_underscores() {
        let store = MemoryStore::new().with_page("User talk:Alice", "hi");
        assert!(store.exists("User_talk:Alice").await.unwrap());
        assert_eq!(store.fetch("User_talk:Alice", false).await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_redirects_followed_on_request() {
        let store = MemoryStore::new()
            .with_page("Birds", "#REDIRECT [[Aves]]")
            .with_page("Aves", "<gallery>\n</gallery>");
        assert_eq!(store.fetch("Birds", true).await.unwrap(), "<gallery>\n</gallery>");
        assert_eq!(store.fetch("Birds", false).await.unwrap(), "#REDIRECT [[Aves]]");
    }

    #[tokio::test]
    async fn test_refused_saves_leave_page_alone() {
        let store = MemoryStore::new()
            .with_page("Locked", "old")
            .refusing("Locked", StoreError::Locked("Locked".into()));
        let err = store.save("Locked", "new", "edit").await.unwrap_err();
        assert_eq!(err, StoreError::Locked("Locked".into()));
        assert_eq!(store.page("Locked").as_deref(), Some("old"));
        assert_eq!(store.saves_of("Locked"), 0);
    }

    #[tokio::test]
    async fn test_query_filters_by_prefix() {
        let query = MemoryQuery::new()
            .with_recent(RecentPage::new("Commons:Valued image candidates/A.jpg", ["x"]))
            .with_recent(RecentPage::new("Commons:Village pump", ["y"]));
        let pages = query
            .recently_edited("Commons:Valued_image_candidates/", 25)
            .await
            .unwrap();
        assert_eq!(pages.len(), 1);
    }
}
