use crate::client::ApiClient;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use vic_engine::{QueryService, RecentPage, StoreResult};
use vic_wikitext::normalize_title;

/// Template every promoted file page carries
const PROMOTED_TEMPLATE: &str = "Template:VI";

/// Titles per `prop=categories` request
const CATEGORY_BATCH: usize = 50;

/// Entries per list request (`*limit=max` for bots)
const LIST_BATCH: usize = 500;

/// Upper bound on recent-changes pages followed
const MAX_RECENT_BATCHES: usize = 50;

/// [`QueryService`] over the Action API
#[derive(Clone)]
pub struct MediaWikiQuery {
    client: Arc<ApiClient>,
    pool_limit: usize,
}

impl MediaWikiQuery {
    pub fn new(client: Arc<ApiClient>, pool_limit: usize) -> Self {
        Self { client, pool_limit }
    }

    async fn categories_of(&self, titles: &[String]) -> StoreResult<BTreeMap<String, BTreeSet<String>>> {
        let mut tags: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for chunk in titles.chunks(CATEGORY_BATCH) {
            let joined = chunk.join("|");
            let batches = self
                .client
                .query_batches(
                    &[
                        ("action", "query"),
                        ("prop", "categories"),
                        ("cllimit", "max"),
                        ("titles", joined.as_str()),
                    ],
                    usize::MAX,
                )
                .await
                .map_err(|err| err.into_store_error(&joined))?;
            for batch in &batches {
                for (title, categories) in parse_categories(batch) {
                    tags.entry(title).or_default().extend(categories);
                }
            }
        }
        Ok(tags)
    }
}

/// Namespace number of a title prefix, for the namespaces the bot works in
#[must_use]
pub fn namespace_of(prefix: &str) -> Option<u32> {
    let Some((namespace, _)) = prefix.split_once(':') else {
        return Some(0);
    };
    match namespace.trim().to_ascii_lowercase().as_str() {
        "user" => Some(2),
        "commons" | "project" | "wikipedia" => Some(4),
        "file" | "image" => Some(6),
        "template" => Some(10),
        "category" => Some(14),
        _ => None,
    }
}

/// File titles (without namespace) from an `embeddedin` batch
pub(crate) fn parse_embedded_titles(batch: &Value) -> Vec<String> {
    titles_at(batch, "/query/embeddedin")
        .into_iter()
        .map(|title| match title.split_once(':') {
            Some((_, name)) => name.to_string(),
            None => title,
        })
        .collect()
}

/// Titles from a `recentchanges` batch
pub(crate) fn parse_recent_titles(batch: &Value) -> Vec<String> {
    titles_at(batch, "/query/recentchanges")
}

fn titles_at(batch: &Value, pointer: &str) -> Vec<String> {
    batch
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("title").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Page title → category names without the `Category:` prefix
pub(crate) fn parse_categories(batch: &Value) -> Vec<(String, BTreeSet<String>)> {
    let Some(pages) = batch.pointer("/query/pages").and_then(Value::as_array) else {
        return Vec::new();
    };
    pages
        .iter()
        .filter_map(|page| {
            let title = page.get("title")?.as_str()?.to_string();
            let categories = titles_at(page, "/categories")
                .into_iter()
                .map(|category| match category.split_once(':') {
                    Some((_, name)) => name.to_string(),
                    None => category,
                })
                .collect();
            Some((title, categories))
        })
        .collect()
}

fn pick_random(pool: &[String], n: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    pool.choose_multiple(&mut rng, n).cloned().collect()
}

#[async_trait]
impl QueryService for MediaWikiQuery {
    async fn sample_random(&self, n: usize) -> StoreResult<Vec<String>> {
        let max_batches = self.pool_limit.div_ceil(LIST_BATCH).max(1);
        let batches = self
            .client
            .query_batches(
                &[
                    ("action", "query"),
                    ("list", "embeddedin"),
                    ("eititle", PROMOTED_TEMPLATE),
                    ("einamespace", "6"),
                    ("eilimit", "max"),
                ],
                max_batches,
            )
            .await
            .map_err(|err| err.into_store_error(PROMOTED_TEMPLATE))?;

        let pool: Vec<String> = batches
            .iter()
            .flat_map(parse_embedded_titles)
            .take(self.pool_limit)
            .collect();
        log::debug!("Sampling {n} of {} promoted file(s)", pool.len());
        Ok(pick_random(&pool, n))
    }

    async fn recently_edited(&self, prefix: &str, within_days: u32) -> StoreResult<Vec<RecentPage>> {
        let since = (Utc::now() - Duration::days(i64::from(within_days)))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        let namespace = namespace_of(prefix).map(|ns| ns.to_string());

        let mut params = vec![
            ("action", "query"),
            ("list", "recentchanges"),
            ("rcprop", "title"),
            ("rctype", "edit|new"),
            ("rclimit", "max"),
            ("rcend", since.as_str()),
        ];
        if let Some(namespace) = namespace.as_deref() {
            params.push(("rcnamespace", namespace));
        }

        let batches = self
            .client
            .query_batches(&params, MAX_RECENT_BATCHES)
            .await
            .map_err(|err| err.into_store_error(prefix))?;

        let wanted = normalize_title(prefix);
        let titles: Vec<String> = batches
            .iter()
            .flat_map(parse_recent_titles)
            .filter(|title| normalize_title(title).starts_with(&wanted))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        log::debug!("{} page(s) under {prefix} edited in the last {within_days} day(s)", titles.len());

        let mut tags = self.categories_of(&titles).await?;
        Ok(titles
            .into_iter()
            .map(|title| {
                let page_tags = tags.remove(&title).unwrap_or_default();
                RecentPage {
                    title,
                    tags: page_tags,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_namespace_of() {
        assert_eq!(namespace_of("Commons:Valued image candidates/"), Some(4));
        assert_eq!(namespace_of("User talk:X"), None);
        assert_eq!(namespace_of("Plain title"), Some(0));
    }

    #[test]
    fn test_parse_embedded_titles() {
        let batch = json!({"query": {"embeddedin": [
            {"pageid": 1, "ns": 6, "title": "File:Bird.jpg"},
            {"pageid": 2, "ns": 6, "title": "File:Tree: old.png"}
        ]}});
        assert_eq!(parse_embedded_titles(&batch), vec!["Bird.jpg", "Tree: old.png"]);
    }

    #[test]
    fn test_parse_categories() {
        let batch = json!({"query": {"pages": [
            {"ns": 4, "title": "Commons:Valued image candidates/Bird.jpg", "categories": [
                {"ns": 14, "title": "Category:Promoted valued image candidates"}
            ]},
            {"ns": 4, "title": "Commons:Valued image candidates/Oak.jpg"}
        ]}});
        let parsed = parse_categories(&batch);
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed[0].1,
            BTreeSet::from(["Promoted valued image candidates".to_string()])
        );
        assert!(parsed[1].1.is_empty());
    }

    #[test]
    fn test_parse_recent_titles() {
        let batch = json!({"query": {"recentchanges": [
            {"type": "edit", "ns": 4, "title": "Commons:Valued image candidates/Bird.jpg"}
        ]}});
        assert_eq!(
            parse_recent_titles(&batch),
            vec!["Commons:Valued image candidates/Bird.jpg"]
        );
    }

    #[test]
    fn test_pick_random_bounds() {
        let pool: Vec<String> = (0..10).map(|i| format!("{i}.jpg")).collect();
        let picked = pick_random(&pool, 4);
        assert_eq!(picked.len(), 4);
        assert!(picked.iter().all(|p| pool.contains(p)));
        assert_eq!(pick_random(&pool[..2], 4).len(), 2);
    }
}
