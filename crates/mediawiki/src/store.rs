use crate::client::ApiClient;
use crate::error::MediaWikiError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use vic_engine::{DocumentStore, StoreError, StoreResult};

/// [`DocumentStore`] over the Action API
#[derive(Clone)]
pub struct MediaWikiStore {
    client: Arc<ApiClient>,
}

impl MediaWikiStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    async fn edit(&self, title: &str, text: &str, summary: &str) -> Result<Value, MediaWikiError> {
        let token = self.client.csrf_token().await?;
        self.client
            .post(&[
                ("action", "edit"),
                ("title", title),
                ("text", text),
                ("summary", summary),
                ("bot", "1"),
                ("assert", "user"),
                ("token", token.as_str()),
            ])
            .await
    }
}

fn first_page(response: &Value) -> Option<&Value> {
    response.pointer("/query/pages")?.as_array()?.first()
}

fn is_missing(page: &Value) -> bool {
    page.get("missing").is_some() || page.get("invalid").is_some()
}

/// Whether a `titles=` query found an existing page
pub(crate) fn page_exists(response: &Value) -> bool {
    first_page(response).is_some_and(|page| !is_missing(page))
}

/// Main-slot content of the first page of a revisions query
pub(crate) fn page_content(response: &Value) -> Option<String> {
    let page = first_page(response).filter(|page| !is_missing(page))?;
    page.pointer("/revisions/0/slots/main/content")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl DocumentStore for MediaWikiStore {
    async fn exists(&self, title: &str) -> StoreResult<bool> {
        let response = self
            .client
            .get(&[("action", "query"), ("titles", title)])
            .await
            .map_err(|err| err.into_store_error(title))?;
        Ok(page_exists(&response))
    }

    async fn fetch(&self, title: &str, resolve_redirect: bool) -> StoreResult<String> {
        let mut params = vec![
            ("action", "query"),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("rvslots", "main"),
            ("titles", title),
        ];
        if resolve_redirect {
            params.push(("redirects", "1"));
        }

        let response = self
            .client
            .get(&params)
            .await
            .map_err(|err| err.into_store_error(title))?;
        page_content(&response).ok_or_else(|| StoreError::Missing(title.to_string()))
    }

    async fn save(&self, title: &str, text: &str, summary: &str) -> StoreResult<()> {
        if !self.client.is_logged_in() {
            return Err(StoreError::Api {
                code: "notloggedin".to_string(),
                info: format!("refusing to edit [[{title}]] without logging in"),
            });
        }

        let response = match self.edit(title, text, summary).await {
            Err(MediaWikiError::Api { code, .. }) if code == "badtoken" => {
                log::debug!("CSRF token expired; retrying edit of [[{title}]]");
                self.client.invalidate_csrf_token().await;
                self.edit(title, text, summary).await
            }
            other => other,
        }
        .map_err(|err| err.into_store_error(title))?;

        match response.pointer("/edit/result").and_then(Value::as_str) {
            Some("Success") => {
                if response.pointer("/edit/nochange").is_some() {
                    log::debug!("Edit of [[{title}]] changed nothing");
                }
                Ok(())
            }
            other => Err(StoreError::Api {
                code: "editfailed".to_string(),
                info: format!("edit of [[{title}]] returned {}", other.unwrap_or("no result")),
            }),
        }
    }
}
