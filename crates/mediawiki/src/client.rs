//! Thin MediaWiki Action API client: JSON requests, tokens, login and
//! continuation.

use crate::error::{MediaWikiError, Result};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Bot password credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    login: LoginResult,
}

#[derive(Debug, Deserialize)]
struct LoginResult {
    result: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    lgusername: Option<String>,
}

pub struct ApiClient {
    http: Client,
    api_url: String,
    csrf_token: Mutex<Option<String>>,
    logged_in: AtomicBool,
}

impl ApiClient {
    pub fn new(api_url: &str, user_agent: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
            csrf_token: Mutex::new(None),
            logged_in: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::Relaxed)
    }

    pub async fn get(&self, params: &[(&str, &str)]) -> Result<Value> {
        let request = self.http.get(&self.api_url).query(&with_format(params));
        self.send(request).await
    }

    pub async fn post(&self, params: &[(&str, &str)]) -> Result<Value> {
        let request = self.http.post(&self.api_url).form(&with_format(params));
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response: Value = request.send().await?.error_for_status()?.json().await?;
        check_response(response)
    }

    /// Fresh token of `kind` (`login`, `csrf`)
    pub async fn token(&self, kind: &str) -> Result<String> {
        let response = self
            .get(&[("action", "query"), ("meta", "tokens"), ("type", kind)])
            .await?;
        response
            .pointer(&format!("/query/tokens/{kind}token"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MediaWikiError::UnexpectedResponse(format!("no {kind} token")))
    }

    /// CSRF token, fetched once and cached until invalidated
    pub async fn csrf_token(&self) -> Result<String> {
        let mut cached = self.csrf_token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.token("csrf").await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    pub async fn invalidate_csrf_token(&self) {
        *self.csrf_token.lock().await = None;
    }

    /// Log in with a bot password
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let token = self.token("login").await?;
        let response = self
            .post(&[
                ("action", "login"),
                ("lgname", credentials.username.as_str()),
                ("lgpassword", credentials.password.as_str()),
                ("lgtoken", token.as_str()),
            ])
            .await?;

        let LoginResponse { login } = serde_json::from_value(response)?;
        if login.result != "Success" {
            return Err(MediaWikiError::Login(
                login.reason.unwrap_or(login.result),
            ));
        }

        self.invalidate_csrf_token().await;
        self.logged_in.store(true, Ordering::Relaxed);
        log::info!(
            "Logged in to {} as {}",
            self.api_url,
            login.lgusername.as_deref().unwrap_or(&credentials.username)
        );
        Ok(())
    }

    /// Run a query and follow `continue` for at most `max_batches` responses
    pub async fn query_batches(&self, params: &[(&str, &str)], max_batches: usize) -> Result<Vec<Value>> {
        let mut batches = Vec::new();
        let mut continuation: Vec<(String, String)> = Vec::new();

        while batches.len() < max_batches {
            let response = {
                let mut request: Vec<(&str, &str)> = params.to_vec();
                request.extend(continuation.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                self.get(&request).await?
            };

            let next = continue_params(&response);
            batches.push(response);
            match next {
                Some(next) => continuation = next,
                None => break,
            }
        }
        Ok(batches)
    }
}

fn with_format<'a>(params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    let mut all = params.to_vec();
    all.push(("format", "json"));
    all.push(("formatversion", "2"));
    all
}

/// Turn an `error` object into [`MediaWikiError::Api`]
fn check_response(response: Value) -> Result<Value> {
    if let Some(error) = response.get("error") {
        let field = |name: &str| {
            error
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        return Err(MediaWikiError::Api {
            code: field("code"),
            info: field("info"),
        });
    }
    if let Some(warnings) = response.get("warnings") {
        log::debug!("API warnings: {warnings}");
    }
    Ok(response)
}

/// Parameters to send with the next request of a continued query
fn continue_params(response: &Value) -> Option<Vec<(String, String)>> {
    let object = response.get("continue")?.as_object()?;
    let params: Vec<(String, String)> = object
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect();
    (!params.is_empty()).then_some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_response_maps_errors() {
        let err = check_response(json!({"error": {"code": "badtoken", "info": "Invalid CSRF token."}}))
            .unwrap_err();
        assert!(matches!(err, MediaWikiError::Api { code, .. } if code == "badtoken"));

        let ok = check_response(json!({"batchcomplete": true})).unwrap();
        assert_eq!(ok["batchcomplete"], json!(true));
    }

    #[test]
    fn test_continue_params() {
        let response = json!({"continue": {"eicontinue": "6|123", "continue": "-||"}});
        let mut params = continue_params(&response).unwrap();
        params.sort();
        assert_eq!(
            params,
            vec![
                ("continue".to_string(), "-||".to_string()),
                ("eicontinue".to_string(), "6|123".to_string()),
            ]
        );
        assert_eq!(continue_params(&json!({"batchcomplete": true})), None);
    }

    #[test]
    fn test_format_params_are_appended() {
        let params = with_format(&[("action", "query")]);
        assert_eq!(
            params,
            vec![("action", "query"), ("format", "json"), ("formatversion", "2")]
        );
    }

    #[test]
    fn test_login_response_shape() {
        let LoginResponse { login } =
            serde_json::from_value(json!({"login": {"result": "Failed", "reason": "Incorrect password"}}))
                .unwrap();
        assert_eq!(login.result, "Failed");
        assert_eq!(login.reason.as_deref(), Some("Incorrect password"));
    }
}
