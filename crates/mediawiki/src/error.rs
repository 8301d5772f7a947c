use thiserror::Error;
use vic_engine::StoreError;

pub type Result<T> = std::result::Result<T, MediaWikiError>;

#[derive(Error, Debug)]
pub enum MediaWikiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),
}

impl MediaWikiError {
    /// Port-level error for a request concerning `title`
    #[must_use]
    pub fn into_store_error(self, title: &str) -> StoreError {
        match self {
            Self::Api { code, info } => store_error_for(title, &code, &info),
            Self::Http(err) => StoreError::Transport(err.to_string()),
            Self::Json(err) => StoreError::Transport(err.to_string()),
            Self::Login(reason) => StoreError::Api {
                code: "login".to_string(),
                info: reason,
            },
            Self::UnexpectedResponse(info) => StoreError::Api {
                code: "unexpected".to_string(),
                info,
            },
        }
    }
}

/// Map an API error code onto the store taxonomy
#[must_use]
pub fn store_error_for(title: &str, code: &str, info: &str) -> StoreError {
    match code {
        "protectedpage" | "cascadeprotected" | "protectedtitle" | "protectednamespace"
        | "protectednamespace-interface" => StoreError::Locked(title.to_string()),
        "editconflict" => StoreError::EditConflict(title.to_string()),
        "blocked" | "autoblocked" | "spamblacklist" | "abusefilter-disallowed"
        | "titleblacklist-forbidden" => StoreError::Blocked {
            title: title.to_string(),
            reason: info.to_string(),
        },
        "missingtitle" => StoreError::Missing(title.to_string()),
        _ => StoreError::Api {
            code: code.to_string(),
            info: info.to_string(),
        },
    }
}
