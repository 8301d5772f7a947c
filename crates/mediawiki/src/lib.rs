//! # VIC MediaWiki
//!
//! [`DocumentStore`](vic_engine::DocumentStore) and
//! [`QueryService`](vic_engine::QueryService) over the MediaWiki Action API.
//!
//! Both adapters share one [`ApiClient`], so the login cookie and the cached
//! CSRF token are reused. Requests are issued one at a time.
//!
//! ```no_run
//! use vic_engine::{BotConfig, Pipeline};
//! use vic_mediawiki::{connect, Credentials};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = BotConfig::default();
//! let credentials = Credentials {
//!     username: "VICbot@vicbot".to_string(),
//!     password: "bot-password".to_string(),
//! };
//! let (store, query) = connect(&config, Some(&credentials)).await?;
//! let report = Pipeline::new(store, query, config).run().await?;
//! println!("{report:?}");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod query;
mod store;

pub use client::{ApiClient, Credentials};
pub use error::{store_error_for, MediaWikiError, Result};
pub use query::{namespace_of, MediaWikiQuery};
pub use store::MediaWikiStore;

use std::sync::Arc;
use vic_engine::BotConfig;

/// Build both adapters for `config`, logging in when credentials are given.
/// Without credentials every save is refused.
pub async fn connect(
    config: &BotConfig,
    credentials: Option<&Credentials>,
) -> Result<(MediaWikiStore, MediaWikiQuery)> {
    let client = ApiClient::new(&config.api_url, &config.user_agent)?;
    match credentials {
        Some(credentials) => client.login(credentials).await?,
        None => log::warn!("No credentials given; running read-only against {}", config.api_url),
    }

    let client = Arc::new(client);
    Ok((
        MediaWikiStore::new(Arc::clone(&client)),
        MediaWikiQuery::new(client, config.sample_pool_limit),
    ))
}
