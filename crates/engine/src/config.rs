use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Page names, limits and the edit-summary prefix of one bot deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BotConfig {
    /// MediaWiki Action API endpoint
    pub api_url: String,

    pub user_agent: String,

    /// Prefix of every edit summary
    pub task_message: String,

    /// Title prefix of candidate documents; the rest of the title is the identifier
    pub candidate_prefix: String,

    /// Listing documents from which processed candidates are removed
    pub listing_pages: Vec<String>,

    /// A listing document takes part only while it contains this marker
    pub listing_marker: String,

    /// Alphabetical scope index
    pub scope_index_page: String,

    /// Staging gallery of recently promoted images
    pub staging_gallery_page: String,

    /// Title prefix of the topic galleries move markers point at
    pub topic_gallery_prefix: String,

    /// Backlog of promotions whose topic gallery had no matching line
    pub gallery_backlog_page: String,

    /// Gallery refreshed with a random sample of promoted images
    pub sample_page: String,

    /// Page replaced with the diagnostics report of every run
    pub diagnostics_page: String,

    /// Discovery looks at candidate documents edited within this many days
    pub lookback_days: u32,

    /// Number of images in the sample gallery
    pub sample_size: usize,

    /// Upper bound on promoted files considered when sampling
    pub sample_pool_limit: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            api_url: "https://commons.wikimedia.org/w/api.php".to_string(),
            user_agent: format!(
                "vicbot/{} (https://commons.wikimedia.org/wiki/User:VICbot)",
                env!("CARGO_PKG_VERSION")
            ),
            task_message: "Processing Valued Image Candidates:".to_string(),
            candidate_prefix: "Commons:Valued image candidates/".to_string(),
            listing_pages: vec![
                "Commons:Valued image candidates/candidate list".to_string(),
                "Commons:Valued image candidates/Most valued review candidate list".to_string(),
            ],
            listing_marker: "<!-- VICBOT_ON -->".to_string(),
            scope_index_page: "Commons:Valued images by scope".to_string(),
            staging_gallery_page: "Commons:Valued images/Recently promoted".to_string(),
            topic_gallery_prefix: "Commons:Valued images by topic/".to_string(),
            gallery_backlog_page: "Commons:Valued image candidates/tag galleries".to_string(),
            sample_page: "Commons:Valued images/sample".to_string(),
            diagnostics_page: "User:VICbot/errors".to_string(),
            lookback_days: 25,
            sample_size: 4,
            sample_pool_limit: 5000,
        }
    }
}

impl BotConfig {
    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| EngineError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(EngineError::InvalidConfig(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }

        let titles = [
            ("candidate_prefix", &self.candidate_prefix),
            ("scope_index_page", &self.scope_index_page),
            ("staging_gallery_page", &self.staging_gallery_page),
            ("topic_gallery_prefix", &self.topic_gallery_prefix),
            ("gallery_backlog_page", &self.gallery_backlog_page),
            ("sample_page", &self.sample_page),
            ("diagnostics_page", &self.diagnostics_page),
        ];
        if let Some((key, _)) = titles.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(EngineError::InvalidConfig(format!("{key} must not be empty")));
        }
        if self.listing_pages.iter().any(|page| page.trim().is_empty()) {
            return Err(EngineError::InvalidConfig(
                "listing_pages must not contain empty titles".to_string(),
            ));
        }

        if self.lookback_days == 0 {
            return Err(EngineError::InvalidConfig(
                "lookback_days must be at least 1".to_string(),
            ));
        }
        if self.sample_size == 0 || self.sample_pool_limit < self.sample_size {
            return Err(EngineError::InvalidConfig(format!(
                "sample_size must be between 1 and sample_pool_limit ({})",
                self.sample_pool_limit
            )));
        }
        Ok(())
    }

    /// Full title of the candidate document for `identifier`
    #[must_use]
    pub fn candidate_title(&self, identifier: &str) -> String {
        format!("{}{}", self.candidate_prefix, identifier)
    }

    /// Edit summary for one kind of change
    #[must_use]
    pub fn summary(&self, action: &str) -> String {
        format!("{} {}", self.task_message, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        BotConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BotConfig::from_toml_str(
            "api_url = \"https://test.wikipedia.org/w/api.php\"\nlookback_days = 7\n",
        )
        .unwrap();
        assert_eq!(config.lookback_days, 7);
        assert_eq!(config.sample_size, 4);
        assert_eq!(config.candidate_prefix, "Commons:Valued image candidates/");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = BotConfig::from_toml_str("lookback = 3\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for source in [
            "lookback_days = 0",
            "sample_size = 0",
            "api_url = \"ftp://example.org\"",
            "scope_index_page = \"  \"",
            "listing_pages = [\"\"]",
        ] {
            assert!(BotConfig::from_toml_str(source).is_err(), "{source}");
        }
    }

    #[test]
    fn test_titles_and_summaries() {
        let config = BotConfig::default();
        assert_eq!(
            config.candidate_title("Bird.jpg"),
            "Commons:Valued image candidates/Bird.jpg"
        );
        assert_eq!(
            config.summary("sort scope index"),
            "Processing Valued Image Candidates: sort scope index"
        );
    }
}
