use crate::ports::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while processing candidates
#[derive(Error, Debug)]
pub enum EngineError {
    /// The recent-changes query behind discovery failed; nothing can be processed
    #[error("Discovery query failed: {0}")]
    DiscoveryFailure(String),

    /// Required template fields that are absent or blank, in reporting order
    #[error("Missing required field(s): {}", .0.join(", "))]
    MissingField(Vec<String>),

    /// Nominator field without a user link
    #[error("Unparseable nominator: {0}")]
    UnparseableNominator(String),

    /// A page the step needs does not exist
    #[error("Page [[{0}]] does not exist")]
    TargetMissing(String),

    /// Gallery page without a closing `</gallery>` line
    #[error("No closing gallery marker on [[{0}]]")]
    MalformedGallery(String),

    /// The store refused to write a page (protection, conflict, block)
    #[error("Save of [[{title}]] refused: {source}")]
    SaveConflict {
        title: String,
        #[source]
        source: StoreError,
    },

    /// Any other store failure
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Errors that abort the whole run instead of a single item
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::DiscoveryFailure(_) | Self::InvalidConfig(_))
    }

    /// Store failures that the next run may get past unchanged
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::SaveConflict { source, .. } | Self::Store(source) => source.is_retryable(),
            _ => false,
        }
    }
}
