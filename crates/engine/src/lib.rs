//! # VIC Engine
//!
//! Lifecycle of valued image nominations: discovery, classification,
//! resolution and the list reconciliations that follow a decision.
//!
//! ## Pipeline
//!
//! ```text
//! QueryService::recently_edited
//!     │
//!     ├──> Status Classifier (tags → Promote / Reject / NoAction)
//!     │
//!     ├──> Candidate Resolver (VIC template → Candidate)
//!     │
//!     ├──> Scope index merge ──────────┐
//!     ├──> Listing removal             │
//!     ├──> Staging → topic sweep       ├──> DocumentStore::save
//!     ├──> File tags, staging, notices │
//!     └──> Topic gallery tagging ──────┘
//!                                      │
//!                          Diagnostics report (always written)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use vic_engine::{BotConfig, MemoryQuery, MemoryStore, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> vic_engine::Result<()> {
//!     let mut pipeline = Pipeline::new(MemoryStore::new(), MemoryQuery::new(), BotConfig::default());
//!     let report = pipeline.run().await?;
//!
//!     println!("Promoted {}, rejected {}", report.promoted, report.rejected);
//!     Ok(())
//! }
//! ```

mod candidate;
mod classify;
mod config;
mod diagnostics;
mod dispatch;
mod error;
mod memory;
mod pipeline;
mod ports;
mod promotion;
mod removal;
mod report;
mod sample;
mod scope_index;
mod sweep;

pub use candidate::{parse_nominator, resolve, Candidate, CANDIDATE_TEMPLATE};
pub use classify::{classify, status_of, Action, Status, TAG_SUFFIX};
pub use config::BotConfig;
pub use diagnostics::Diagnostics;
pub use dispatch::{append_backlog, backlog_entry, tag_gallery, TagOutcome, BACKLOG_HEADER, TINY_MARKER};
pub use error::{EngineError, Result};
pub use memory::{MemoryQuery, MemoryStore, SavedEdit};
pub use pipeline::{Pipeline, Triage};
pub use ports::{DocumentStore, DryRunStore, QueryService, RecentPage, StoreError, StoreResult};
pub use promotion::{
    file_page_tag, notice_line, notify_text, populate_staging, staging_line, tag_file_page,
    NOTICE_HEADING,
};
pub use removal::{listed_keys, listing_key, remove};
pub use report::RunReport;
pub use sample::{render_sample, sample_scope};
pub use scope_index::{index_line_key, merge, ScopeIndexEntry};
pub use sweep::{append_to_gallery, SweepPlan, MOVE_MARKER};
