use crate::ports::{DocumentStore, StoreResult};
use serde::Serialize;

/// Human-readable problems collected during one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    entries: Vec<String>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.entries.push(message);
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One bullet line per entry
    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("* {}\n", entry.replace('\n', " ")))
            .collect()
    }

    /// Replace `page` with the report. Consumes the collection, so a run can
    /// flush at most once.
    pub async fn flush<S>(self, store: &S, page: &str, summary: &str) -> StoreResult<usize>
    where
        S: DocumentStore + ?Sized,
    {
        let count = self.entries.len();
        store.save(page, &self.render(), summary).await?;
        log::info!("Wrote {count} diagnostic(s) to [[{page}]]");
        Ok(count)
    }
}
