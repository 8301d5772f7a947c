use serde::{Deserialize, Serialize};

/// Counters of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Candidate documents returned by discovery
    pub discovered: usize,

    /// Candidates handled as promotions
    pub promoted: usize,

    /// Candidates handled as rejections
    pub rejected: usize,

    /// Candidates left alone (open status, unlisted, unresolvable)
    pub skipped: usize,

    /// Saves accepted by the store
    pub saved: usize,

    /// Diagnostics written at the end of the run
    pub diagnostics: usize,

    /// Time taken in milliseconds
    pub time_ms: u64,
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates that were removed from the listings
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.promoted + self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_flat_counters() {
        let report = RunReport {
            promoted: 2,
            rejected: 1,
            saved: 9,
            ..RunReport::new()
        };
        assert_eq!(report.processed(), 3);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["promoted"], 2);
        assert_eq!(json["saved"], 9);
        assert_eq!(json["time_ms"], 0);
    }
}
