//! Status Classifier: pick the governing status tag of a candidate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix shared by every status category
pub const TAG_SUFFIX: &str = "valued image candidates";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Nominated,
    Discussed,
    Supported,
    Opposed,
    Promoted,
    Undecided,
    Declined,
    Withdrawn,
}

/// What to do with a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NoAction,
    Promote,
    Reject,
}

impl Status {
    /// Evaluation order: the first status present in a tag set governs it
    pub const PRIORITY: [Self; 8] = [
        Self::Supported,
        Self::Opposed,
        Self::Discussed,
        Self::Nominated,
        Self::Promoted,
        Self::Undecided,
        Self::Declined,
        Self::Withdrawn,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nominated => "Nominated",
            Self::Discussed => "Discussed",
            Self::Supported => "Supported",
            Self::Opposed => "Opposed",
            Self::Promoted => "Promoted",
            Self::Undecided => "Undecided",
            Self::Declined => "Declined",
            Self::Withdrawn => "Withdrawn",
        }
    }

    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::Promoted => Action::Promote,
            Self::Undecided | Self::Declined | Self::Withdrawn => Action::Reject,
            Self::Nominated | Self::Discussed | Self::Supported | Self::Opposed => {
                Action::NoAction
            }
        }
    }

    /// Category name of this status, e.g. `Promoted valued image candidates`
    #[must_use]
    pub fn tag_name(self) -> String {
        format!("{} {TAG_SUFFIX}", self.as_str())
    }

    /// Status named by a category tag. Case, `_` vs `' '` and a leading
    /// `Category:` are ignored.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().replace('_', " ");
        let bare = match tag.split_once(':') {
            Some((ns, rest)) if ns.trim().eq_ignore_ascii_case("category") => rest.trim(),
            _ => tag.as_str(),
        };
        Self::PRIORITY
            .into_iter()
            .find(|status| status.tag_name().eq_ignore_ascii_case(bare))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Governing status of a tag set, if any tag names one
pub fn status_of<I, T>(tags: I) -> Option<Status>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let present: Vec<Status> = tags
        .into_iter()
        .filter_map(|tag| Status::from_tag(tag.as_ref()))
        .collect();
    Status::PRIORITY
        .into_iter()
        .find(|status| present.contains(status))
}

/// Action for a candidate carrying `tags`
pub fn classify<I, T>(tags: I) -> Action
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    match status_of(tags) {
        Some(status) => status.action(),
        None => {
            log::debug!("No status tag recognized");
            Action::NoAction
        }
    }
}
