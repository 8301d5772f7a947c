//! Scope Index Reconciler: merge new entries into the alphabetical index.

use crate::candidate::Candidate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use vic_wikitext::{scrub_scope, sort_key};

/// `*[[:File:Name.jpg|Display text]]`; group 1 is the filename, group 2 the display text
static INDEX_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\s*\[\[:(?i:image|file):([^|\]]+).*\|(.+)\]\]\s*$")
        .expect("valid index line regex")
});

/// One image/scope pair destined for the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeIndexEntry {
    pub image: String,
    pub scope_text: String,
    pub sort_key: String,
}

impl ScopeIndexEntry {
    #[must_use]
    pub fn new(image: &str, raw_scope: &str) -> Self {
        let scope_text = scrub_scope(raw_scope).trim().to_string();
        Self {
            image: image.trim().to_string(),
            sort_key: sort_key(&scope_text),
            scope_text,
        }
    }

    #[must_use]
    pub fn from_candidate(candidate: &Candidate) -> Self {
        Self::new(&candidate.image, &candidate.scope)
    }

    #[must_use]
    pub fn to_line(&self) -> String {
        format!("*[[:File:{}|{}]]", self.image, self.scope_text)
    }
}

/// Sort key of an existing index line, `None` for any other line
#[must_use]
pub fn index_line_key(line: &str) -> Option<String> {
    INDEX_LINE
        .captures(line)
        .and_then(|caps| caps.get(2))
        .map(|display| sort_key(display.as_str()))
}

/// Merge `new_entries` into `existing` and re-sort the index lines.
///
/// Every index line is keyed by its sort key. Existing lines replace generated
/// ones with the same key; among generated ones the smallest image name wins.
/// The sorted block takes the place of the first index line, all other lines
/// keep their positions, and a document without index lines gets the block
/// appended. With nothing new, an already sorted document comes back unchanged.
#[must_use]
pub fn merge(existing: &str, new_entries: &[ScopeIndexEntry]) -> String {
    let mut generated: BTreeMap<&str, &ScopeIndexEntry> = BTreeMap::new();
    for entry in new_entries {
        match generated.entry(entry.sort_key.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                if entry.image < slot.get().image {
                    slot.insert(entry);
                }
            }
        }
    }

    let mut index: BTreeMap<String, String> = generated
        .into_iter()
        .map(|(key, entry)| (key.to_string(), entry.to_line()))
        .collect();

    let lines: Vec<&str> = existing.split('\n').collect();
    let mut first_index_line = None;
    let mut is_index = vec![false; lines.len()];
    for (position, line) in lines.iter().enumerate() {
        if let Some(key) = index_line_key(line) {
            first_index_line.get_or_insert(position);
            is_index[position] = true;
            index.insert(key, (*line).to_string());
        }
    }

    let Some(first_index_line) = first_index_line else {
        if index.is_empty() {
            return existing.to_string();
        }
        let mut out = existing.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&index.into_values().collect::<Vec<_>>().join("\n"));
        return out;
    };

    let mut sorted = Some(index.into_values());
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for (position, line) in lines.iter().enumerate() {
        if position == first_index_line {
            if let Some(block) = sorted.take() {
                out.extend(block);
            }
        } else if !is_index[position] {
            out.push((*line).to_string());
        }
    }
    out.join("\n")
}
