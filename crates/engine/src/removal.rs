//! Listing Remover: drop processed candidates from a listing document.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use vic_wikitext::{normalize_title, unescape_entities};

/// A level-3 heading followed by an empty `{{VICs ... }}` block
static EMPTY_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^===[^=]+===\s+^\{\{VICs\s+^\}\}\s*").expect("valid section regex")
});

/// Comparison key of a listing line: unescaped, leading `|`/spaces dropped, normalized
#[must_use]
pub fn listing_key(line: &str) -> String {
    normalize_title(unescape_entities(line).trim_start_matches(['|', ' ']))
}

/// Keys of every non-blank line of a listing document
pub fn listed_keys(document: &str) -> impl Iterator<Item = String> + '_ {
    document
        .split('\n')
        .map(listing_key)
        .filter(|key| !key.is_empty())
}

/// Remove every line whose key equals one of `identifiers`, then drop
/// sections left empty and trailing blank lines.
#[must_use]
pub fn remove<S: AsRef<str>>(document: &str, identifiers: &[S]) -> String {
    let targets: HashSet<String> = identifiers
        .iter()
        .map(|id| normalize_title(id.as_ref()))
        .filter(|id| !id.is_empty())
        .collect();

    let kept: Vec<&str> = document
        .split('\n')
        .filter(|line| {
            let drop = targets.contains(&listing_key(line));
            if drop {
                log::debug!("Removing listing line '{line}'");
            }
            !drop
        })
        .collect();

    let joined = kept.join("\n");
    EMPTY_SECTION
        .replace_all(&joined, "")
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LISTING: &str = "<!-- VICBOT_ON -->\n=== Birds ===\n{{VICs\n|Bird.jpg\n| Red&#32;bird.jpg\n}}\n=== Trees ===\n{{VICs\n|Oak.jpg\n}}\n\n";

    #[test]
    fn test_remove_drops_matching_lines_and_empty_sections() {
        let out = remove(LISTING, &["Red bird.jpg", "Bird.jpg"]);
        assert_eq!(out, "<!-- VICBOT_ON -->\n=== Trees ===\n{{VICs\n|Oak.jpg\n}}");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let once = remove(LISTING, &["Oak.jpg"]);
        assert_eq!(remove(&once, &["Oak.jpg"]), once);
        assert!(!once.contains("Trees"));
    }

    #[test]
    fn test_only_exact_keys_match() {
        let out = remove("{{VICs\n|Bird.jpg/2\n|Bird.jpg\n}}", &["Bird.jpg"]);
        assert_eq!(out, "{{VICs\n|Bird.jpg/2\n}}");
    }

    #[test]
    fn test_empty_identifier_removes_nothing() {
        let doc = "a\n\nb";
        assert_eq!(remove(doc, &[""]), doc);
    }

    #[test]
    fn test_listed_keys() {
        let keys: Vec<_> = listed_keys("|Red bird.jpg\n\n=== x ===").collect();
        assert_eq!(keys, vec!["Red_bird.jpg", "===_x_==="]);
    }
}
