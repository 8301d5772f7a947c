//! Scope Normalizer: display form and sort key of a free-text scope.

use once_cell::sync::Lazy;
use regex::Regex;

/// `[[Target|label]]` or `[[label]]` → `label`
static LINK_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[(?:[^|\]]+\|)?([^|\]]+)\]\]").expect("valid link regex"));

/// Single-letter wrapper templates such as `{{w|Passer}}` → `Passer`
static SHORT_TEMPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\w\|([^|}]+)\}\}").expect("valid template regex"));

/// Bold/italic quote runs
static QUOTE_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"'{2,3}").expect("valid quote regex"));

/// First plain link target (namespaced links are not gallery targets)
static LINK_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^|\]:]+)[^\]]*\]\]").expect("valid target regex"));

/// Display form of a scope with link, wrapper-template and emphasis decoration removed
#[must_use]
pub fn scrub_scope(raw: &str) -> String {
    let unlinked = LINK_LABEL.replace_all(raw, "$1");
    let unwrapped = SHORT_TEMPLATE.replace_all(&unlinked, "$1");
    QUOTE_EMPHASIS.replace_all(&unwrapped, "").into_owned()
}

/// Sort key of a scope: display form, apostrophes removed, uppercased, trimmed
#[must_use]
pub fn sort_key(raw: &str) -> String {
    scrub_scope(raw).replace('\'', "").to_uppercase().trim().to_string()
}

/// Title of the topic gallery a scope points at: the first plain link target,
/// otherwise the scrubbed scope itself
#[must_use]
pub fn gallery_target(raw: &str) -> String {
    LINK_TARGET
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| scrub_scope(raw).trim().to_string())
}
