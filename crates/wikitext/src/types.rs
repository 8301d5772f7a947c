use crate::title::strip_invisible;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Byte range of a template instance in the source text (end exclusive)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if another span lies fully inside this one
    #[must_use]
    pub const fn contains(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// One `{{...}}` template instance
///
/// Nested templates are separate instances; their text stays verbatim inside
/// the parent's parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInstance {
    /// Template name as written (comments stripped, trimmed)
    pub name: String,

    /// Positional parameters in order (1-indexed through [`Self::positional`])
    pub positional_params: Vec<String>,

    /// Named parameters; the last occurrence of a key wins
    pub named_params: BTreeMap<String, String>,

    /// Location in the source text
    pub span: Span,
}

impl TemplateInstance {
    /// Create an instance without parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positional_params: Vec::new(),
            named_params: BTreeMap::new(),
            span: Span::default(),
        }
    }

    /// Builder: append a positional parameter
    #[must_use]
    pub fn with_positional(mut self, value: impl Into<String>) -> Self {
        self.positional_params.push(value.into());
        self
    }

    /// Builder: set a named parameter
    #[must_use]
    pub fn with_named(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.named_params.insert(key.into(), value.into());
        self
    }

    /// Case-insensitive name comparison, ignoring leading direction/zero-width
    /// marks and treating `_` as a space
    #[must_use]
    pub fn is_named(&self, target: &str) -> bool {
        canonical_name(&self.name) == canonical_name(target)
    }

    /// Positional parameter by 1-based index
    #[must_use]
    pub fn positional(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.positional_params.get(i))
            .map(String::as_str)
    }

    /// Named parameter by key
    #[must_use]
    pub fn named(&self, key: &str) -> Option<&str> {
        self.named_params.get(key).map(String::as_str)
    }

    /// Named parameter that is present and non-empty after trimming
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.named(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// The last `n` positional parameters, in order
    #[must_use]
    pub fn trailing_positional(&self, n: usize) -> Option<&[String]> {
        let len = self.positional_params.len();
        (len >= n).then(|| &self.positional_params[len - n..])
    }

    /// Serialize back into wiki markup (positional first, then named by key)
    #[must_use]
    pub fn to_wikitext(&self) -> String {
        let mut out = String::from("{{");
        out.push_str(&self.name);
        for value in &self.positional_params {
            out.push('|');
            out.push_str(value);
        }
        for (key, value) in &self.named_params {
            out.push('|');
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        out.push_str("}}");
        out
    }
}

fn canonical_name(name: &str) -> String {
    strip_invisible(name)
        .trim()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_named_ignores_case_and_marks() {
        let tpl = TemplateInstance::new("\u{200E}VICbot_Move");
        assert!(tpl.is_named("vicbot move"));
        assert!(tpl.is_named("VICBOT_MOVE"));
        assert!(!tpl.is_named("VIC"));
    }

    #[test]
    fn test_positional_is_one_indexed() {
        let tpl = TemplateInstance::new("VI")
            .with_positional("Birds")
            .with_positional("Commons");
        assert_eq!(tpl.positional(0), None);
        assert_eq!(tpl.positional(1), Some("Birds"));
        assert_eq!(tpl.positional(2), Some("Commons"));
        assert_eq!(tpl.positional(3), None);
    }

    #[test]
    fn test_field_rejects_blank_values() {
        let tpl = TemplateInstance::new("VIC")
            .with_named("subpage", "  ")
            .with_named("image", " Bird.jpg ");
        assert_eq!(tpl.field("subpage"), None);
        assert_eq!(tpl.field("image"), Some("Bird.jpg"));
        assert_eq!(tpl.field("scope"), None);
    }

    #[test]
    fn test_trailing_positional() {
        let tpl = TemplateInstance::new("VICbotMove")
            .with_positional("a")
            .with_positional("b")
            .with_positional("c");
        assert_eq!(
            tpl.trailing_positional(2),
            Some(&["b".to_string(), "c".to_string()][..])
        );
        assert_eq!(tpl.trailing_positional(4), None);
    }

    #[test]
    fn test_to_wikitext() {
        let tpl = TemplateInstance::new("VIC")
            .with_positional("x")
            .with_named("b", "2")
            .with_named("a", "1");
        assert_eq!(tpl.to_wikitext(), "{{VIC|x|a=1|b=2}}");
    }
}
