use crate::parser::extract;
use crate::types::TemplateInstance;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const GALLERY_OPEN: &str = "<gallery>";
pub const GALLERY_CLOSE: &str = "</gallery>";

static FILE_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?i:image|file):([^|]+)").expect("valid directive regex"));

/// Filename of a line that starts with an `Image:`/`File:` directive
#[must_use]
pub fn directive_filename(line: &str) -> Option<&str> {
    FILE_DIRECTIVE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Insert `lines` right before the last `</gallery>` that starts a line.
///
/// Returns `None` when no such closing marker exists.
#[must_use]
pub fn insert_before_closing(text: &str, lines: &[String]) -> Option<String> {
    let marker = format!("\n{GALLERY_CLOSE}");
    let end = text.rfind(&marker)?;

    let mut out = String::with_capacity(text.len() + lines.iter().map(|l| l.len() + 1).sum::<usize>());
    out.push_str(&text[..end]);
    for line in lines {
        out.push('\n');
        out.push_str(line);
    }
    out.push_str(&text[end..]);
    Some(out)
}

/// View over one line of a `<gallery>` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryLine {
    /// Text before the first pipe, e.g. `File:Bird.jpg`
    pub filename: String,

    /// Text after the first pipe (may be empty)
    pub caption: String,

    /// Topic named by a move marker in the caption
    pub move_target: Option<String>,

    /// Scope carried by a move marker in the caption
    pub move_scope: Option<String>,

    /// The caption holds a move marker whose scope and topic could not be read
    #[serde(default)]
    pub malformed_move: bool,
}

/// Scope and topic of a move marker: its last two positional parameters, or
/// else everything between the first and the last pipe of its raw text, so that
/// a scope containing `=` survives
fn move_params(template: &TemplateInstance, source: &str) -> Option<(String, String)> {
    if let Some([scope, topic]) = template.trailing_positional(2) {
        return (!topic.trim().is_empty()).then(|| (scope.clone(), topic.clone()));
    }

    let raw = source.get(template.span.start..template.span.end)?;
    let inner = raw.strip_prefix("{{")?.strip_suffix("}}")?;
    let (_, params) = inner.split_once('|')?;
    let (scope, topic) = params.rsplit_once('|')?;
    let (scope, topic) = (scope.trim(), topic.trim());
    (!scope.is_empty() && !topic.is_empty()).then(|| (scope.to_string(), topic.to_string()))
}

impl GalleryLine {
    /// Parse a gallery line; blank lines yield `None`.
    ///
    /// A move marker is a template named `move_marker` in the caption whose
    /// last two positional parameters are the scope and the topic.
    #[must_use]
    pub fn parse(line: &str, move_marker: &str) -> Option<Self> {
        if line.trim().is_empty() {
            return None;
        }

        let (filename, caption) = match line.split_once('|') {
            Some((file, caption)) => (file, caption),
            None => (line, ""),
        };

        let marker = extract(caption).into_iter().find(|t| t.is_named(move_marker));
        let (move_scope, move_target, malformed_move) = match marker {
            None => (None, None, false),
            Some(template) => match move_params(&template, caption) {
                Some((scope, topic)) => (Some(scope), Some(topic), false),
                None => (None, None, true),
            },
        };

        Some(Self {
            filename: filename.trim().to_string(),
            caption: caption.to_string(),
            move_target,
            move_scope,
            malformed_move,
        })
    }

    #[must_use]
    pub fn is_move(&self) -> bool {
        self.move_target.is_some()
    }

    /// Line to place in the topic gallery: filename and the marker's scope
    #[must_use]
    pub fn moved_line(&self) -> Option<String> {
        self.move_scope
            .as_ref()
            .map(|scope| format!("{}|{}", self.filename, scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_directive_filename() {
        assert_eq!(directive_filename("File:Bird.jpg|A bird"), Some("Bird.jpg"));
        assert_eq!(directive_filename("  image:Old name.png"), Some("Old name.png"));
        assert_eq!(directive_filename("FILE:Loud.jpg|x"), Some("Loud.jpg"));
        assert_eq!(directive_filename("*[[:File:Bird.jpg|x]]"), None);
    }

    #[test]
    fn test_parse_move_line() {
        let line = GalleryLine::parse(
            "File:Bird.jpg|{{VICbotMove|[[Birds]] in flight|Animals/Birds}}",
            "VICbotMove",
        )
        .unwrap();
        assert_eq!(line.filename, "File:Bird.jpg");
        assert_eq!(line.move_scope.as_deref(), Some("[[Birds]] in flight"));
        assert_eq!(line.move_target.as_deref(), Some("Animals/Birds"));
        assert_eq!(
            line.moved_line().as_deref(),
            Some("File:Bird.jpg|[[Birds]] in flight")
        );
    }

    #[test]
    fn test_parse_move_scope_with_equals_sign() {
        let line = GalleryLine::parse(
            "File:Tower.jpg|{{VICbotMove|Tower (height = 330 m)|Structures}}",
            "VICbotMove",
        )
        .unwrap();
        assert!(!line.malformed_move);
        assert_eq!(line.move_scope.as_deref(), Some("Tower (height = 330 m)"));
        assert_eq!(line.move_target.as_deref(), Some("Structures"));
    }

    #[test]
    fn test_parse_unreadable_move_marker() {
        let line = GalleryLine::parse("File:Tower.jpg|{{VICbotMove|Towers}}", "VICbotMove").unwrap();
        assert!(!line.is_move());
        assert!(line.malformed_move);

        let plain = GalleryLine::parse("File:Tower.jpg|Towers", "VICbotMove").unwrap();
        assert!(!plain.malformed_move);
    }

    #[test]
    fn test_parse_plain_line() {
        let line = GalleryLine::parse("File:Bird.jpg|Birds", "VICbotMove").unwrap();
        assert!(!line.is_move());
        assert_eq!(line.caption, "Birds");
        assert!(GalleryLine::parse("   ", "VICbotMove").is_none());
    }

    #[test]
    fn test_insert_before_closing() {
        let text = "intro\n<gallery>\nFile:A.jpg|a\n</gallery>\nfooter";
        let out = insert_before_closing(text, &["File:B.jpg|b".to_string()]).unwrap();
        assert_eq!(out, "intro\n<gallery>\nFile:A.jpg|a\nFile:B.jpg|b\n</gallery>\nfooter");
        assert!(insert_before_closing("<gallery>\nFile:A.jpg", &[]).is_none());
    }
}
