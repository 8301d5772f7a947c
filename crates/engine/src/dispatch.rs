//! Gallery Dispatcher helpers: mark a promoted file in its topic gallery.

use crate::candidate::Candidate;
use vic_wikitext::{directive_filename, same_title};

/// Marker placed in front of the caption of a promoted file
pub const TINY_MARKER: &str = "{{VI-tiny}}";

/// First text of a freshly created backlog page
pub const BACKLOG_HEADER: &str = "add <nowiki>{{VI-tiny}}</nowiki> at the gallery that matches the scope best and then remove the entry from this list\n";

/// Result of looking for a file in a gallery document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// At least one line was rewritten
    Tagged(String),
    /// Every line for the file already carries the marker
    AlreadyTagged,
    NotFound,
}

fn has_marker(line: &str) -> bool {
    line.to_ascii_lowercase()
        .contains(&TINY_MARKER.to_ascii_lowercase())
}

/// Insert the marker into every gallery line of `image` that lacks it
#[must_use]
pub fn tag_gallery(text: &str, image: &str) -> TagOutcome {
    let mut matched = false;
    let mut changed = false;

    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            if !directive_filename(line).is_some_and(|file| same_title(file, image)) {
                return line.to_string();
            }
            matched = true;
            if has_marker(line) {
                return line.to_string();
            }
            changed = true;
            match line.split_once('|') {
                Some((file, caption)) => format!("{file}|{TINY_MARKER} {caption}"),
                None => format!("{line}|{TINY_MARKER}"),
            }
        })
        .collect();

    match (matched, changed) {
        (_, true) => TagOutcome::Tagged(lines.join("\n")),
        (true, false) => TagOutcome::AlreadyTagged,
        (false, _) => TagOutcome::NotFound,
    }
}

/// Backlog line for a promotion without a gallery match
#[must_use]
pub fn backlog_entry(candidate: &Candidate) -> String {
    format!(
        "*[[:File:{}|{}]]",
        candidate.image,
        candidate.scrubbed_scope()
    )
}

/// Backlog page with `entry` appended; `None` when the entry is already listed
#[must_use]
pub fn append_backlog(existing: Option<&str>, entry: &str) -> Option<String> {
    let current = existing.unwrap_or(BACKLOG_HEADER);
    if current.split('\n').any(|line| line.trim() == entry) {
        return None;
    }
    let mut out = current.to_string();
    out.push('\n');
    out.push_str(entry);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tag_rewrites_matching_line() {
        let text = "<gallery>\nFile:Red bird.jpg|A [[red]] bird|alt=x\nFile:Other.jpg|x\n</gallery>";
        assert_eq!(
            tag_gallery(text, "Red_bird.jpg"),
            TagOutcome::Tagged(
                "<gallery>\nFile:Red bird.jpg|{{VI-tiny}} A [[red]] bird|alt=x\nFile:Other.jpg|x\n</gallery>"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_tag_line_without_caption() {
        assert_eq!(
            tag_gallery("Image:A.jpg", "A.jpg"),
            TagOutcome::Tagged("Image:A.jpg|{{VI-tiny}}".to_string())
        );
    }

    #[test]
    fn test_tag_is_idempotent() {
        let text = "<gallery>\nFile:A.jpg|{{VI-tiny}} Ants\n</gallery>";
        assert_eq!(tag_gallery(text, "A.jpg"), TagOutcome::AlreadyTagged);
    }

    #[test]
    fn test_tag_misses() {
        assert_eq!(
            tag_gallery("<gallery>\nFile:B.jpg|x\n</gallery>", "A.jpg"),
            TagOutcome::NotFound
        );
        assert_eq!(tag_gallery("*[[:File:A.jpg|x]]", "A.jpg"), TagOutcome::NotFound);
    }

    #[test]
    fn test_append_backlog() {
        let created = append_backlog(None, "*[[:File:A.jpg|Ants]]").unwrap();
        assert!(created.starts_with(BACKLOG_HEADER));
        assert!(created.ends_with("\n*[[:File:A.jpg|Ants]]"));
        assert_eq!(append_backlog(Some(&created), "*[[:File:A.jpg|Ants]]"), None);
        assert_eq!(
            append_backlog(Some("list"), "*[[:File:B.jpg|Bees]]").as_deref(),
            Some("list\n*[[:File:B.jpg|Bees]]")
        );
    }
}
