//! Move Sweeper helpers: find move-marked staging lines and merge them into
//! topic galleries.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use vic_wikitext::{directive_filename, insert_before_closing, normalize_title, GalleryLine, GALLERY_CLOSE};

/// Template that marks a staging line as sorted into a topic
pub const MOVE_MARKER: &str = "VICbotMove";

fn opens_gallery(line: &str) -> bool {
    let line = line.trim();
    line.get(..8)
        .is_some_and(|head| head.eq_ignore_ascii_case("<gallery"))
        && line.ends_with('>')
}

fn closes_gallery(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(GALLERY_CLOSE)
}

/// Staging document split into kept lines and per-topic moves
#[derive(Debug, Clone, Default)]
pub struct SweepPlan {
    lines: Vec<String>,
    /// topic → (line index, line for the topic gallery)
    moves: BTreeMap<String, Vec<(usize, String)>>,
    /// Lines carrying a move marker without a readable scope and topic
    unreadable: Vec<String>,
}

impl SweepPlan {
    /// Collect move-marked lines inside `<gallery>` blocks of `staging`
    #[must_use]
    pub fn new(staging: &str) -> Self {
        let mut plan = Self::default();
        let mut in_gallery = false;

        for (index, line) in staging.split('\n').enumerate() {
            plan.lines.push(line.to_string());
            if !in_gallery {
                in_gallery = opens_gallery(line);
                continue;
            }
            if closes_gallery(line) {
                in_gallery = false;
                continue;
            }

            let Some(parsed) = GalleryLine::parse(line, MOVE_MARKER) else {
                continue;
            };
            if parsed.malformed_move {
                plan.unreadable.push(line.trim().to_string());
                continue;
            }
            if let (Some(topic), Some(moved)) = (parsed.move_target.as_deref(), parsed.moved_line()) {
                plan.moves
                    .entry(topic.trim().to_string())
                    .or_default()
                    .push((index, moved));
            }
        }
        plan
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Move-marked lines that stay on staging because the marker is unreadable
    #[must_use]
    pub fn unreadable(&self) -> &[String] {
        &self.unreadable
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.moves.keys().map(String::as_str)
    }

    /// Lines to add to the gallery of `topic`
    #[must_use]
    pub fn lines_for(&self, topic: &str) -> Vec<String> {
        self.moves
            .get(topic)
            .map(|moves| moves.iter().map(|(_, line)| line.clone()).collect())
            .unwrap_or_default()
    }

    /// Staging document without the lines of `completed` topics
    #[must_use]
    pub fn render(&self, completed: &BTreeSet<String>) -> String {
        let dropped: HashSet<usize> = completed
            .iter()
            .filter_map(|topic| self.moves.get(topic))
            .flatten()
            .map(|(index, _)| *index)
            .collect();

        self.lines
            .iter()
            .enumerate()
            .filter(|(index, _)| !dropped.contains(index))
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim_end()
            .to_string()
    }
}

/// Filenames already present as gallery lines of `text`
fn present_files(text: &str) -> HashSet<String> {
    text.split('\n')
        .filter_map(directive_filename)
        .map(normalize_title)
        .collect()
}

/// Gallery with `lines` inserted before its closing marker, skipping files it
/// already shows. `None` when the gallery has no closing marker.
#[must_use]
pub fn append_to_gallery(gallery: &str, lines: &[String]) -> Option<String> {
    let present = present_files(gallery);
    let mut seen = HashSet::new();
    let fresh: Vec<String> = lines
        .iter()
        .filter(|line| {
            directive_filename(line)
                .map(normalize_title)
                .map_or(true, |file| !present.contains(&file) && seen.insert(file))
        })
        .cloned()
        .collect();
    insert_before_closing(gallery, &fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STAGING: &str = "Intro\n<gallery>\nFile:A.jpg|{{VICbotMove|Ants|Animals/Insects}}\nFile:B.jpg|Bees\nFile:C.jpg|{{VICbotMove|[[Crows]]|Animals/Birds}}\nFile:D.jpg|{{VICbotMove|Dragonflies|Animals/Insects}}\n</gallery>\n";

    #[test]
    fn test_plan_groups_moves_by_topic() {
        let plan = SweepPlan::new(STAGING);
        assert_eq!(plan.topics().collect::<Vec<_>>(), vec!["Animals/Birds", "Animals/Insects"]);
        assert_eq!(
            plan.lines_for("Animals/Insects"),
            vec!["File:A.jpg|Ants", "File:D.jpg|Dragonflies"]
        );
        assert_eq!(plan.lines_for("Animals/Birds"), vec!["File:C.jpg|[[Crows]]"]);
    }

    #[test]
    fn test_render_drops_completed_topics_only() {
        let plan = SweepPlan::new(STAGING);
        let completed = BTreeSet::from(["Animals/Insects".to_string()]);
        assert_eq!(
            plan.render(&completed),
            "Intro\n<gallery>\nFile:B.jpg|Bees\nFile:C.jpg|{{VICbotMove|[[Crows]]|Animals/Birds}}\n</gallery>"
        );
    }

    #[test]
    fn test_markers_outside_gallery_are_ignored() {
        let plan = SweepPlan::new("File:A.jpg|{{VICbotMove|Ants|Insects}}\n<gallery>\n</gallery>");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_scope_with_equals_sign_is_moved() {
        let plan = SweepPlan::new(
            "<gallery>\nFile:Tower.jpg|{{VICbotMove|Tower (height = 330 m)|Structures}}\nFile:X.jpg|{{VICbotMove|Lost}}\n</gallery>",
        );
        assert_eq!(plan.lines_for("Structures"), vec!["File:Tower.jpg|Tower (height = 330 m)"]);
        assert_eq!(plan.unreadable(), ["File:X.jpg|{{VICbotMove|Lost}}"]);
    }

    #[test]
    fn test_append_skips_present_files() {
        let gallery = "<gallery>\nFile:A.jpg|Ants\n</gallery>";
        let out = append_to_gallery(
            gallery,
            &["File:A.jpg|Ants".to_string(), "File:D_x.jpg|Dragonflies".to_string()],
        )
        .unwrap();
        assert_eq!(out, "<gallery>\nFile:A.jpg|Ants\nFile:D_x.jpg|Dragonflies\n</gallery>");
        assert_eq!(append_to_gallery(&out, &["File:D x.jpg|again".to_string()]).unwrap(), out);
    }

    #[test]
    fn test_append_needs_closing_marker() {
        assert_eq!(append_to_gallery("<gallery>\nFile:A.jpg", &[]), None);
    }
}
