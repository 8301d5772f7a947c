//! Edits made for every promoted candidate: file page tag, staging gallery
//! line and nominator notification.

use crate::candidate::Candidate;
use crate::sweep::append_to_gallery;
use std::collections::HashSet;
use vic_wikitext::{extract, normalize_title};

/// Heading of a promotion notice on a user talk page
pub const NOTICE_HEADING: &str = "\n==Valued Image Promotion==\n";

const NOTICE_TEMPLATE: &str = "VICpromoted";

/// Tag appended to the file page of a promoted image
#[must_use]
pub fn file_page_tag(candidate: &Candidate) -> String {
    format!(
        "{{{{subst:VI-add|{}|subpage={}}}}}",
        candidate.scope, candidate.subpage
    )
}

/// File page with the promotion tag appended; `None` when it is already tagged
#[must_use]
pub fn tag_file_page(text: &str, candidate: &Candidate) -> Option<String> {
    let tagged = extract(text)
        .iter()
        .any(|t| t.is_named("VI") || t.is_named("subst:VI-add"));
    if tagged {
        return None;
    }

    let mut out = text.trim_end_matches('\n').to_string();
    out.push('\n');
    out.push_str(&file_page_tag(candidate));
    out.push('\n');
    Some(out)
}

/// Line for the staging gallery, to be sorted into a topic by hand
#[must_use]
pub fn staging_line(candidate: &Candidate) -> String {
    format!("File:{}|{}", candidate.image, candidate.scope)
}

/// Staging gallery with lines for `candidates` added. `None` when the gallery
/// has no closing marker.
#[must_use]
pub fn populate_staging(text: &str, candidates: &[Candidate]) -> Option<String> {
    let lines: Vec<String> = candidates.iter().map(staging_line).collect();
    append_to_gallery(text, &lines)
}

fn welcome(user: &str) -> String {
    format!(
        "Welcome to Commons, {user}. What better way than starting off with a Valued Image promotion could there be? :-) --~~~~\n\n"
    )
}

#[must_use]
pub fn notice_line(candidate: &Candidate) -> String {
    format!(
        "{{{{{NOTICE_TEMPLATE}|{}|{}|subpage={}|review={}}}}}\n",
        candidate.image, candidate.scope, candidate.subpage, candidate.review
    )
}

/// Talk page of `user` with a notice for every candidate not yet announced
/// there. A missing talk page starts with a welcome line. `None` when there
/// is nothing new to say.
#[must_use]
pub fn notify_text(existing: Option<&str>, user: &str, candidates: &[&Candidate]) -> Option<String> {
    let announced: HashSet<String> = existing
        .map(|text| {
            extract(text)
                .into_iter()
                .filter(|t| t.is_named(NOTICE_TEMPLATE))
                .filter_map(|t| t.positional(1).map(normalize_title))
                .collect()
        })
        .unwrap_or_default();

    let fresh: Vec<String> = candidates
        .iter()
        .filter(|c| !announced.contains(&normalize_title(&c.image)))
        .map(|c| notice_line(c))
        .collect();
    if fresh.is_empty() {
        return None;
    }

    let mut out = existing.map_or_else(|| welcome(user), str::to_string);
    out.push_str(NOTICE_HEADING);
    out.push_str(&fresh.concat());
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::resolve;
    use pretty_assertions::assert_eq;

    fn candidate(image: &str, scope: &str) -> Candidate {
        resolve(
            image,
            &format!("{{{{VIC|image={image}|scope={scope}|nominator=[[User:Alice]]|review=ok}}}}"),
        )
        .unwrap()
    }

    #[test]
    fn test_tag_file_page_once() {
        let bird = candidate("Bird.jpg", "[[Birds]]");
        let tagged = tag_file_page("== Summary ==\n{{Information}}\n", &bird).unwrap();
        assert_eq!(
            tagged,
            "== Summary ==\n{{Information}}\n{{subst:VI-add|[[Birds]]|subpage=Bird.jpg}}\n"
        );
        assert_eq!(tag_file_page(&tagged, &bird), None);
        assert_eq!(tag_file_page("{{VI|Birds|subpage=Bird.jpg}}", &bird), None);
    }

    #[test]
    fn test_populate_staging() {
        let staging = "<gallery>\nFile:Old.jpg|Old\n</gallery>";
        let out = populate_staging(staging, &[candidate("Bird.jpg", "Birds")]).unwrap();
        assert_eq!(out, "<gallery>\nFile:Old.jpg|Old\nFile:Bird.jpg|Birds\n</gallery>");
        assert_eq!(populate_staging(&out, &[candidate("Bird.jpg", "Birds")]).unwrap(), out);
        assert_eq!(populate_staging("no gallery", &[]), None);
    }

    #[test]
    fn test_notify_new_talk_page() {
        let bird = candidate("Bird.jpg", "Birds");
        let text = notify_text(None, "Alice", &[&bird]).unwrap();
        assert!(text.starts_with("Welcome to Commons, Alice."));
        assert!(text.ends_with(
            "\n==Valued Image Promotion==\n{{VICpromoted|Bird.jpg|Birds|subpage=Bird.jpg|review=ok}}\n"
        ));
    }

    #[test]
    fn test_notify_skips_announced_images() {
        let bird = candidate("Bird.jpg", "Birds");
        let oak = candidate("Oak.jpg", "Oaks");
        let first = notify_text(Some("Hi"), "Alice", &[&bird]).unwrap();
        assert_eq!(notify_text(Some(&first), "Alice", &[&bird]), None);

        let second = notify_text(Some(&first), "Alice", &[&bird, &oak]).unwrap();
        assert_eq!(second.matches("{{VICpromoted|Bird.jpg").count(), 1);
        assert!(second.contains("{{VICpromoted|Oak.jpg|Oaks"));
    }
}
