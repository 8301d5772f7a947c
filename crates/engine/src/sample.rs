use vic_wikitext::{find_template, GALLERY_CLOSE, GALLERY_OPEN};

/// Scope of a promoted file: first positional parameter of its `{{VI}}` tag
#[must_use]
pub fn sample_scope(file_page: &str) -> Option<String> {
    find_template(file_page, "VI")
        .and_then(|vi| vi.positional(1).map(str::to_string))
        .filter(|scope| !scope.is_empty())
}

/// Gallery of `(image, scope)` pairs
#[must_use]
pub fn render_sample(entries: &[(String, String)]) -> String {
    let mut out = format!("{GALLERY_OPEN}\n");
    for (image, scope) in entries {
        out.push_str(&format!("File:{image}|{scope}\n"));
    }
    out.push_str(GALLERY_CLOSE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_scope() {
        assert_eq!(
            sample_scope("{{Information}}\n{{VI|[[Birds]] in flight|subpage=Bird.jpg}}").as_deref(),
            Some("[[Birds]] in flight")
        );
        assert_eq!(sample_scope("{{VI|subpage=Bird.jpg}}"), None);
        assert_eq!(sample_scope("no tag"), None);
    }

    #[test]
    fn test_render_sample() {
        let entries = vec![
            ("A.jpg".to_string(), "Ants".to_string()),
            ("B.jpg".to_string(), "Bees".to_string()),
        ];
        assert_eq!(
            render_sample(&entries),
            "<gallery>\nFile:A.jpg|Ants\nFile:B.jpg|Bees\n</gallery>"
        );
        assert_eq!(render_sample(&[]), "<gallery>\n</gallery>");
    }
}
