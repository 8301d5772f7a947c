use crate::types::{Span, TemplateInstance};
use std::borrow::Cow;
use std::collections::BTreeMap;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// `{{ ... }}`
    Template,
    /// `[[ ... ]]`
    Link,
    /// `{{{ ... }}}` parameter reference, kept as literal text
    Argument,
}

#[derive(Debug)]
struct Segment {
    start: usize,
    /// First `=` at this template's own nesting level
    eq: Option<usize>,
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    start: usize,
    segments: Vec<Segment>,
}

impl Frame {
    fn open(kind: FrameKind, start: usize, body_start: usize) -> Self {
        Self {
            kind,
            start,
            segments: vec![Segment {
                start: body_start,
                eq: None,
            }],
        }
    }
}

/// Extract every template instance from `text`, in document order.
///
/// Nested templates are emitted as their own instances while their markup
/// remains inside the parent's parameter value. Comments are skipped while
/// scanning and stripped from returned values. Frames left open at the end
/// of the input are dropped; everything closed before them is returned.
#[must_use]
pub fn extract(text: &str) -> Vec<TemplateInstance> {
    let bytes = text.as_bytes();
    let mut stack: Vec<Frame> = Vec::new();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];

        if rest.starts_with(COMMENT_OPEN.as_bytes()) {
            i = find_from(bytes, i + COMMENT_OPEN.len(), COMMENT_CLOSE.as_bytes())
                .map_or(bytes.len(), |close| close + COMMENT_CLOSE.len());
            continue;
        }

        if rest.starts_with(b"{{{") && !rest.starts_with(b"{{{{") {
            stack.push(Frame::open(FrameKind::Argument, i, i + 3));
            i += 3;
            continue;
        }

        if rest.starts_with(b"{{") {
            stack.push(Frame::open(FrameKind::Template, i, i + 2));
            i += 2;
            continue;
        }

        if rest.starts_with(b"[[") {
            stack.push(Frame::open(FrameKind::Link, i, i + 2));
            i += 2;
            continue;
        }

        if rest.starts_with(b"}}") {
            let top = stack.last().map(|f| f.kind);
            if top == Some(FrameKind::Argument) && rest.starts_with(b"}}}") {
                stack.pop();
                i += 3;
                continue;
            }
            if let Some(pos) = stack.iter().rposition(|f| f.kind == FrameKind::Template) {
                // Unclosed links/arguments inside the template are abandoned.
                stack.truncate(pos + 1);
                if let Some(frame) = stack.pop() {
                    let end = i + 2;
                    if let Some(instance) = build_instance(text, &frame, end) {
                        found.push(instance);
                    }
                    i = end;
                    continue;
                }
            }
            i += 2;
            continue;
        }

        if rest.starts_with(b"]]") {
            if stack.last().map(|f| f.kind) == Some(FrameKind::Link) {
                stack.pop();
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        match bytes[i] {
            b'|' => {
                if let Some(frame) = stack.last_mut() {
                    if frame.kind == FrameKind::Template {
                        frame.segments.push(Segment {
                            start: i + 1,
                            eq: None,
                        });
                    }
                }
            }
            b'=' => {
                if let Some(frame) = stack.last_mut() {
                    if frame.kind == FrameKind::Template && frame.segments.len() > 1 {
                        if let Some(segment) = frame.segments.last_mut() {
                            segment.eq.get_or_insert(i);
                        }
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    let unclosed = stack
        .iter()
        .filter(|f| f.kind == FrameKind::Template)
        .count();
    if unclosed > 0 {
        log::debug!("Discarding {unclosed} unclosed template(s)");
    }

    found.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then_with(|| b.span.end.cmp(&a.span.end))
    });
    found
}

/// First template in document order whose name matches `name`
#[must_use]
pub fn find_template(text: &str, name: &str) -> Option<TemplateInstance> {
    extract(text).into_iter().find(|t| t.is_named(name))
}

/// Remove `<!-- ... -->` spans; an unterminated comment runs to the end
#[must_use]
pub fn strip_comments(text: &str) -> Cow<'_, str> {
    if !text.contains(COMMENT_OPEN) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(COMMENT_OPEN) {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + COMMENT_OPEN.len()..];
        match after_open.find(COMMENT_CLOSE) {
            Some(close) => rest = &after_open[close + COMMENT_CLOSE.len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn build_instance(text: &str, frame: &Frame, end: usize) -> Option<TemplateInstance> {
    let body_end = end - 2;
    let bounds: Vec<usize> = frame
        .segments
        .iter()
        .skip(1)
        // each later segment starts right after its pipe
        .map(|s| s.start - 1)
        .chain(std::iter::once(body_end))
        .collect();

    let name_segment = &frame.segments[0];
    let name = clean(&text[name_segment.start..bounds[0]]);
    if name.is_empty() {
        return None;
    }

    let mut positional_params = Vec::new();
    let mut named_params = BTreeMap::new();
    for (segment, seg_end) in frame.segments.iter().zip(bounds.iter()).skip(1) {
        let raw = &text[segment.start..*seg_end];
        match segment.eq {
            Some(eq) => {
                let key = clean(&text[segment.start..eq]);
                if key.is_empty() {
                    positional_params.push(clean(raw));
                } else {
                    named_params.insert(key, clean(&text[eq + 1..*seg_end]));
                }
            }
            None => positional_params.push(clean(raw)),
        }
    }

    Some(TemplateInstance {
        name,
        positional_params,
        named_params,
        span: Span::new(frame.start, end),
    })
}

fn clean(raw: &str) -> String {
    strip_comments(raw).trim().to_string()
}

fn find_from(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_named_and_positional() {
        let found = extract("{{VI| Birds |Commons| status = ok }}");
        assert_eq!(found.len(), 1);
        let vi = &found[0];
        assert_eq!(vi.name, "VI");
        assert_eq!(vi.positional_params, vec!["Birds", "Commons"]);
        assert_eq!(vi.named("status"), Some("ok"));
    }

    #[test]
    fn test_nested_templates_are_emitted_and_kept_literal() {
        let text = "{{VIC|scope={{w|Passer domesticus}} in flight|image=Bird.jpg}}";
        let found = extract(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "VIC");
        assert_eq!(
            found[0].named("scope"),
            Some("{{w|Passer domesticus}} in flight")
        );
        assert_eq!(found[1].name, "w");
        assert_eq!(found[1].positional(1), Some("Passer domesticus"));
        assert!(found[0].span.contains(&found[1].span));
    }

    #[test]
    fn test_link_pipes_do_not_split_parameters() {
        let found = extract("{{VIC|nominator=[[User:Alice|Alice]] ([[User talk:Alice|talk]])}}");
        assert_eq!(
            found[0].named("nominator"),
            Some("[[User:Alice|Alice]] ([[User talk:Alice|talk]])")
        );
        assert!(found[0].positional_params.is_empty());
    }

    #[test]
    fn test_equals_inside_nested_markup_is_not_a_name() {
        let found = extract("{{VI|[[Target|a=b]]|{{x|k=v}}}}");
        let vi = found.iter().find(|t| t.is_named("vi")).unwrap();
        assert_eq!(vi.positional_params, vec!["[[Target|a=b]]", "{{x|k=v}}"]);
        assert!(vi.named_params.is_empty());
    }

    #[test]
    fn test_comments_are_stripped_and_ignored_for_depth() {
        let text = "{{VIC|image=Bird.jpg<!-- }} not a close -->|scope=Birds <!-- {{ -->}}";
        let found = extract(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].named("image"), Some("Bird.jpg"));
        assert_eq!(found[0].named("scope"), Some("Birds"));
        assert_eq!(found[0].span, Span::new(0, text.len()));
    }

    #[test]
    fn test_last_named_occurrence_wins() {
        let found = extract("{{VIC|scope=first|scope=second}}");
        assert_eq!(found[0].named("scope"), Some("second"));
    }

    #[test]
    fn test_unclosed_input_keeps_closed_instances() {
        let found = extract("{{done|1}} {{VIC|image=Bird.jpg|scope={{w|Birds}}");
        let names: Vec<_> = found.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["done", "w"]);
    }

    #[test]
    fn test_stray_closers_are_literal() {
        let found = extract("}} ]] {{VI|x}}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, Span::new(6, 14));
    }

    #[test]
    fn test_argument_references_are_literal() {
        let found = extract("{{VI|{{{1|default}}}|b}}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].positional_params, vec!["{{{1|default}}}", "b"]);
    }

    #[test]
    fn test_multiline_template() {
        let text = "intro\n{{VIC\n |image=Bird.jpg\n |scope=Birds\n |review=\n}}\ntail";
        let vic = find_template(text, "VIC").unwrap();
        assert_eq!(vic.named("image"), Some("Bird.jpg"));
        assert_eq!(vic.named("review"), Some(""));
        assert_eq!(&text[vic.span.start..vic.span.end], "{{VIC\n |image=Bird.jpg\n |scope=Birds\n |review=\n}}");
    }

    #[test]
    fn test_named_round_trip() {
        let original = TemplateInstance::new("VIC")
            .with_named("a", "1")
            .with_named("b", "2");
        let reparsed = find_template(&original.to_wikitext(), "VIC").unwrap();
        assert_eq!(reparsed.named_params, original.named_params);
    }

    #[test]
    fn test_empty_name_is_not_a_template() {
        assert!(extract("{{ |x}}").is_empty());
    }

    #[test]
    fn test_non_ascii_text_is_preserved() {
        let found = extract("{{VI|Vögel – Überblick|Ærø}}");
        assert_eq!(found[0].positional_params, vec!["Vögel – Überblick", "Ærø"]);
    }

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("a<!-- x -->b<!-- y"), "ab");
        assert!(matches!(strip_comments("plain"), Cow::Borrowed("plain")));
    }
}
