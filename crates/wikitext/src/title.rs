use std::borrow::Cow;

/// Direction marks, zero-width characters and BOMs that editors leave in front of names
const INVISIBLE: &[char] = &[
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{200E}', '\u{200F}', '\u{202A}', '\u{202B}',
    '\u{202C}', '\u{202D}', '\u{202E}', '\u{2060}', '\u{2066}', '\u{2067}', '\u{2068}',
    '\u{2069}', '\u{FEFF}',
];

/// Strip leading invisible characters
#[must_use]
pub fn strip_invisible(text: &str) -> &str {
    text.trim_start_matches(INVISIBLE)
}

/// Canonical comparison form of a page title, filename or subpage: trimmed,
/// invisible prefix removed, spaces written as underscores
#[must_use]
pub fn normalize_title(title: &str) -> String {
    strip_invisible(title).trim().replace(' ', "_")
}

/// Compare two titles with `' '` and `'_'` treated as the same character
#[must_use]
pub fn same_title(a: &str, b: &str) -> bool {
    normalize_title(a) == normalize_title(b)
}

/// Decode the HTML character references that show up in listing pages
#[must_use]
pub fn unescape_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi))) {
            Some((decoded, semi)) => {
                out.push(decoded);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    if name.len() > 10 {
        return None;
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let numeric = name.strip_prefix('#')?;
            let code = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_title_treats_space_as_underscore() {
        assert!(same_title("Red bird.jpg", "Red_bird.jpg"));
        assert!(same_title(" Foo/1 ", "Foo/1"));
        assert!(!same_title("Red bird.jpg", "Red-bird.jpg"));
    }

    #[test]
    fn test_normalize_title_keeps_case() {
        assert_eq!(normalize_title("\u{200E} bird in flight.jpg "), "bird_in_flight.jpg");
        assert!(!same_title("bird.jpg", "Bird.jpg"));
    }

    #[test]
    fn test_strip_invisible() {
        assert_eq!(strip_invisible("\u{200E}\u{FEFF}VIC"), "VIC");
        assert_eq!(strip_invisible("VIC\u{200E}"), "VIC\u{200E}");
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(unescape_entities("Rock &amp; Roll"), "Rock & Roll");
        assert_eq!(unescape_entities("L&#39;Aquila &#x41;"), "L'Aquila A");
        assert_eq!(unescape_entities("AT&T; & more"), "AT&T; & more");
        assert!(matches!(unescape_entities("plain"), Cow::Borrowed(_)));
    }
}
