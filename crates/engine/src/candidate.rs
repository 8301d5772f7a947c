//! Candidate Resolver: turn a candidate document into a [`Candidate`].

use crate::classify::Status;
use crate::error::{EngineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use vic_wikitext::{find_template, normalize_title, scrub_scope, unescape_entities};

/// Name of the template that governs a candidate document
pub const CANDIDATE_TEMPLATE: &str = "VIC";

/// First user link in a signature; group 1 is the account name
static USER_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[(?i:user|benutzer|gebruiker):([^|\]]+)[^\]]*\]\]").expect("valid user regex")
});

/// Transclusion-control tags; their content is kept
static INCLUDE_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?\s*(?:noinclude|includeonly|onlyinclude)\s*/?>")
        .expect("valid include regex")
});

/// `{{{{VIC` or `{{VIC{{VIC`, left behind by broken preloads
static DUPLICATED_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\{\{(?:\s*VIC\s*)?\{\{(\s*VIC\s*[|}\n])").expect("valid start regex")
});

static FILE_NAMESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:file|image)\s*:\s*").expect("valid namespace regex"));

/// A nomination resolved from its document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Title of the candidate document minus the candidate prefix
    pub identifier: String,

    /// Filename without namespace
    pub image: String,

    /// Scope as written, markup included
    pub scope: String,

    /// Listing key; the image name when the document leaves it empty
    pub subpage: String,

    pub nominator_user: String,

    /// Review text, possibly empty
    pub review: String,

    pub status: Option<Status>,
}

impl Candidate {
    #[must_use]
    pub fn with_status(mut self, status: Option<Status>) -> Self {
        self.status = status;
        self
    }

    /// Keys under which listing documents may carry this candidate
    #[must_use]
    pub fn listing_keys(&self) -> Vec<String> {
        let mut keys = vec![normalize_title(&self.identifier)];
        let subpage = normalize_title(&self.subpage);
        if !keys.contains(&subpage) {
            keys.push(subpage);
        }
        keys
    }

    /// Display form of the scope
    #[must_use]
    pub fn scrubbed_scope(&self) -> String {
        scrub_scope(&self.scope).trim().to_string()
    }
}

/// Account name of the first user link in a signature
#[must_use]
pub fn parse_nominator(raw: &str) -> Option<String> {
    USER_LINK
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().replace('_', " "))
        .filter(|user| !user.is_empty())
}

/// Drop transclusion tags and collapse a duplicated template start
fn prepare_document(document: &str) -> String {
    let untagged = INCLUDE_TAGS.replace_all(document, "");
    DUPLICATED_START.replace_all(&untagged, "{{$1").into_owned()
}

/// Internal line breaks and runs of whitespace become single spaces
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve the candidate document of `identifier`.
///
/// # Errors
///
/// [`EngineError::MissingField`] naming every absent required field, or
/// [`EngineError::UnparseableNominator`] when the nominator field has no user link.
pub fn resolve(identifier: &str, document: &str) -> Result<Candidate> {
    let prepared = prepare_document(document);
    let Some(template) = find_template(&prepared, CANDIDATE_TEMPLATE) else {
        log::debug!("No {{{{{CANDIDATE_TEMPLATE}}}}} template in candidate {identifier}");
        return Err(EngineError::MissingField(
            ["scope", "nominator", "image"].map(String::from).to_vec(),
        ));
    };

    let scope = template.field("scope");
    let nominator = template.field("nominator");
    let image = template.field("image");

    let missing: Vec<String> = [("scope", scope), ("nominator", nominator), ("image", image)]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(key, _)| key.to_string())
        .collect();

    let (Some(scope), Some(nominator), Some(image)) = (scope, nominator, image) else {
        return Err(EngineError::MissingField(missing));
    };

    let nominator_user = parse_nominator(nominator)
        .ok_or_else(|| EngineError::UnparseableNominator(nominator.to_string()))?;

    let image = FILE_NAMESPACE
        .replace(&unescape_entities(image), "")
        .trim()
        .to_string();
    let subpage = template
        .field("subpage")
        .map_or_else(|| image.clone(), |s| unescape_entities(s).trim().to_string());

    Ok(Candidate {
        identifier: identifier.to_string(),
        image,
        scope: single_line(scope),
        subpage,
        nominator_user,
        review: template.named("review").unwrap_or_default().to_string(),
        status: None,
    })
}
