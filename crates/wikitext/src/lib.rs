//! # VIC Wikitext
//!
//! Tolerant extraction of template instances and listing lines from wiki markup.
//!
//! ## Philosophy
//!
//! The crate recognizes a small, fixed family of markup shapes and nothing more:
//! - Template instances (`{{Name|positional|key=value}}`), nested ones included
//! - Wiki links (`[[Target|label]]`), only so that their pipes do not split parameters
//! - Comments (`<!-- ... -->`), stripped from every returned value
//! - Gallery lines (`File:Name.jpg|caption`) inside `<gallery>` blocks
//!
//! Malformed input never fails: whatever was closed before the damage is returned.
//!
//! ## Architecture
//!
//! ```text
//! Raw page text
//!     │
//!     ├──> Template Extractor (single pass, frame stack)
//!     │      ├─> Track {{ }}, [[ ]], {{{ }}} nesting
//!     │      ├─> Record top-level pipes and first `=` per parameter
//!     │      └─> Emit TemplateInstance[] in document order
//!     │
//!     ├──> Scope Normalizer
//!     │      ├─> Strip link/template/quote decoration (display form)
//!     │      └─> Uppercase without apostrophes (sort key)
//!     │
//!     └──> Title helpers / Gallery lines
//!            ├─> ' ' ≡ '_' comparison, entity unescaping
//!            └─> GalleryLine view with optional move marker
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vic_wikitext::{extract, find_template};
//!
//! let text = "{{VIC|image=Bird.jpg|scope=[[Birds]]|nominator=[[User:Alice|Alice]]}}";
//! let vic = find_template(text, "vic").unwrap();
//! assert_eq!(vic.named("image"), Some("Bird.jpg"));
//! assert_eq!(vic.named("nominator"), Some("[[User:Alice|Alice]]"));
//! assert_eq!(extract(text).len(), 1);
//! ```

mod gallery;
mod parser;
mod scope;
mod title;
mod types;

pub use gallery::{directive_filename, insert_before_closing, GalleryLine, GALLERY_CLOSE, GALLERY_OPEN};
pub use parser::{extract, find_template, strip_comments};
pub use scope::{gallery_target, scrub_scope, sort_key};
pub use title::{normalize_title, same_title, strip_invisible, unescape_entities};
pub use types::{Span, TemplateInstance};
