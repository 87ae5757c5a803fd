//! Forum markup rendering.
//!
//! Converts bracket-tag markup (`[b]`, `[quote=@name]`, `[list]`, ...) to
//! sanitized HTML. All input is HTML-escaped up front; tags render through
//! a registry of [`TagDefinition`]s that callers can extend. Structural
//! problems never abort a render: misplaced or unbalanced tags degrade to
//! their literal source and the problems are reported alongside the HTML.
//!
//! ```
//! use fora_markup::MarkupEngine;
//!
//! let engine = MarkupEngine::new();
//! let result = engine.render_markup("[quote=@ada]so it goes[/quote]");
//! assert!(result.html.contains("<blockquote"));
//! assert!(!result.error);
//! ```
//!
//! The quote-aware scanners ([`extract_top_level_mentions`],
//! [`snip_nested_quotes`]) operate on raw markup and are independent of
//! the engine.

mod context;
mod depth;
mod engine;
mod escape;
mod normalize;
mod oracle;
mod post;
mod render;
mod scan;
mod smilies;
mod tag;
mod validate;

pub use fora_linkify::Linkifier;

pub use crate::context::RenderContext;
pub use crate::engine::{MarkupEngine, ParseResult};
pub use crate::escape::escape_html;
pub use crate::oracle::UnameOracle;
pub use crate::scan::{
    extract_top_level_mentions, extract_top_level_quote_mentions, snip_nested_quotes,
};
pub use crate::smilies::SMILEY_CODES;
pub use crate::tag::{
    RegistryError, RenderFn, TagDefinition, TagInvocation, TagRegistry, TagRender,
};
