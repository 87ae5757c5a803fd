//! The markup engine: pipeline orchestration and public entry points.

use fora_linkify::Linkifier;
use tracing::debug;

use crate::context::RenderContext;
use crate::oracle::UnameOracle;
use crate::post::{self, PostOptions};
use crate::tag::{RegistryError, TagDefinition, TagRegistry, builtin_definitions};
use crate::{depth, escape, normalize, render, validate};

/// The outcome of rendering one piece of markup.
///
/// `error` is true exactly when `error_queue` is non-empty. Errors never
/// abort rendering; `html` is always the best-effort output.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseResult {
    pub html: String,
    pub error: bool,
    pub error_queue: Vec<String>,
}

impl ParseResult {
    fn new(html: String, error_queue: Vec<String>) -> Self {
        Self {
            html,
            error: !error_queue.is_empty(),
            error_queue,
        }
    }
}

/// Markup-to-HTML rendering engine.
///
/// Holds the compiled tag registry and the injected collaborators. Parsing
/// takes `&self` and keeps all scratch state in a per-call context, so one
/// engine can serve concurrent requests; extending the registry takes
/// `&mut self` and therefore cannot race a parse.
///
/// # Example
///
/// ```
/// use fora_markup::MarkupEngine;
///
/// let engine = MarkupEngine::new();
/// let result = engine.render_markup("[b]hi[/b]");
/// assert_eq!(result.html, "<b>hi</b>");
/// assert!(!result.error);
/// ```
pub struct MarkupEngine {
    registry: TagRegistry,
    oracle: Option<Box<dyn UnameOracle + Send + Sync>>,
    linkifier: Linkifier,
}

impl Default for MarkupEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupEngine {
    /// Engine over the builtin tag surface.
    #[must_use]
    pub fn new() -> Self {
        let registry =
            TagRegistry::build(builtin_definitions()).expect("builtin tag registry is well formed");
        Self {
            registry,
            oracle: None,
            linkifier: Linkifier::new(),
        }
    }

    /// Inject the member-existence oracle consulted for `[@name]` linking.
    /// Without one (preview rendering), every mention links.
    #[must_use]
    pub fn with_oracle(mut self, oracle: impl UnameOracle + Send + Sync + 'static) -> Self {
        self.oracle = Some(Box::new(oracle));
        self
    }

    /// Set the forum's own host for auto-link classification; see
    /// [`Linkifier::with_site_host`].
    #[must_use]
    pub fn with_site_host(mut self, host: impl Into<String>) -> Self {
        self.linkifier = Linkifier::new().with_site_host(host);
        self
    }

    /// Merge additional tag definitions into the registry and rebuild its
    /// derived structures.
    pub fn add_tags<I>(&mut self, definitions: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = TagDefinition>,
    {
        self.registry.extend(definitions)
    }

    #[must_use]
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// Render markup to sanitized HTML. Newlines become `<br>`; bare URLs
    /// are left as text.
    #[must_use]
    pub fn render_markup(&self, raw: &str) -> ParseResult {
        self.render_with(
            raw,
            PostOptions {
                autolink: false,
                paragraphs: false,
            },
        )
    }

    /// Render a top-level post: same pipeline plus bare-URL auto-linking
    /// and paragraph-preserving whitespace wrapping.
    #[must_use]
    pub fn render_post(&self, raw: &str) -> ParseResult {
        self.render_with(
            raw,
            PostOptions {
                autolink: true,
                paragraphs: true,
            },
        )
    }

    fn render_with(&self, raw: &str, options: PostOptions) -> ParseResult {
        debug!(bytes = raw.len(), "rendering markup");
        let mut ctx = RenderContext::new();

        let text = escape::escape(raw, &self.registry);
        let text = escape::neutralize_no_parse(&text, &self.registry);
        let text = normalize::close_list_shorthand(&text);
        let text = depth::annotate(&text);
        validate::validate(&self.registry, &text, &mut ctx);
        let text = escape::resolve_unannotated(&text, &mut ctx);
        let html = render::render_fragment(&text, &self.registry, &mut ctx);
        let html = post::finish(
            html,
            &mut ctx,
            self.oracle.as_deref().map(|o| o as &dyn UnameOracle),
            &self.linkifier,
            options,
        );

        let result = ParseResult::new(html, ctx.into_errors());
        if result.error {
            debug!(errors = result.error_queue.len(), "markup rendered with errors");
        }
        result
    }
}
