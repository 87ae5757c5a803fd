//! Tag definitions: rendering behavior and structural rules for one tag.

use crate::context::RenderContext;

/// A single occurrence of a tag, as seen by its render functions.
///
/// `body` is the already-rendered content for ordinary tags, or the literal
/// (escaped) content for no-parse tags. `params` is the text after the `=`
/// in the opening token, empty when none was given.
#[derive(Debug, Clone, Copy)]
pub struct TagInvocation<'a> {
    pub name: &'a str,
    pub params: &'a str,
    pub body: &'a str,
}

/// Render function for one side of a tag pair.
pub type RenderFn = fn(&TagInvocation<'_>, &mut RenderContext) -> String;

/// How a tag turns into HTML.
///
/// Most tags are plain wrappers around fixed strings; tags that inspect
/// their parameters or body use render functions instead.
#[derive(Debug, Clone)]
pub enum TagRender {
    /// Fixed opening and closing HTML.
    Wrapper {
        open: &'static str,
        close: &'static str,
    },
    /// Computed opening and closing HTML.
    Dynamic { open: RenderFn, close: RenderFn },
}

impl TagRender {
    pub(crate) fn open(&self, inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
        match self {
            Self::Wrapper { open, .. } => (*open).to_owned(),
            Self::Dynamic { open, .. } => open(inv, ctx),
        }
    }

    pub(crate) fn close(&self, inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
        match self {
            Self::Wrapper { close, .. } => (*close).to_owned(),
            Self::Dynamic { close, .. } => close(inv, ctx),
        }
    }
}

/// Definition of one tag: identity, rendering, and structural rules.
///
/// Construct with [`TagDefinition::wrapper`] or [`TagDefinition::dynamic`]
/// and refine with the builder methods:
///
/// ```
/// use fora_markup::TagDefinition;
///
/// let spoiler = TagDefinition::wrapper("spoiler", "<span class=\"spoiler\">", "</span>")
///     .trim_contents();
/// assert_eq!(spoiler.name(), "spoiler");
/// ```
#[derive(Debug, Clone)]
pub struct TagDefinition {
    name: String,
    render: TagRender,
    trim_contents: bool,
    display_content: bool,
    no_parse: bool,
    restrict_children_to: Vec<String>,
    restrict_parents_to: Vec<String>,
}

impl TagDefinition {
    /// A tag that wraps its body in fixed opening and closing HTML.
    #[must_use]
    pub fn wrapper(name: &str, open: &'static str, close: &'static str) -> Self {
        Self::with_render(name, TagRender::Wrapper { open, close })
    }

    /// A tag whose HTML is computed from its parameters and body.
    #[must_use]
    pub fn dynamic(name: &str, open: RenderFn, close: RenderFn) -> Self {
        Self::with_render(name, TagRender::Dynamic { open, close })
    }

    fn with_render(name: &str, render: TagRender) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            render,
            trim_contents: false,
            display_content: true,
            no_parse: false,
            restrict_children_to: Vec::new(),
            restrict_parents_to: Vec::new(),
        }
    }

    /// Strip leading and trailing whitespace from the body before rendering.
    #[must_use]
    pub fn trim_contents(mut self) -> Self {
        self.trim_contents = true;
        self
    }

    /// The body is a parameter (image URL, video id) rather than content:
    /// render functions still receive it, but it is not emitted.
    #[must_use]
    pub fn suppress_content(mut self) -> Self {
        self.display_content = false;
        self
    }

    /// The body is opaque literal text; nested tags inside it are not
    /// rendered.
    #[must_use]
    pub fn no_parse(mut self) -> Self {
        self.no_parse = true;
        self
    }

    /// Only the named tags may appear as direct children.
    #[must_use]
    pub fn restrict_children_to<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.restrict_children_to = lowercase_all(names);
        self
    }

    /// This tag may only appear directly inside the named tags.
    #[must_use]
    pub fn restrict_parents_to<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.restrict_parents_to = lowercase_all(names);
        self
    }

    /// Reuse this definition under another name (e.g. `colour` for `color`).
    #[must_use]
    pub fn aliased_as(&self, name: &str) -> Self {
        let mut alias = self.clone();
        alias.name = name.to_ascii_lowercase();
        alias
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn render(&self) -> &TagRender {
        &self.render
    }

    pub(crate) fn trims_contents(&self) -> bool {
        self.trim_contents
    }

    pub(crate) fn displays_content(&self) -> bool {
        self.display_content
    }

    pub(crate) fn is_no_parse(&self) -> bool {
        self.no_parse
    }

    pub(crate) fn children_allowed(&self) -> &[String] {
        &self.restrict_children_to
    }

    pub(crate) fn parents_allowed(&self) -> &[String] {
        &self.restrict_parents_to
    }
}

fn lowercase_all<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().to_ascii_lowercase())
        .collect()
}
