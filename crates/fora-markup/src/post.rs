//! Post-processing pipeline over rendered HTML.
//!
//! Fixed, order-dependent rewrites: horizontal rules, greentext styling,
//! smileys, mention linking, optional bare-URL auto-linking, then
//! whitespace normalization. Each step is independent of the tag grammar;
//! they all operate on the finished HTML.

use std::sync::LazyLock;

use fora_linkify::Linkifier;
use regex::{Captures, Regex};

use crate::context::RenderContext;
use crate::escape::literal_token;
use crate::oracle::UnameOracle;
use crate::smilies::replace_smilies;

/// A line whose first character was an escaped `>`.
static GREENTEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(&gt;[^\n]*)").unwrap());

/// `[@name]` in its escaped form.
static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#91;@([A-Za-z0-9_.\-]+(?: [A-Za-z0-9_.\-]+)*)&#93;").unwrap()
});

/// Three or more consecutive newlines.
static EXTRA_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// A depth-annotated token that survived rendering. Clean output has none.
static LEFTOVER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)\d+:([a-z0-9*]+)((?:=[^<>]*)?)>").unwrap());

/// Settings for one pass over the rendered HTML.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PostOptions {
    /// Run the bare-URL auto-linker.
    pub autolink: bool,
    /// Wrap blank-line separated chunks in `<p>` elements instead of
    /// turning every newline into `<br>`.
    pub paragraphs: bool,
}

/// Apply the full post-processing pipeline.
pub(crate) fn finish(
    html: String,
    ctx: &mut RenderContext,
    oracle: Option<&dyn UnameOracle>,
    linkifier: &Linkifier,
    options: PostOptions,
) -> String {
    let html = html.replace("&#91;hr&#93;", "<hr>");
    let html = GREENTEXT
        .replace_all(&html, "<span class=\"bb-greentext\">$1</span>")
        .into_owned();
    let html = replace_smilies(&html);
    let html = link_mentions(&html, oracle);
    let html = if options.autolink {
        linkifier.linkify(&html)
    } else {
        html
    };
    let html = normalize_whitespace(&html, options.paragraphs);
    misalignment_check(html, ctx)
}

/// Link `[@name]` tokens whose name the oracle confirms. Without an oracle
/// (preview rendering) every mention links.
fn link_mentions(html: &str, oracle: Option<&dyn UnameOracle>) -> String {
    if !html.contains("&#91;@") {
        return html.to_owned();
    }
    MENTION
        .replace_all(html, |caps: &Captures<'_>| {
            let uname = &caps[1];
            if oracle.is_none_or(|o| o.exists(uname)) {
                let slug = uname.to_ascii_lowercase().replace(' ', "-");
                format!(r#"<a class="bb-mention" href="/members/{slug}">@{uname}</a>"#)
            } else {
                caps[0].to_owned()
            }
        })
        .into_owned()
}

fn normalize_whitespace(html: &str, paragraphs: bool) -> String {
    let html = html.replace('\r', "").replace('\t', " ");
    let html = EXTRA_BLANK_LINES.replace_all(&html, "\n\n");
    if paragraphs {
        let mut out = String::with_capacity(html.len() + 16);
        for chunk in html.split("\n\n") {
            let chunk = chunk.trim_matches('\n');
            if chunk.is_empty() {
                continue;
            }
            out.push_str("<p>");
            out.push_str(&chunk.replace('\n', "<br>"));
            out.push_str("</p>");
        }
        out
    } else {
        html.replace('\n', "<br>")
    }
}

/// Convert any leftover annotated tokens to literals and queue the generic
/// misalignment error. Idempotent: clean output passes through unchanged.
pub(crate) fn misalignment_check(html: String, ctx: &mut RenderContext) -> String {
    if !LEFTOVER_TOKEN.is_match(&html) {
        return html;
    }
    ctx.misalignment_error();
    LEFTOVER_TOKEN
        .replace_all(&html, |caps: &Captures<'_>| {
            literal_token(&caps[1] == "/", &caps[2], caps.get(3).map_or("", |m| m.as_str()))
        })
        .into_owned()
}
