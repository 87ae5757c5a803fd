//! The builtin tag surface.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::RenderContext;

use super::definition::{TagDefinition, TagInvocation};

/// CSS color names accepted by `[color]`. Sorted for binary search.
const COLOR_NAMES: &[&str] = &[
    "aqua",
    "aquamarine",
    "beige",
    "black",
    "blue",
    "brown",
    "chocolate",
    "coral",
    "crimson",
    "cyan",
    "darkblue",
    "darkgray",
    "darkgreen",
    "darkgrey",
    "darkorange",
    "darkred",
    "darkviolet",
    "fuchsia",
    "gold",
    "gray",
    "green",
    "grey",
    "hotpink",
    "indigo",
    "khaki",
    "lavender",
    "lightblue",
    "lightgray",
    "lightgreen",
    "lightgrey",
    "lime",
    "magenta",
    "maroon",
    "navy",
    "olive",
    "orange",
    "orangered",
    "orchid",
    "pink",
    "plum",
    "purple",
    "rebeccapurple",
    "red",
    "royalblue",
    "salmon",
    "seagreen",
    "sienna",
    "silver",
    "skyblue",
    "slateblue",
    "slategray",
    "slategrey",
    "steelblue",
    "tan",
    "teal",
    "tomato",
    "turquoise",
    "violet",
    "wheat",
    "white",
    "yellow",
    "yellowgreen",
];

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap());

/// YouTube video id, either bare or inside a watch/share URL.
static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9_-]{11}|.*(?:v=|youtu\.be/|/embed/)([A-Za-z0-9_-]{11}).*)$").unwrap()
});

/// All builtin tag definitions, aliases included.
pub(crate) fn builtin_definitions() -> Vec<TagDefinition> {
    let color = TagDefinition::dynamic("color", color_open, color_close);
    let center = TagDefinition::wrapper("center", r#"<div style="text-align:center">"#, "</div>");

    let mut defs = vec![
        TagDefinition::wrapper("b", "<b>", "</b>"),
        TagDefinition::wrapper("i", "<i>", "</i>"),
        TagDefinition::wrapper("u", "<u>", "</u>"),
        TagDefinition::wrapper("s", "<s>", "</s>"),
        TagDefinition::wrapper("sub", "<sub>", "</sub>"),
        TagDefinition::wrapper("sup", "<sup>", "</sup>"),
        TagDefinition::wrapper("mark", "<mark>", "</mark>"),
        TagDefinition::wrapper("h1", "<h1>", "</h1>").trim_contents(),
        TagDefinition::wrapper("h2", "<h2>", "</h2>").trim_contents(),
        TagDefinition::wrapper("h3", "<h3>", "</h3>").trim_contents(),
        TagDefinition::wrapper("justify", r#"<div style="text-align:justify">"#, "</div>"),
        TagDefinition::wrapper("right", r#"<div style="text-align:right">"#, "</div>"),
        TagDefinition::wrapper("indent", r#"<div class="bb-indent">"#, "</div>"),
        TagDefinition::wrapper("pre", "<pre>", "</pre>")
            .no_parse()
            .trim_contents(),
        TagDefinition::wrapper("code", r#"<pre><code class="bb-code">"#, "</code></pre>")
            .no_parse()
            .trim_contents(),
        TagDefinition::wrapper("noparse", "", "").no_parse(),
        TagDefinition::wrapper("list", r#"<ul class="bb-list">"#, "</ul>")
            .trim_contents()
            .restrict_children_to(["*"]),
        TagDefinition::wrapper("*", "<li>", "</li>")
            .trim_contents()
            .restrict_parents_to(["list"]),
        TagDefinition::dynamic("table", table_open, table_close)
            .trim_contents()
            .restrict_children_to(["row"]),
        TagDefinition::dynamic("row", row_open, row_close)
            .suppress_content()
            .trim_contents()
            .restrict_parents_to(["table"])
            .restrict_children_to(["cell"]),
        TagDefinition::wrapper("cell", "<td>", "</td>")
            .trim_contents()
            .restrict_parents_to(["row"]),
        TagDefinition::dynamic("quote", quote_open, quote_close).trim_contents(),
        TagDefinition::dynamic("url", url_open, url_close),
        TagDefinition::dynamic("img", img_open, empty_close)
            .no_parse()
            .suppress_content()
            .trim_contents(),
        TagDefinition::dynamic("youtube", youtube_open, empty_close)
            .no_parse()
            .suppress_content()
            .trim_contents(),
        TagDefinition::dynamic("abbr", abbr_open, abbr_close),
        TagDefinition::dynamic("hider", hider_open, hider_close).trim_contents(),
    ];
    defs.push(color.aliased_as("colour"));
    defs.push(color);
    defs.push(center.aliased_as("centre"));
    defs.push(center);
    defs
}

fn empty_close(_inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    String::new()
}

fn color_open(inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
    let value = inv.params.trim();
    if value.is_empty() {
        ctx.tag_error(format!("[{}] requires a color value.", inv.name));
        return String::new();
    }
    if !is_valid_color(value) {
        ctx.tag_error(format!(
            "\"{value}\" is not a valid [{}] value.",
            inv.name
        ));
        return String::new();
    }
    format!(r#"<span style="color:{}">"#, value.to_ascii_lowercase())
}

fn color_close(_inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    "</span>".to_owned()
}

fn is_valid_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
        || COLOR_NAMES
            .binary_search(&value.to_ascii_lowercase().as_str())
            .is_ok()
}

fn table_open(_inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    r#"<table class="bb-table">"#.to_owned()
}

fn table_close(_inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
    // Re-arm so a following table gets a header row of its own.
    ctx.header_row_pending = true;
    "</table>".to_owned()
}

/// Rows carry their cells in the body (content display is suppressed) so
/// the first row of a table can rewrite them into header cells.
fn row_open(inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
    if ctx.header_row_pending {
        ctx.header_row_pending = false;
        let cells = inv.body.replace("<td>", "<th>").replace("</td>", "</th>");
        format!("<tr>{cells}")
    } else {
        format!("<tr>{}", inv.body)
    }
}

fn row_close(_inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    "</tr>".to_owned()
}

fn quote_open(inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    let source = inv.params.trim();
    if source.is_empty() {
        return r#"<blockquote class="bb-quote">"#.to_owned();
    }
    format!(r#"<blockquote class="bb-quote"><div class="bb-quote-source">{source} wrote:</div>"#)
}

fn quote_close(_inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    "</blockquote>".to_owned()
}

fn url_open(inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
    let href = if inv.params.is_empty() {
        inv.body.trim()
    } else {
        inv.params.trim()
    };
    if href.is_empty() {
        ctx.tag_error("[url] requires a link target.");
        return String::new();
    }
    if !is_safe_url(href) {
        ctx.tag_error(format!("\"{href}\" is not a valid [url] target."));
        return String::new();
    }
    format!(r#"<a href="{href}">"#)
}

fn url_close(_inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    "</a>".to_owned()
}

/// Only plain web schemes; rejects `javascript:` and anything that could
/// break out of the attribute.
fn is_safe_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let scheme_ok = lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("ftp://");
    scheme_ok
        && url
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '"' | '\'' | '<' | '>'))
}

fn img_open(inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
    let src = inv.body.trim();
    if !is_safe_url(src) {
        ctx.tag_error("[img] requires a valid image URL.");
        return String::new();
    }
    format!(r#"<img class="bb-image" src="{src}" alt="">"#)
}

fn youtube_open(inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
    let Some(id) = youtube_id(inv.body.trim()) else {
        ctx.tag_error("[youtube] requires a video id or video URL.");
        return String::new();
    };
    format!(
        r#"<iframe class="bb-youtube" width="560" height="315" src="https://www.youtube.com/embed/{id}" allowfullscreen></iframe>"#
    )
}

fn youtube_id(value: &str) -> Option<&str> {
    let caps = YOUTUBE_ID.captures(value)?;
    Some(caps.get(1).map_or(value, |m| m.as_str()))
}

fn abbr_open(inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
    let full = inv.params.trim();
    if full.is_empty() {
        ctx.tag_error("[abbr] requires the full form as a parameter.");
        return String::new();
    }
    format!(r#"<abbr title="{full}">"#)
}

fn abbr_close(_inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    "</abbr>".to_owned()
}

fn hider_open(inv: &TagInvocation<'_>, ctx: &mut RenderContext) -> String {
    let label = if inv.params.trim().is_empty() {
        "Spoiler"
    } else {
        inv.params.trim()
    };
    let index = ctx.next_hider_index();
    format!(r#"<details class="bb-hider" id="hider-{index}"><summary>{label}</summary>"#)
}

fn hider_close(_inv: &TagInvocation<'_>, _ctx: &mut RenderContext) -> String {
    "</details>".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv<'a>(name: &'a str, params: &'a str, body: &'a str) -> TagInvocation<'a> {
        TagInvocation { name, params, body }
    }

    #[test]
    fn test_color_names_sorted_for_binary_search() {
        let mut sorted = COLOR_NAMES.to_vec();
        sorted.sort_unstable();
        assert_eq!(COLOR_NAMES, sorted.as_slice());
    }

    #[test]
    fn test_color_accepts_names_and_hex() {
        assert!(is_valid_color("red"));
        assert!(is_valid_color("RebeccaPurple"));
        assert!(is_valid_color("#fff"));
        assert!(is_valid_color("#00ff00"));
        assert!(!is_valid_color("notacolor"));
        assert!(!is_valid_color("#12345"));
        assert!(!is_valid_color("red; background:url(x)"));
    }

    #[test]
    fn test_color_open_reports_invalid_value() {
        let mut ctx = RenderContext::new();
        let html = color_open(&inv("color", "notacolor", "x"), &mut ctx);
        assert_eq!(html, "");
        let errors = ctx.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("notacolor"));
    }

    #[test]
    fn test_url_rejects_javascript_scheme() {
        let mut ctx = RenderContext::new();
        let html = url_open(&inv("url", "javascript:alert(1)", "x"), &mut ctx);
        assert_eq!(html, "");
        assert!(!ctx.into_errors().is_empty());
    }

    #[test]
    fn test_url_uses_body_when_no_params() {
        let mut ctx = RenderContext::new();
        let html = url_open(&inv("url", "", "https://a.test/x"), &mut ctx);
        assert_eq!(html, r#"<a href="https://a.test/x">"#);
    }

    #[test]
    fn test_youtube_id_extraction() {
        assert_eq!(youtube_id("dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(
            youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_id("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(youtube_id("not a video"), None);
    }

    #[test]
    fn test_quote_attribution_header() {
        let mut ctx = RenderContext::new();
        let html = quote_open(&inv("quote", "@bob", ""), &mut ctx);
        assert!(html.contains("@bob wrote:"));
    }

    #[test]
    fn test_first_row_becomes_header() {
        let mut ctx = RenderContext::new();
        let first = row_open(&inv("row", "", "<td>a</td>"), &mut ctx);
        assert_eq!(first, "<tr><th>a</th>");
        let second = row_open(&inv("row", "", "<td>b</td>"), &mut ctx);
        assert_eq!(second, "<tr><td>b</td>");
        table_close(&inv("table", "", ""), &mut ctx);
        let next_table = row_open(&inv("row", "", "<td>c</td>"), &mut ctx);
        assert_eq!(next_table, "<tr><th>c</th>");
    }

    #[test]
    fn test_hider_ids_unique() {
        let mut ctx = RenderContext::new();
        let a = hider_open(&inv("hider", "", ""), &mut ctx);
        let b = hider_open(&inv("hider", "Lore", ""), &mut ctx);
        assert!(a.contains(r#"id="hider-0""#));
        assert!(b.contains(r#"id="hider-1""#));
        assert!(b.contains("<summary>Lore</summary>"));
    }

    #[test]
    fn test_builtin_set_is_buildable() {
        let registry = crate::tag::TagRegistry::build(builtin_definitions()).unwrap();
        for name in [
            "b", "i", "u", "s", "sub", "sup", "color", "colour", "center", "centre", "quote",
            "url", "img", "list", "*", "table", "row", "cell", "code", "pre", "noparse", "hider",
            "youtube", "abbr", "mark", "indent", "h1", "h2", "h3", "justify", "right",
        ] {
            assert!(registry.contains(name), "missing builtin tag [{name}]");
        }
    }
}
