//! Inside-out rendering of depth-annotated tag spans.
//!
//! Children are rendered before their parent's render functions run, so a
//! tag's functions always see fully rendered content. A tag occurrence
//! whose functions report a semantic error is emitted as its escaped
//! literal source around the rendered body, keeping the post readable.

use crate::context::RenderContext;
use crate::depth::{Pair, split_first_pair};
use crate::escape::literal_token;
use crate::tag::{TagInvocation, TagRegistry};

/// Render every annotated pair in the fragment. Unannotated tokens pass
/// through untouched for the misalignment pass.
pub(crate) fn render_fragment(
    text: &str,
    registry: &TagRegistry,
    ctx: &mut RenderContext,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((prefix, pair, after)) = split_first_pair(rest) {
        out.push_str(prefix);
        out.push_str(&render_span(&pair, registry, ctx));
        rest = after;
    }
    out.push_str(rest);
    out
}

fn render_span(pair: &Pair<'_>, registry: &TagRegistry, ctx: &mut RenderContext) -> String {
    let Some(def) = registry.get(pair.name) else {
        // Annotated tokens always come from the registry; degrade anyway.
        return fallback_literal(pair, pair.body);
    };

    let body = if def.is_no_parse() {
        pair.body.to_owned()
    } else {
        render_fragment(pair.body, registry, ctx)
    };
    let body: &str = if def.trims_contents() {
        body.trim()
    } else {
        &body
    };

    let invocation = TagInvocation {
        name: pair.name,
        params: pair.params.strip_prefix('=').unwrap_or(pair.params),
        body,
    };
    let ((open, close), errored) = ctx.scoped_tag_errors(|ctx| {
        let open = def.render().open(&invocation, ctx);
        let close = def.render().close(&invocation, ctx);
        (open, close)
    });

    if errored {
        fallback_literal(pair, body)
    } else if def.displays_content() {
        format!("{open}{body}{close}")
    } else {
        format!("{open}{close}")
    }
}

fn fallback_literal(pair: &Pair<'_>, body: &str) -> String {
    format!(
        "{}{body}{}",
        literal_token(false, pair.name, pair.params),
        literal_token(true, pair.name, "")
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::depth::annotate;
    use crate::escape::{escape, neutralize_no_parse};
    use crate::tag::builtin_definitions;

    fn registry() -> TagRegistry {
        TagRegistry::build(builtin_definitions()).unwrap()
    }

    fn render(markup: &str) -> (String, Vec<String>) {
        let reg = registry();
        let mut ctx = RenderContext::new();
        let text = escape(markup, &reg);
        let text = neutralize_no_parse(&text, &reg);
        let text = annotate(&text);
        let html = render_fragment(&text, &reg, &mut ctx);
        (html, ctx.into_errors())
    }

    #[test]
    fn test_simple_wrapper() {
        let (html, errors) = render("[b]hi[/b]");
        assert_eq!(html, "<b>hi</b>");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_nested_renders_inside_out() {
        let (html, _) = render("[quote][b]x[/b][/quote]");
        assert_eq!(
            html,
            "<blockquote class=\"bb-quote\"><b>x</b></blockquote>"
        );
    }

    #[test]
    fn test_color_error_falls_back_to_literal() {
        let (html, errors) = render("[color=notacolor]x[/color]");
        assert_eq!(html, "&#91;color=notacolor&#93;x&#91;/color&#93;");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_valid_color() {
        let (html, errors) = render("[color=red]x[/color]");
        assert_eq!(html, "<span style=\"color:red\">x</span>");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_img_body_not_displayed() {
        let (html, errors) = render("[img]https://a.test/x.png[/img]");
        assert_eq!(html, "<img class=\"bb-image\" src=\"https://a.test/x.png\" alt=\"\">");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_code_body_is_literal() {
        let (html, errors) = render("[code][b]x[/b][/code]");
        assert_eq!(
            html,
            "<pre><code class=\"bb-code\">&#91;b&#93;x&#91;/b&#93;</code></pre>"
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_trim_contents() {
        let (html, _) = render("[h1]  title  [/h1]");
        assert_eq!(html, "<h1>title</h1>");
    }

    #[test]
    fn test_table_first_row_header() {
        let (html, errors) = render(
            "[table][row][cell]h[/cell][/row][row][cell]d[/cell][/row][/table]",
        );
        assert_eq!(
            html,
            "<table class=\"bb-table\"><tr><th>h</th></tr><tr><td>d</td></tr></table>"
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unmatched_tokens_pass_through() {
        let (html, errors) = render("[b]x");
        assert_eq!(html, "<b>x");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_url_with_body_target() {
        let (html, _) = render("[url]https://a.test/x[/url]");
        assert_eq!(html, "<a href=\"https://a.test/x\">https://a.test/x</a>");
    }

    #[test]
    fn test_url_error_preserves_literal() {
        let (html, errors) = render("[url=javascript:alert(1)]x[/url]");
        assert_eq!(html, "&#91;url=javascript:alert(1)&#93;x&#91;/url&#93;");
        assert_eq!(errors.len(), 1);
    }
}
