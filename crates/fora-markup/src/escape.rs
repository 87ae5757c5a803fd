//! Injection defense: entity-escape raw HTML, then swap recognized tag
//! tokens into the internal angle form.
//!
//! After this stage the text contains no raw `<`, `>`, `[`, or `]` except
//! for internal tokens of registered tags (`<b>`, `</quote>`, ...). Later
//! stages match only those tokens, and anything left over at the end is
//! converted back to bracket-entity literals by the misalignment passes.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::context::RenderContext;
use crate::tag::TagRegistry;

/// Any internal-form token that never received a depth annotation.
static UNANNOTATED_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([a-z0-9*]+)((?:=[^<>]*)?)>").unwrap());

/// Entity for a literal `[` that is not part of a tag token.
pub(crate) const LBRACKET: &str = "&#91;";
/// Entity for a literal `]` that is not part of a tag token.
pub(crate) const RBRACKET: &str = "&#93;";

/// Escape raw HTML metacharacters and convert registered tag tokens to the
/// internal angle form. Unrecognized brackets become entities.
pub(crate) fn escape(raw: &str, registry: &TagRegistry) -> String {
    let escaped = escape_html(raw);
    let tokenized = registry
        .token_pattern()
        .replace_all(&escaped, |caps: &Captures<'_>| {
            if let Some(close_name) = caps.get(1) {
                format!("</{}>", close_name.as_str().to_ascii_lowercase())
            } else {
                format!(
                    "<{}{}>",
                    caps[2].to_ascii_lowercase(),
                    caps.get(3).map_or("", |m| m.as_str())
                )
            }
        });
    tokenized.replace('[', LBRACKET).replace(']', RBRACKET)
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Turn the bodies of no-parse spans inert: every internal token inside one
/// becomes a bracket-entity literal, so the normalizer, annotator, and
/// renderer pass over it.
pub(crate) fn neutralize_no_parse(text: &str, registry: &TagRegistry) -> String {
    let mut text = text.to_owned();
    for (name, pattern) in registry.no_parse_patterns() {
        if !text.contains(&format!("</{name}>")) {
            continue;
        }
        text = pattern
            .replace_all(&text, |caps: &Captures<'_>| {
                format!(
                    "<{name}{}>{}</{name}>",
                    &caps[1],
                    tokens_to_literals(&caps[2], registry)
                )
            })
            .into_owned();
    }
    text
}

/// Convert every internal-form token (annotated or not) back to its
/// bracket-entity literal display form.
pub(crate) fn tokens_to_literals(text: &str, registry: &TagRegistry) -> String {
    registry
        .stray_token_pattern()
        .replace_all(text, |caps: &Captures<'_>| {
            literal_token(&caps[1] == "/", &caps[2], caps.get(3).map_or("", |m| m.as_str()))
        })
        .into_owned()
}

/// Convert tokens that stayed unannotated (unmatched opens and closes,
/// crossed pairs) to bracket-entity literals before rendering, queueing
/// the generic misalignment error. After this the only internal tokens
/// left are depth-annotated pairs, which cannot be confused with the
/// renderer's HTML output.
pub(crate) fn resolve_unannotated(text: &str, ctx: &mut RenderContext) -> String {
    if !UNANNOTATED_TOKEN.is_match(text) {
        return text.to_owned();
    }
    ctx.misalignment_error();
    UNANNOTATED_TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            literal_token(&caps[1] == "/", &caps[2], caps.get(3).map_or("", |m| m.as_str()))
        })
        .into_owned()
}

/// The bracket-entity literal for one token.
pub(crate) fn literal_token(close: bool, name: &str, params: &str) -> String {
    if close {
        format!("{LBRACKET}/{name}{RBRACKET}")
    } else {
        format!("{LBRACKET}{name}{params}{RBRACKET}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tag::builtin_definitions;

    fn registry() -> TagRegistry {
        TagRegistry::build(builtin_definitions()).unwrap()
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape("hello world", &registry()), "hello world");
    }

    #[test]
    fn test_raw_html_is_neutralized() {
        assert_eq!(
            escape("<script>alert(1)</script>", &registry()),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_recognized_tags_become_angle_tokens() {
        assert_eq!(escape("[b]hi[/b]", &registry()), "<b>hi</b>");
        assert_eq!(
            escape("[quote=@bob]x[/quote]", &registry()),
            "<quote=@bob>x</quote>"
        );
    }

    #[test]
    fn test_tag_names_are_case_insensitive() {
        assert_eq!(escape("[B]hi[/B]", &registry()), "<b>hi</b>");
    }

    #[test]
    fn test_unrecognized_brackets_become_entities() {
        assert_eq!(escape("[nope] a ] b [", &registry()), "&#91;nope&#93; a &#93; b &#91;");
    }

    #[test]
    fn test_star_shorthand_recognized() {
        assert_eq!(escape("[*]item", &registry()), "<*>item");
    }

    #[test]
    fn test_neutralize_no_parse_makes_body_inert() {
        let reg = registry();
        let text = escape("[code][b]x[/b][/code]", &reg);
        let text = neutralize_no_parse(&text, &reg);
        assert_eq!(text, "<code>&#91;b&#93;x&#91;/b&#93;</code>");
    }

    #[test]
    fn test_neutralize_leaves_other_bodies_alone() {
        let reg = registry();
        let text = escape("[b][i]x[/i][/b]", &reg);
        assert_eq!(neutralize_no_parse(&text, &reg), "<b><i>x</i></b>");
    }

    #[test]
    fn test_literal_token_forms() {
        assert_eq!(literal_token(false, "color", "=red"), "&#91;color=red&#93;");
        assert_eq!(literal_token(true, "color", ""), "&#91;/color&#93;");
    }
}
