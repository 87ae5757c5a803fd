//! Quote-aware scanners over raw markup.
//!
//! These walk the same bracket grammar as the renderer but never render:
//! one left-to-right pass with an explicit stack of open-quote frames,
//! where "top level" means not inside any `[quote]`. They feed the
//! notification and reply features, so they run against the raw post
//! text, independent of the render pipeline.

use std::sync::LazyLock;

use regex::Regex;

/// Quote-open (with optional attribution), quote-close, or mention token.
static SCAN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\[/quote\]|\[quote(?:=([^\[\]]*))?\]|\[@([A-Za-z0-9_.\-]+(?: [A-Za-z0-9_.\-]+)*)\]",
    )
    .unwrap()
});

/// An open quote the scanner has not yet seen closed.
#[derive(Debug)]
struct QuoteStackFrame {
    start: usize,
    attributed_uname: Option<String>,
}

/// The `@name` attributed on a quote-open token, if any.
fn attributed_uname(attribution: Option<&str>) -> Option<String> {
    attribution
        .and_then(|a| a.trim().strip_prefix('@'))
        .map(|name| name.trim().to_owned())
}

/// Collect mentions that sit outside every quote.
///
/// `exclude_uname` (the post's own author) is skipped, names are
/// de-duplicated case-insensitively, and `max_count` is a hard cap that
/// stops the scan outright — it bounds notification fan-out.
#[must_use]
pub fn extract_top_level_mentions(
    text: &str,
    exclude_uname: Option<&str>,
    max_count: usize,
) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    let mut depth = 0usize;
    for caps in SCAN_TOKEN.captures_iter(text) {
        if mentions.len() >= max_count {
            break;
        }
        let token = caps.get(0).unwrap().as_str();
        if token.starts_with("[/") {
            depth = depth.saturating_sub(1);
        } else if let Some(uname) = caps.get(2) {
            if depth == 0 {
                record(&mut mentions, uname.as_str(), exclude_uname);
            }
        } else {
            depth += 1;
        }
    }
    mentions.truncate(max_count);
    mentions
}

/// Collect the usernames attributed on top-level quote-open tokens
/// (`[quote=@name]`). Same exclusion, de-duplication, and cap rules as
/// [`extract_top_level_mentions`].
#[must_use]
pub fn extract_top_level_quote_mentions(
    text: &str,
    exclude_uname: Option<&str>,
    max_count: usize,
) -> Vec<String> {
    let mut mentions: Vec<String> = Vec::new();
    let mut depth = 0usize;
    for caps in SCAN_TOKEN.captures_iter(text) {
        if mentions.len() >= max_count {
            break;
        }
        let token = caps.get(0).unwrap().as_str();
        if token.starts_with("[/") {
            depth = depth.saturating_sub(1);
        } else if caps.get(2).is_some() {
            // plain mention, not a quote token
        } else {
            if depth == 0
                && let Some(uname) = attributed_uname(caps.get(1).map(|m| m.as_str()))
            {
                record(&mut mentions, &uname, exclude_uname);
            }
            depth += 1;
        }
    }
    mentions.truncate(max_count);
    mentions
}

fn record(mentions: &mut Vec<String>, uname: &str, exclude_uname: Option<&str>) {
    if exclude_uname.is_some_and(|ex| ex.eq_ignore_ascii_case(uname)) {
        return;
    }
    if mentions.iter().any(|m| m.eq_ignore_ascii_case(uname)) {
        return;
    }
    mentions.push(uname.to_owned());
}

/// Replace each outermost quote span, header through closer, with a short
/// placeholder, deleting nested quote content entirely. Used when building
/// a reply so quotes do not pyramid.
#[must_use]
pub fn snip_nested_quotes(text: &str) -> String {
    let mut text = text.to_owned();
    let mut stack: Vec<QuoteStackFrame> = Vec::new();
    let mut cursor = 0;
    loop {
        let Some(caps) = SCAN_TOKEN.captures(&text[cursor..]) else {
            break;
        };
        let m = caps.get(0).unwrap();
        let (start, end) = (cursor + m.start(), cursor + m.end());
        let is_close = m.as_str().starts_with("[/");
        let is_mention = caps.get(2).is_some();
        let attribution = attributed_uname(caps.get(1).map(|a| a.as_str()));

        if is_mention {
            cursor = end;
        } else if is_close {
            match stack.pop() {
                Some(frame) if stack.is_empty() => {
                    let placeholder = match frame.attributed_uname {
                        Some(name) => format!("<Snipped quote by {name}>"),
                        None => "<Snipped quote>".to_owned(),
                    };
                    text.replace_range(frame.start..end, &placeholder);
                    cursor = frame.start + placeholder.len();
                }
                _ => cursor = end,
            }
        } else {
            stack.push(QuoteStackFrame {
                start,
                attributed_uname: attribution,
            });
            cursor = end;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_nested_mentions_ignored() {
        let mentions =
            extract_top_level_mentions("[@a] [quote][@b][/quote] [@c]", Some("a"), 10);
        assert_eq!(mentions, vec!["c".to_owned()]);
    }

    #[test]
    fn test_mention_cap_is_hard() {
        let mentions = extract_top_level_mentions("[@a] [@b] [@c] [@d]", None, 2);
        assert_eq!(mentions, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn test_mentions_deduplicated_case_insensitively() {
        let mentions = extract_top_level_mentions("[@Bob] [@bob] [@BOB]", None, 10);
        assert_eq!(mentions, vec!["Bob".to_owned()]);
    }

    #[test]
    fn test_stray_quote_close_does_not_underflow() {
        let mentions = extract_top_level_mentions("[/quote][@a]", None, 10);
        assert_eq!(mentions, vec!["a".to_owned()]);
    }

    #[test]
    fn test_quote_mentions_top_level_only() {
        let mentions = extract_top_level_quote_mentions(
            "[quote=@alice]x[quote=@bob]y[/quote][/quote][quote=@carol]z[/quote]",
            None,
            10,
        );
        assert_eq!(mentions, vec!["alice".to_owned(), "carol".to_owned()]);
    }

    #[test]
    fn test_freeform_attribution_not_a_mention() {
        let mentions =
            extract_top_level_quote_mentions("[quote=some book]x[/quote]", None, 10);
        assert!(mentions.is_empty());
    }

    #[test]
    fn test_snip_collapses_outer_quote() {
        assert_eq!(
            snip_nested_quotes("x[quote=@bob]y[quote]z[/quote]w[/quote]q"),
            "x<Snipped quote by bob>q"
        );
    }

    #[test]
    fn test_snip_without_attribution() {
        assert_eq!(
            snip_nested_quotes("a[quote]b[/quote]c"),
            "a<Snipped quote>c"
        );
    }

    #[test]
    fn test_snip_multiple_top_level_quotes() {
        assert_eq!(
            snip_nested_quotes("[quote]a[/quote]x[quote=@b]c[/quote]"),
            "<Snipped quote>x<Snipped quote by b>"
        );
    }

    #[test]
    fn test_snip_leaves_unclosed_quote() {
        assert_eq!(snip_nested_quotes("a[quote]b"), "a[quote]b");
    }

    #[test]
    fn test_snip_freeform_attribution() {
        assert_eq!(
            snip_nested_quotes("[quote=the manual]rtfm[/quote]"),
            "<Snipped quote>"
        );
    }

    #[test]
    fn test_snip_no_quotes_is_noop() {
        assert_eq!(snip_nested_quotes("hello [@a]"), "hello [@a]");
    }
}
