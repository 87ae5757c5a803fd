//! Synthesizes the missing closers for the `[*]` list-item shorthand.
//!
//! Works over a bracket scratch encoding: only `list` and `*` tokens are
//! swapped back to bracket form, so a "next `[*]` or `[/list]`" scan finds
//! item boundaries without a parser. Containers are processed innermost
//! first; each finished container is swapped to angle form so it is opaque
//! to the outer passes. The loop runs to a fixed point — every iteration
//! retires one container.

use std::sync::LazyLock;

use regex::Regex;

/// Angle-form `list`/`*` tokens, for the swap into scratch form.
static SCRATCH_TO_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)(list|\*)((?:=[^<>]*)?)>").unwrap());

/// Bracket-form `list`/`*` tokens, for the swap back.
static BRACKET_TO_ANGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(/?)(list|\*)((?:=[^\[\]]*)?)\]").unwrap());

static LIST_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[list((?:=[^\[\]]*)?)\]").unwrap());

/// Give every `[*]` occurrence an explicit `[/*]` closer.
pub(crate) fn close_list_shorthand(text: &str) -> String {
    if !text.contains("<*>") && !text.contains("<list") {
        return text.to_owned();
    }

    let mut text = SCRATCH_TO_BRACKET
        .replace_all(text, "[$1$2$3]")
        .into_owned();

    // Innermost container first: the last open pairs with the first close
    // after it, with no other open in between.
    while let Some(open) = LIST_OPEN.find_iter(&text).last().map(|m| m.range()) {
        let params = text[open.start + 5..open.end - 1].to_owned();
        match text[open.end..].find("[/list]") {
            Some(rel) => {
                let close_start = open.end + rel;
                let content = close_items(&text[open.end..close_start]);
                let content = BRACKET_TO_ANGLE.replace_all(&content, "<$1$2$3>");
                let replacement = format!("<list{params}>{content}</list>");
                text.replace_range(open.start..close_start + "[/list]".len(), &replacement);
            }
            None => {
                // Unclosed container; its open falls through as a stray token.
                text.replace_range(open, &format!("<list{params}>"));
            }
        }
    }

    BRACKET_TO_ANGLE.replace_all(&text, "<$1$2$3>").into_owned()
}

/// Append `[/*]` to each item run that lacks one, immediately before the
/// next item or the end of the container content.
fn close_items(content: &str) -> String {
    let Some(first) = content.find("[*]") else {
        return content.to_owned();
    };
    let mut out = String::with_capacity(content.len() + 16);
    out.push_str(&content[..first]);
    let mut rest = &content[first + 3..];
    loop {
        match rest.find("[*]") {
            Some(pos) => {
                push_item(&mut out, &rest[..pos]);
                rest = &rest[pos + 3..];
            }
            None => {
                push_item(&mut out, rest);
                break;
            }
        }
    }
    out
}

fn push_item(out: &mut String, segment: &str) {
    out.push_str("[*]");
    out.push_str(segment);
    if !segment.contains("[/*]") {
        out.push_str("[/*]");
    }
}
