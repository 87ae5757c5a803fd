//! Nesting-depth annotation.
//!
//! Stamps every matched open/close token pair with the number of enclosing
//! tags at the point the opening token was seen: `<quote=@a>` becomes
//! `<0:quote=@a>` and its closer `</0:quote>`. Because a nested pair always
//! carries a strictly greater depth than its container, the renderer and
//! validator can pair an open with its close by exact token equality,
//! without building a tree.
//!
//! Tokens that cannot be paired (a close with no matching open, an open
//! whose close never arrives, or crossed closes) are left unannotated and
//! surface later as literal text plus the misalignment error.

use std::sync::LazyLock;

use regex::Regex;

/// Any internal-form token not yet annotated.
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([a-z0-9*]+)((?:=[^<>]*)?)>").unwrap());

/// An annotated open token.
static ANNOTATED_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\d+):([a-z0-9*]+)((?:=[^<>]*)?)>").unwrap());

/// One annotated open/close pair within a fragment.
pub(crate) struct Pair<'a> {
    pub name: &'a str,
    /// Raw parameter text including the leading `=`, or empty.
    pub params: &'a str,
    pub body: &'a str,
}

/// Split a fragment at its first annotated pair: text before the pair, the
/// pair itself, and the rest after its closer.
///
/// An annotated open whose exact closer is missing is skipped into the
/// prefix; the misalignment pass turns it into literal text later.
pub(crate) fn split_first_pair(fragment: &str) -> Option<(&str, Pair<'_>, &str)> {
    let mut offset = 0;
    while let Some(caps) = ANNOTATED_OPEN.captures(&fragment[offset..]) {
        let m = caps.get(0).unwrap();
        let (open_start, open_end) = (offset + m.start(), offset + m.end());
        let depth = caps.get(1).unwrap().as_str();
        let name = caps.get(2).unwrap().as_str();
        let params = caps.get(3).map_or("", |p| p.as_str());
        let closer = format!("</{depth}:{name}>");
        if let Some(rel) = fragment[open_end..].find(&closer) {
            let pair = Pair {
                name,
                params,
                body: &fragment[open_end..open_end + rel],
            };
            let rest = &fragment[open_end + rel + closer.len()..];
            return Some((&fragment[..open_start], pair, rest));
        }
        offset = open_end;
    }
    None
}

struct Token<'a> {
    start: usize,
    end: usize,
    close: bool,
    name: &'a str,
    params: &'a str,
}

/// Annotate matched tag pairs with their nesting depth.
pub(crate) fn annotate(text: &str) -> String {
    let tokens: Vec<Token<'_>> = TOKEN
        .captures_iter(text)
        .map(|caps| {
            let m = caps.get(0).unwrap();
            Token {
                start: m.start(),
                end: m.end(),
                close: !caps[1].is_empty(),
                name: caps.get(2).unwrap().as_str(),
                params: caps.get(3).map_or("", |p| p.as_str()),
            }
        })
        .collect();
    if tokens.is_empty() {
        return text.to_owned();
    }

    // Pair opens with closes. Stack entries: (token index, depth at push).
    let mut depths: Vec<Option<usize>> = vec![None; tokens.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.close {
            if let Some(pos) = stack.iter().rposition(|&(j, _)| tokens[j].name == token.name) {
                // Anything pushed above the match is an open without a
                // close; it stays unannotated.
                let (open_idx, depth) = stack[pos];
                stack.truncate(pos);
                depths[open_idx] = Some(depth);
                depths[i] = Some(depth);
            }
        } else {
            stack.push((i, stack.len()));
        }
    }

    let mut out = String::with_capacity(text.len() + tokens.len() * 3);
    let mut cursor = 0;
    for (token, depth) in tokens.iter().zip(&depths) {
        out.push_str(&text[cursor..token.start]);
        match (depth, token.close) {
            (Some(d), false) => {
                out.push_str(&format!("<{d}:{}{}>", token.name, token.params));
            }
            (Some(d), true) => {
                out.push_str(&format!("</{d}:{}>", token.name));
            }
            (None, _) => out.push_str(&text[token.start..token.end]),
        }
        cursor = token.end;
    }
    out.push_str(&text[cursor..]);
    out
}
