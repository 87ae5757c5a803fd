//! Bare-URL auto-linking for rendered forum posts.
//!
//! Scans already-rendered HTML for URLs that were typed as plain text and
//! wraps them in anchors. Links pointing at a foreign host are tagged with
//! `rel="nofollow"` and open in a new tab; links back into the forum's own
//! host are left as plain anchors.
//!
//! URLs that are already part of an anchor (either the `href` attribute or
//! the link text) are left alone: a candidate only matches when preceded by
//! the start of input, whitespace, or an opening parenthesis.
//!
//! # Example
//!
//! ```
//! use fora_linkify::Linkifier;
//!
//! let linkifier = Linkifier::new().with_site_host("forum.example.com");
//! let html = linkifier.linkify("see https://forum.example.com/thread/9");
//! assert_eq!(
//!     html,
//!     "see <a href=\"https://forum.example.com/thread/9\">https://forum.example.com/thread/9</a>"
//! );
//! ```

use std::sync::LazyLock;

use regex::Regex;

/// Candidate URL: scheme through the longest run of non-delimiter characters.
/// Trailing punctuation is trimmed separately so `(see https://x.test/a).`
/// links `https://x.test/a` only.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(^|[\s(])((?:https?|ftp)://[^\s<>"]+)"#).unwrap()
});

/// Punctuation that ends a sentence rather than a URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '\''];

/// Auto-linker with optional same-host detection.
#[derive(Debug, Default, Clone)]
pub struct Linkifier {
    site_host: Option<String>,
}

impl Linkifier {
    /// Create a linkifier that treats every URL as external.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the forum's own host. Links to it (with or without a `www.`
    /// prefix) are rendered as plain anchors without `rel="nofollow"`.
    #[must_use]
    pub fn with_site_host(mut self, host: impl Into<String>) -> Self {
        self.site_host = Some(host.into().to_ascii_lowercase());
        self
    }

    /// Wrap bare URLs in the input with anchor tags.
    #[must_use]
    pub fn linkify(&self, html: &str) -> String {
        URL_PATTERN
            .replace_all(html, |caps: &regex::Captures<'_>| {
                let lead = &caps[1];
                let (url, rest) = trim_trailing_punctuation(&caps[2]);
                format!("{lead}{}{rest}", self.anchor_for(url))
            })
            .into_owned()
    }

    fn anchor_for(&self, url: &str) -> String {
        if self.is_same_host(url) {
            format!(r#"<a href="{url}">{url}</a>"#)
        } else {
            format!(r#"<a href="{url}" rel="nofollow" target="_blank">{url}</a>"#)
        }
    }

    fn is_same_host(&self, url: &str) -> bool {
        let Some(site) = self.site_host.as_deref() else {
            return false;
        };
        url_host(url).is_some_and(|host| {
            let host = host.to_ascii_lowercase();
            strip_www(&host) == strip_www(site)
        })
    }
}

/// Extract the host portion of a URL: everything between `://` and the
/// first `/`, `:`, `?`, or `#`.
fn url_host(url: &str) -> Option<&str> {
    let after_scheme = url.split_once("://")?.1;
    let end = after_scheme
        .find(['/', ':', '?', '#'])
        .unwrap_or(after_scheme.len());
    let host = &after_scheme[..end];
    (!host.is_empty()).then_some(host)
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Split a candidate match into the URL proper and any trailing sentence
/// punctuation that should stay outside the anchor.
fn trim_trailing_punctuation(candidate: &str) -> (&str, &str) {
    let trimmed = candidate.trim_end_matches(TRAILING_PUNCTUATION);
    // A closing paren stays in the URL when the URL also contains an opening
    // one (common with wiki links).
    let trimmed = if candidate[trimmed.len()..].starts_with(')') && trimmed.contains('(') {
        &candidate[..=trimmed.len()]
    } else {
        trimmed
    };
    (trimmed, &candidate[trimmed.len()..])
}
