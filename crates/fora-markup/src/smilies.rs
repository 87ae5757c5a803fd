//! The fixed smiley vocabulary.

/// Short codes recognized as `:code:`. The code doubles as the image name.
pub const SMILEY_CODES: &[&str] = &[
    "smile",
    "sad",
    "wink",
    "grin",
    "tongue",
    "surprised",
    "cool",
    "mad",
    "confused",
    "cry",
    "lol",
    "heart",
    "rolleyes",
    "thumbsup",
    "thumbsdown",
];

fn smiley_img(code: &str) -> String {
    format!(r#"<img class="bb-smiley" src="/images/smilies/{code}.png" alt=":{code}:" title=":{code}:">"#)
}

/// Replace every `:code:` occurrence from the fixed vocabulary.
pub(crate) fn replace_smilies(html: &str) -> String {
    let mut html = html.to_owned();
    if !html.contains(':') {
        return html;
    }
    for code in SMILEY_CODES {
        let token = format!(":{code}:");
        if html.contains(&token) {
            html = html.replace(&token, &smiley_img(code));
        }
    }
    html
}
