//! Escaping for the two places a payload can be embedded.

use std::borrow::Cow;

/// Makes JSON safe to place inside a `<script>` element.
///
/// `</` becomes `<\/` so the payload cannot close the element, and `<!--`
/// becomes `\u003c!--` so it cannot open a comment. Both rewrites are valid
/// JSON escapes and parse back to the original text.
#[must_use]
pub fn escape_script(json: &str) -> Cow<'_, str> {
    if !json.contains("</") && !json.contains("<!--") {
        return Cow::Borrowed(json);
    }
    Cow::Owned(json.replace("<!--", "\\u003c!--").replace("</", "<\\/"))
}

/// Escapes text for a single or double quoted HTML attribute.
#[must_use]
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '\'', '"', '<', '>']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
