//! Markup stripping for incoming request bodies
//!
//! Every string value loses its tags, attributes and comments. Elements whose
//! content is never displayed as text (`script`, `style`, ...) are dropped
//! together with their content.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Paired non-text elements, content included
static NON_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<(?:script|style|textarea|option|noscript)\b[^>]*>.*?</(?:script|style|textarea|option|noscript)\s*>",
    )
    .expect("invalid non-text element regex")
});

/// Non-text element left open: everything after it is content
static UNCLOSED_NON_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:script|style|textarea|option|noscript)\b[^>]*>.*$")
        .expect("invalid unclosed element regex")
});

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").expect("invalid comment regex"));

/// Start/end tags with attributes, doctype and processing instructions
static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)</?[A-Za-z][^<>]*>|<[!?][^<>]*>").expect("invalid tag regex")
});

/// A `<` that would still open a tag once the text is rendered
static TAG_OPENER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([A-Za-z/!?])").expect("invalid tag opener regex"));

/// Strip all markup from a single string, leaving plain text.
///
/// # Example
/// ```
/// use intake_server::models::strip_markup;
///
/// assert_eq!(strip_markup("<b class=\"x\">Oi</b> tudo bem"), "Oi tudo bem");
/// assert_eq!(strip_markup("<script>alert(1)</script>"), "");
/// assert_eq!(strip_markup("2 < 3"), "2 < 3");
/// ```
pub fn strip_markup(input: &str) -> String {
    if !input.contains('<') {
        return input.to_owned();
    }

    // Removing one tag can splice its neighbours into a new one, so repeat
    // until a pass changes nothing. Every changing pass shortens the text.
    let mut text = input.to_owned();
    loop {
        let next = strip_pass(&text);
        if next == text {
            break;
        }
        text = next;
    }

    TAG_OPENER_RE.replace_all(&text, "$1").into_owned()
}

fn strip_pass(input: &str) -> String {
    let text = NON_TEXT_RE.replace_all(input, "");
    let text = UNCLOSED_NON_TEXT_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");
    TAG_RE.replace_all(&text, "").into_owned()
}

/// Strip markup from every top-level string value; other values pass through.
pub fn sanitize_fields(body: Map<String, Value>) -> Map<String, Value> {
    body.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => (key, Value::String(strip_markup(&s))),
            other => (key, other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_untouched() {
        assert_eq!(strip_markup("Preciso de um orçamento."), "Preciso de um orçamento.");
        assert_eq!(strip_markup("2 < 3 e 5 > 4"), "2 < 3 e 5 > 4");
    }

    #[test]
    fn strips_tags_and_attributes() {
        assert_eq!(
            strip_markup(r#"<p style="color:red">Olá <a href="http://x">mundo</a></p>"#),
            "Olá mundo"
        );
        assert_eq!(strip_markup("<img src=x onerror=alert(1)>foto"), "foto");
        assert_eq!(strip_markup("linha<br/>outra"), "linhaoutra");
    }

    #[test]
    fn drops_script_and_style_content() {
        assert_eq!(
            strip_markup("Oi <script>alert(1)</script>tudo <STYLE>p{}</STYLE>bem"),
            "Oi tudo bem"
        );
        assert_eq!(strip_markup("texto <script>nunca fecha"), "texto ");
    }

    #[test]
    fn spliced_tags_do_not_survive() {
        assert_eq!(strip_markup("<scr<b></b>ipt>alert(1)</script>"), "");
        assert_eq!(strip_markup("<<b>img src=x onerror=alert(1)>"), "");
        assert_eq!(
            strip_markup("Orçamento <<b>img src=x onerror=alert(1)> por favor"),
            "Orçamento  por favor"
        );
        assert_eq!(strip_markup("<<<b>b>i>x"), "x");
    }

    #[test]
    fn unterminated_tag_cannot_open() {
        let clean = strip_markup("oi <img src=x onerror=alert(1)");
        assert!(!clean.contains("<i"));
        assert_eq!(clean, "oi img src=x onerror=alert(1)");
        assert_eq!(strip_markup("a </p b"), "a /p b");
    }

    #[test]
    fn drops_comments_and_doctype() {
        assert_eq!(strip_markup("<!DOCTYPE html>a<!-- hidden -->b"), "ab");
    }

    #[test]
    fn sanitizes_only_strings() {
        let body = json!({
            "name": "<i>Ana</i>",
            "count": 3,
            "flag": true,
            "nested": {"x": "<b>kept as-is</b>"},
            "nothing": null
        });
        let Value::Object(map) = body else { unreachable!() };

        let clean = sanitize_fields(map);
        assert_eq!(clean["name"], json!("Ana"));
        assert_eq!(clean["count"], json!(3));
        assert_eq!(clean["flag"], json!(true));
        assert_eq!(clean["nested"], json!({"x": "<b>kept as-is</b>"}));
        assert_eq!(clean["nothing"], Value::Null);
    }
}
