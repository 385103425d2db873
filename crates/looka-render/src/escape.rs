use regex::Regex;
use std::sync::LazyLock;

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^`])`([^`\n]+)`").expect("valid inline code pattern"));

/// Escape the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Plain message text as display markup: escaped, `inline code` wrapped,
/// newlines as `<br/>`
pub fn text_to_html(text: &str) -> String {
    let escaped = escape_html(text);
    let with_code = INLINE_CODE.replace_all(&escaped, r#"$1<code class="inline-code">$2</code>"#);
    with_code.replace('\n', "<br/>")
}
