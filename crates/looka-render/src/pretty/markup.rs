/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is kept as a single text node
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

const INDENT: &str = "  ";

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Open { name: String, text: &'a str },
    Close { text: &'a str },
    /// Void, self-closing, comment, doctype or processing instruction
    Leaf(&'a str),
    Text(&'a str),
}

/// One tag or text node per line, indented by nesting depth
///
/// Tags are copied verbatim; text nodes are trimmed. A stray closing tag
/// never takes the depth below zero.
pub fn pretty_markup(source: &str) -> String {
    let mut lines = Vec::new();
    let mut depth = 0usize;

    for token in tokenize(source) {
        match token {
            Token::Open { text, .. } => {
                lines.push(indent(depth, text));
                depth += 1;
            }
            Token::Close { text } => {
                depth = depth.saturating_sub(1);
                lines.push(indent(depth, text));
            }
            Token::Leaf(text) => lines.push(indent(depth, text)),
            Token::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    lines.push(indent(depth, text));
                }
            }
        }
    }

    lines.join("\n")
}

fn indent(depth: usize, text: &str) -> String {
    format!("{}{}", INDENT.repeat(depth), text)
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];

        if !rest.starts_with('<') {
            let end = rest.find('<').unwrap_or(rest.len());
            tokens.push(Token::Text(&rest[..end]));
            pos += end;
            continue;
        }

        if rest.starts_with("<!--") {
            let end = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            tokens.push(Token::Leaf(&rest[..end]));
            pos += end;
            continue;
        }

        let end = tag_end(rest);
        let tag = &rest[..end];
        pos += end;

        if tag.starts_with("</") {
            tokens.push(Token::Close { text: tag });
            continue;
        }
        if tag.starts_with("<!") || tag.starts_with("<?") || tag.ends_with("/>") {
            tokens.push(Token::Leaf(tag));
            continue;
        }

        let name = tag_name(tag);
        if VOID_ELEMENTS.contains(&name.as_str()) {
            tokens.push(Token::Leaf(tag));
            continue;
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let closing = format!("</{}", name);
            let body_end = source[pos..]
                .to_ascii_lowercase()
                .find(&closing)
                .unwrap_or(source.len() - pos);
            tokens.push(Token::Open { name, text: tag });
            tokens.push(Token::Text(&source[pos..pos + body_end]));
            pos += body_end;
            continue;
        }

        tokens.push(Token::Open { name, text: tag });
    }

    tokens
}

/// Byte length of the tag starting at `rest`, quotes respected
fn tag_end(rest: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in rest.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    rest.len()
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting() {
        let pretty = pretty_markup("<div class=\"a\"><p>Hello <b>you</b></p><br><img src=\"x\"/></div>");

        assert_eq!(
            pretty,
            "<div class=\"a\">\n  <p>\n    Hello\n    <b>\n      you\n    </b>\n  </p>\n  <br>\n  <img src=\"x\"/>\n</div>"
        );
        assert_eq!(pretty_markup(&pretty), pretty);
    }

    #[test]
    fn test_comments_and_doctype_do_not_nest() {
        let pretty = pretty_markup("<!DOCTYPE html><html><!-- note --><body></body></html>");

        assert_eq!(
            pretty,
            "<!DOCTYPE html>\n<html>\n  <!-- note -->\n  <body>\n  </body>\n</html>"
        );
    }

    #[test]
    fn test_script_body_kept_whole() {
        let pretty = pretty_markup("<script>if (a < b) { go(); }</script>");

        assert_eq!(pretty, "<script>\n  if (a < b) { go(); }\n</script>");
        assert_eq!(pretty_markup(&pretty), pretty);
    }

    #[test]
    fn test_quoted_angle_bracket_in_attribute() {
        let pretty = pretty_markup("<a title=\"x > y\">t</a>");

        assert_eq!(pretty, "<a title=\"x > y\">\n  t\n</a>");
    }

    #[test]
    fn test_stray_close_tag() {
        assert_eq!(pretty_markup("</div><p>x</p>"), "</div>\n<p>\n  x\n</p>");
    }
}
