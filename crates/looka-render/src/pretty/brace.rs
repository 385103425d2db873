/// Comment syntax understood by the brace re-indenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/* */` only (CSS)
    Block,
    /// `/* */` and `//`
    BlockAndLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    Str(char),
    LineComment,
    BlockComment,
}

/// Line-breaking and re-indentation by brace depth
///
/// Outside strings, comments and parentheses a line break follows `{` and
/// `;` and surrounds `}` (a `;` or `,` right after `}` stays on its line,
/// as does a trailing `//` comment). Existing line breaks are kept, runs of
/// blank lines collapse to one, and every line is re-indented by the brace
/// depth at its start. Text inside strings and comments is never altered.
pub fn pretty_braces(source: &str, comments: CommentStyle, indent_unit: &str) -> String {
    Reindenter::new(comments, indent_unit).run(source)
}

struct Reindenter<'a> {
    comments: CommentStyle,
    indent_unit: &'a str,
    lines: Vec<String>,
    current: String,
    /// Brace depth when the first character of `current` was pushed
    line_depth: usize,
    depth: usize,
    parens: usize,
    mode: Mode,
    /// A break is owed after `{`, `;` or `}` unless the line continues with `;`, `,` or `//`
    pending_break: bool,
    newlines: usize,
}

impl<'a> Reindenter<'a> {
    fn new(comments: CommentStyle, indent_unit: &'a str) -> Self {
        Self {
            comments,
            indent_unit,
            lines: Vec::new(),
            current: String::new(),
            line_depth: 0,
            depth: 0,
            parens: 0,
            mode: Mode::Code,
            pending_break: false,
            newlines: 0,
        }
    }

    fn run(mut self, source: &str) -> String {
        let chars: Vec<char> = source.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            match self.mode {
                Mode::Str(quote) => {
                    self.push(c);
                    if c == '\\' {
                        if let Some(escaped) = next {
                            self.push(escaped);
                            i += 1;
                        }
                    } else if c == quote {
                        self.mode = Mode::Code;
                    }
                }
                Mode::LineComment => {
                    if c == '\n' {
                        self.mode = Mode::Code;
                        self.newline();
                    } else {
                        self.push(c);
                    }
                }
                Mode::BlockComment => {
                    if c == '\n' {
                        self.newline();
                    } else if c == '*' && next == Some('/') {
                        self.push('*');
                        self.push('/');
                        i += 1;
                        self.mode = Mode::Code;
                    } else if !(c.is_whitespace() && self.current.is_empty()) {
                        self.push(c);
                    }
                }
                Mode::Code => self.code(c, next, &mut i),
            }

            i += 1;
        }

        self.flush();
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        self.lines.join("\n")
    }

    fn code(&mut self, c: char, next: Option<char>, i: &mut usize) {
        if c == '\n' {
            self.newline();
            return;
        }

        if self.pending_break {
            match c {
                ' ' | '\t' | '\r' => return,
                ';' | ',' => {
                    self.push(c);
                    return;
                }
                '/' if next == Some('/') && self.comments == CommentStyle::BlockAndLine => {
                    self.current.push(' ');
                }
                _ => self.flush(),
            }
        }

        match c {
            '"' | '\'' | '`' => {
                self.push(c);
                self.mode = Mode::Str(c);
            }
            '/' if next == Some('*') => {
                self.push('/');
                self.push('*');
                *i += 1;
                self.mode = Mode::BlockComment;
            }
            '/' if next == Some('/') && self.comments == CommentStyle::BlockAndLine => {
                self.push('/');
                self.push('/');
                *i += 1;
                self.mode = Mode::LineComment;
            }
            '(' | '[' => {
                self.parens += 1;
                self.push(c);
            }
            ')' | ']' => {
                self.parens = self.parens.saturating_sub(1);
                self.push(c);
            }
            '{' => {
                self.push(c);
                self.depth += 1;
                if self.parens == 0 {
                    self.pending_break = true;
                }
            }
            '}' => {
                if self.parens == 0 {
                    self.flush();
                }
                self.depth = self.depth.saturating_sub(1);
                self.push(c);
                if self.parens == 0 {
                    self.pending_break = true;
                }
            }
            ';' => {
                self.push(c);
                if self.parens == 0 {
                    self.pending_break = true;
                }
            }
            ' ' | '\t' | '\r' if self.current.is_empty() => {}
            _ => self.push(c),
        }
    }

    fn push(&mut self, c: char) {
        if self.current.is_empty() {
            self.line_depth = self.depth;
        }
        self.current.push(c);
        self.newlines = 0;
    }

    fn newline(&mut self) {
        if self.current.is_empty() {
            self.newlines += 1;
            if self.newlines == 2 && self.lines.last().is_some_and(|l| !l.is_empty()) {
                self.lines.push(String::new());
            }
        } else {
            self.flush();
            self.newlines = 1;
        }
    }

    fn flush(&mut self) {
        self.pending_break = false;
        let line = self.current.trim_end();
        if !line.is_empty() {
            self.lines
                .push(format!("{}{}", self.indent_unit.repeat(self.line_depth), line));
        }
        self.current.clear();
        self.newlines = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(source: &str) -> String {
        pretty_braces(source, CommentStyle::BlockAndLine, "    ")
    }

    fn css(source: &str) -> String {
        pretty_braces(source, CommentStyle::Block, "  ")
    }

    #[test]
    fn test_minified_script() {
        let pretty = script("function f(a){if(a){return 1;}else{return 2;}}");

        assert_eq!(
            pretty,
            "function f(a){\n    if(a){\n        return 1;\n    }\n    else{\n        return 2;\n    }\n}"
        );
        assert_eq!(script(&pretty), pretty);
    }

    #[test]
    fn test_parentheses_protect_semicolons() {
        let pretty = script("for (let i = 0; i < n; i++) { total += i; }");

        assert_eq!(pretty, "for (let i = 0; i < n; i++) {\n    total += i;\n}");
    }

    #[test]
    fn test_callback_inside_call() {
        let source = "items.forEach(function (x) {\nconsole.log(x);\n});";
        let pretty = script(source);

        assert_eq!(pretty, "items.forEach(function (x) {\n    console.log(x);\n});");
        assert_eq!(script(&pretty), pretty);
    }

    #[test]
    fn test_strings_and_comments_untouched() {
        let pretty = script("let s = \"a;{b}\"; // keep; this\nlet t = 'x';");

        assert_eq!(pretty, "let s = \"a;{b}\"; // keep; this\nlet t = 'x';");
    }

    #[test]
    fn test_object_literal_close_keeps_semicolon() {
        let pretty = script("const o = {a: 1};");

        assert_eq!(pretty, "const o = {\n    a: 1\n};");
        assert_eq!(script(&pretty), pretty);
    }

    #[test]
    fn test_css() {
        let pretty = css("a{color:red;background:blue}b{margin:0}");

        assert_eq!(pretty, "a{\n  color:red;\n  background:blue\n}\nb{\n  margin:0\n}");
        assert_eq!(css(&pretty), pretty);
    }

    #[test]
    fn test_css_url_is_not_a_comment() {
        let pretty = css("a{background:url(http://x.io/a.png);}");

        assert_eq!(pretty, "a{\n  background:url(http://x.io/a.png);\n}");
    }

    #[test]
    fn test_blank_lines_collapse() {
        let pretty = script("a();\n\n\n\nb();\n");

        assert_eq!(pretty, "a();\n\nb();");
        assert_eq!(script(&pretty), pretty);
    }

    #[test]
    fn test_block_comment_lines() {
        let pretty = script("/*\n * doc\n */\nfn x() {}");

        assert_eq!(pretty, "/*\n* doc\n*/\nfn x() {\n}");
        assert_eq!(script(&pretty), pretty);
    }
}
