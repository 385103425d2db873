//! Code-likelihood scoring for messages that carry no fences.
//!
//! This is a classifier, not a parser. The contract is the scoring rule
//! below; false positives and negatives are expected.
//!
//! | Indicator | Weight |
//! |---|---|
//! | `import`, `from … import`, `#include`, `using` | 2 |
//! | `def`, `class`, `function`, `fn` declarations | 2 |
//! | `if`/`for`/`while`/`return`/`switch` at statement start | 1 |
//! | function call `ident(` | 1 |
//! | assignment or `const`/`let`/`var` | 1 |
//! | comment markers `//`, `#` at line start, `/* */` | 1 |
//! | braces and semicolons ≥ 5% of non-space characters | 2 |
//!
//! A message is code when its score reaches [`CODE_THRESHOLD`], when it is a
//! single line longer than [`LONG_LINE_CHARS`] containing structural
//! punctuation, or when at least half of its first [`STATEMENT_SAMPLE`]
//! non-empty lines look like statements.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const CODE_THRESHOLD: u32 = 4;
pub const LONG_LINE_CHARS: usize = 80;
pub const STATEMENT_SAMPLE: usize = 8;
pub const DENSITY_THRESHOLD: f64 = 0.05;

const STRUCTURAL_PUNCTUATION: &[char] = &['{', '}', ';', '(', ')', '='];

const STATEMENT_KEYWORDS: &[&str] = &[
    "import", "from", "#include", "using", "def", "class", "function", "fn", "pub", "const",
    "let", "var", "if", "else", "elif", "for", "while", "return", "switch", "case", "try",
    "catch", "public", "private", "static",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Import,
    Declaration,
    ControlFlow,
    Call,
    Assignment,
    Comment,
    PunctuationDensity,
}

impl Indicator {
    pub const ALL: [Indicator; 7] = [
        Indicator::Import,
        Indicator::Declaration,
        Indicator::ControlFlow,
        Indicator::Call,
        Indicator::Assignment,
        Indicator::Comment,
        Indicator::PunctuationDensity,
    ];

    pub const fn weight(self) -> u32 {
        match self {
            Self::Import | Self::Declaration | Self::PunctuationDensity => 2,
            Self::ControlFlow | Self::Call | Self::Assignment | Self::Comment => 1,
        }
    }

    fn found_in(self, text: &str) -> bool {
        match self {
            Self::Import => IMPORT.is_match(text),
            Self::Declaration => DECLARATION.is_match(text),
            Self::ControlFlow => CONTROL_FLOW.is_match(text),
            Self::Call => CALL.is_match(text),
            Self::Assignment => ASSIGNMENT.is_match(text),
            Self::Comment => COMMENT.is_match(text),
            Self::PunctuationDensity => punctuation_density(text) >= DENSITY_THRESHOLD,
        }
    }
}

static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(import\s+[\w{*"']|from\s+\S+\s+import\s|#include\s*[<"]|using\s+[\w.:]+\s*;)"#)
        .expect("valid import pattern")
});

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(export\s+)?(async\s+)?(def\s+\w+\s*\(|class\s+\w+|function\b|(pub(\(\w+\))?\s+)?fn\s+\w+)")
        .expect("valid declaration pattern")
});

static CONTROL_FLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(\}\s*)?(if|for|while|return|switch)\b").expect("valid control flow pattern")
});

static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z_][\w.]*\(").expect("valid call pattern"));

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(\b(const|let|var)\s+\w+|^\s*[A-Za-z_][\w.\[\]]*\s*[+\-*/]?=[^=])")
        .expect("valid assignment pattern")
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)(^\s*//|\s//\s|^\s*#[^#\s]|^\s*#\s|/\*.*?\*/)").expect("valid comment pattern")
});

/// Share of non-whitespace characters that are `{`, `}` or `;`
pub fn punctuation_density(text: &str) -> f64 {
    let mut total = 0usize;
    let mut structural = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if matches!(c, '{' | '}' | ';') {
            structural += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        structural as f64 / total as f64
    }
}

/// Score and the indicators that contributed to it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeScore {
    pub score: u32,
    pub indicators: Vec<Indicator>,
}

pub fn score(text: &str) -> CodeScore {
    let indicators: Vec<Indicator> = Indicator::ALL
        .into_iter()
        .filter(|indicator| indicator.found_in(text))
        .collect();

    CodeScore {
        score: indicators.iter().map(|i| i.weight()).sum(),
        indicators,
    }
}

/// Whether one line reads like a statement or declaration
///
/// A line ending in `:` only counts when `next`, the following non-empty
/// line, is indented deeper. `Pros:` over a flush list is prose.
pub fn is_statement_line(line: &str, next: Option<&str>) -> bool {
    let indent = indentation(line);
    let line = line.trim();
    if line.is_empty() {
        return false;
    }

    if line.ends_with([';', '{', '}']) {
        return true;
    }

    if line.ends_with(':') && next.is_some_and(|next| indentation(next) > indent) {
        return true;
    }

    let first_word = line
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    STATEMENT_KEYWORDS.contains(&first_word)
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

pub fn looks_like_code(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }

    let result = score(trimmed);
    if result.score >= CODE_THRESHOLD {
        tracing::debug!(score = result.score, indicators = ?result.indicators, "Unfenced message scored as code");
        return true;
    }

    if !trimmed.contains('\n')
        && trimmed.chars().count() > LONG_LINE_CHARS
        && trimmed.contains(STRUCTURAL_PUNCTUATION)
    {
        return true;
    }

    let sample: Vec<&str> = trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(STATEMENT_SAMPLE)
        .collect();

    // One line ending in ':' is a sentence, not a program
    if sample.len() < 2 {
        return false;
    }

    let statements = sample
        .iter()
        .enumerate()
        .filter(|(i, line)| is_statement_line(line, sample.get(i + 1).copied()))
        .count();
    statements * 2 >= sample.len()
}
