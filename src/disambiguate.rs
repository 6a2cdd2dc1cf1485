//! Single-dollar span classification.
//!
//! Every `$…$` span left after masking is either inline math (kept) or stray literal dollars
//! (both delimiters escaped). The decision looks at the span's interior only.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

static AMOUNT_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:,\d{3})*(?:\.\d{2})?$").unwrap());
static MATH_OPERATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+\-*/=<>^_{}()]").unwrap());
static LETTERS_AND_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z].*\d|\d.*[a-zA-Z]").unwrap());
static GREEK_MACRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:alpha|beta|gamma|delta|epsilon|theta|lambda|mu|pi|sigma|omega)").unwrap()
});
static FUNCTION_MACRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:frac|sqrt|sum|int|lim|log|ln|sin|cos|tan|exp)").unwrap()
});

/// Byte range of one `$…$` span, delimiters included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DollarSpan {
    pub start: usize,
    pub end: usize,
}

impl DollarSpan {
    pub fn as_str(self, text: &str) -> &str {
        &text[self.start..self.end]
    }

    /// The text between the delimiters.
    pub fn inner(self, text: &str) -> &str {
        &text[self.start + 1..self.end - 1]
    }
}

/// Finds single-dollar spans left to right.
///
/// The opening `$` must not be escaped, doubled, or directly followed by another `$`. The span
/// closes at the next unescaped `$` on the same line (escaped `\$` may sit inside), which must
/// not be followed by `$`; if it is, no span opens at that position and the scan moves on.
pub fn inline_math_spans(text: &str) -> Vec<DollarSpan> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'$' || !is_opener(bytes, i) {
            i += 1;
            continue;
        }
        match find_closer(bytes, i + 1) {
            Some(j) => {
                out.push(DollarSpan { start: i, end: j + 1 });
                i = j + 1;
            }
            None => i += 1,
        }
    }
    out
}

fn is_opener(bytes: &[u8], i: usize) -> bool {
    let prev_ok = i == 0 || !matches!(bytes[i - 1], b'\\' | b'$');
    prev_ok && bytes.get(i + 1) != Some(&b'$')
}

/// Position of the first unescaped `$` from `from` on, provided it comes before any newline and
/// is not the start of `$$`.
fn find_closer(bytes: &[u8], from: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b'\n' => return None,
            b'$' if bytes[j - 1] == b'\\' => {}
            b'$' => return (bytes.get(j + 1) != Some(&b'$')).then_some(j),
            _ => {}
        }
        j += 1;
    }
    None
}

/// True when the interior of a `$…$` span reads as math.
///
/// Only a bare single-digit amount with no other signal is treated as literal text; everything
/// else, including single-letter variables, stays math.
pub fn is_math(interior: &str) -> bool {
    if interior.trim().is_empty() {
        return true;
    }
    let has_signal = interior.contains('\\')
        || MATH_OPERATOR.is_match(interior)
        || LETTERS_AND_DIGITS.is_match(interior)
        || GREEK_MACRO.is_match(interior)
        || FUNCTION_MACRO.is_match(interior)
        || interior.chars().count() > 1;
    has_signal || !AMOUNT_ONLY.is_match(interior.trim())
}

/// A `$…$` span together with its classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedSpan {
    pub span: DollarSpan,
    pub is_math: bool,
}

/// Classifies every span of `text`, skipping spans that contain a placeholder token.
pub fn classify_spans(text: &str, sentinel: char) -> Vec<ClassifiedSpan> {
    inline_math_spans(text)
        .into_iter()
        .filter(|span| !span.as_str(text).contains(sentinel))
        .map(|span| ClassifiedSpan {
            span,
            is_math: is_math(span.inner(text)),
        })
        .collect()
}

/// Escapes both delimiters of every span that does not read as math.
pub fn disambiguate(text: &str, sentinel: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut escaped = 0usize;
    for classified in classify_spans(text, sentinel) {
        if classified.is_math {
            continue;
        }
        let span = classified.span;
        out.push_str(&text[cursor..span.start]);
        out.push_str("\\$");
        out.push_str(span.inner(text));
        out.push_str("\\$");
        cursor = span.end;
        escaped += 1;
    }
    out.push_str(&text[cursor..]);
    trace!(escaped, "escaped literal dollar spans");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_spans_and_skips_escaped_or_doubled_dollars() {
        let text = r"a $x$ b \$y$ c $$ d $z$";
        let spans: Vec<&str> = inline_math_spans(text)
            .into_iter()
            .map(|s| s.as_str(text))
            .collect();
        assert_eq!(spans, vec!["$x$", "$z$"]);
    }

    #[test]
    fn escaped_dollars_may_sit_inside_a_span() {
        let text = r"$a \$5 b$";
        let spans = inline_math_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].inner(text), r"a \$5 b");
    }

    #[test]
    fn span_does_not_cross_a_newline() {
        assert!(inline_math_spans("$a\nb$").is_empty());
    }

    #[test]
    fn single_letters_and_expressions_are_math() {
        assert!(is_math("x"));
        assert!(is_math("x^2"));
        assert!(is_math(r"\alpha"));
        assert!(is_math("10"));
    }

    #[test]
    fn lone_digit_is_literal() {
        assert!(!is_math("5"));
        assert_eq!(disambiguate("pay $5$ now", '\u{E000}'), r"pay \$5\$ now");
    }
}
