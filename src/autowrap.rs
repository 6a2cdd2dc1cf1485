//! Best-effort wrapping of undelimited math and chemistry in `$…$`.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

static EQUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|\s)([a-zA-Z0-9]+\s*[\^_]\s*[a-zA-Z0-9{}]+(?:\s*[+\-*/]\s*[a-zA-Z0-9]+\s*[\^_]\s*[a-zA-Z0-9{}]+)*\s*=\s*[^$\n\p{Co}]+)(?:\s|$)",
    )
    .unwrap()
});
static FRACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)(\\frac\{[^}]+\}\{[^}]+\})(?:\s|$)").unwrap());
static FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(\\(?:sqrt|int|sum|prod|lim|log|ln|sin|cos|tan|exp)\b[^$\n\p{Co}]{0,50})(?:\s|$)")
        .unwrap()
});
static CHEMICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)((?:[A-Z][a-z]?\d*(?:\([A-Z][a-z]?\d*\))?\d*(?:[+-]\d*)?)+)(?:\s|$)")
        .unwrap()
});
static MATH_SIGNAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\\^_+=<>]").unwrap());

fn looks_like_chemistry(expr: &str) -> bool {
    let uppercase = expr.chars().filter(char::is_ascii_uppercase).count();
    let lowercase = expr.chars().filter(char::is_ascii_lowercase).count();
    expr.chars().any(|c| c.is_ascii_digit())
        || expr.contains(['(', ')'])
        || (uppercase >= 2 && lowercase > 0)
}

fn should_wrap(whole: &str, expr: &str, sentinel: char) -> bool {
    if whole.contains('$') || whole.contains(sentinel) {
        return false;
    }
    let mut chars = expr.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return false;
        }
    }
    MATH_SIGNAL.is_match(expr) || looks_like_chemistry(expr)
}

fn wrap_pattern(text: &str, pattern: &Regex, sentinel: char, wrapped: &mut usize) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut cursor = 0usize;
    let mut pos = 0usize;

    // The whitespace after a candidate is not consumed, so it can lead the next candidate.
    while let Some(caps) = pattern.captures_at(text, pos) {
        let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        if should_wrap(whole.as_str(), expr.as_str().trim(), sentinel) {
            let body = expr.as_str().trim_end();
            out.push_str(&text[cursor..expr.start()]);
            out.push('$');
            out.push_str(body);
            out.push('$');
            cursor = expr.start() + body.len();
            *wrapped += 1;
        }
        pos = expr.end();
    }
    out.push_str(&text[cursor..]);
    out
}

/// Wraps equations, fraction and function invocations, and chemical formulas that are not
/// already inside dollar delimiters.
///
/// Private-use characters, which placeholder tokens are built from, end an equation or function
/// candidate just as a `$` does; a candidate that still touches a token is left alone.
pub fn auto_wrap(text: &str, sentinel: char) -> String {
    let mut wrapped = 0usize;
    let mut out = text.to_string();
    for pattern in [&*EQUATION, &*FRACTION, &*FUNCTION, &*CHEMICAL] {
        out = wrap_pattern(&out, pattern, sentinel, &mut wrapped);
    }
    trace!(wrapped, "auto-wrapped math candidates");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: char = '\u{E000}';

    #[test]
    fn wraps_chemical_formulas() {
        assert_eq!(auto_wrap("Water is H2O here", S), "Water is $H2O$ here");
        assert_eq!(auto_wrap("Salt NaCl dissolves", S), "Salt $NaCl$ dissolves");
        assert_eq!(auto_wrap("CO2 and Mg(O)2", S), "$CO2$ and $Mg(O)2$");
    }

    #[test]
    fn leaves_prose_alone() {
        assert_eq!(auto_wrap("I think OK is Fine", S), "I think OK is Fine");
    }

    #[test]
    fn wraps_equations() {
        assert_eq!(auto_wrap("so x^2 + y^2 = z^2", S), "so $x^2 + y^2 = z^2$");
        assert_eq!(auto_wrap(r"\frac{a}{b} halves", S), r"$\frac{a}{b}$ halves");
    }

    #[test]
    fn adjacent_formulas_are_all_wrapped() {
        assert_eq!(auto_wrap("CO2 NaCl", S), "$CO2$ $NaCl$");
    }

    #[test]
    fn placeholders_end_an_equation() {
        let text = format!("x^2 = 4 {S}__CURRENCY_0__{S}");
        assert_eq!(
            auto_wrap(&text, S),
            format!("$x^2 = 4$ {S}__CURRENCY_0__{S}")
        );
        let glued = format!("x^2 = 4{S}__CURRENCY_0__{S}");
        assert_eq!(auto_wrap(&glued, S), glued);
    }
}
