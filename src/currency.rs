//! Currency literal extraction.
//!
//! Amounts such as `$5`, `-$3.25`, `($12.50)`, `$1,299.99`, `$1.2k` or `$3 million`, and ranges
//! such as `$5-$10` / `$5 – $10`, are replaced by placeholder tokens so the math passes never see
//! their `$`.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::placeholder::{PlaceholderKind, PlaceholderMap};

static AMOUNT_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d{1,3}(?:,\d{3})*(?:\.\d+)?(?:\s?[KMBkmb]|[Kk]ilo|[Mm]illion|[Bb]illion)?$")
        .unwrap()
});

/// True when `body` (the text between two `$`) is nothing but an amount, e.g. `1,000` or `5k`.
pub fn looks_like_amount(body: &str) -> bool {
    AMOUNT_BODY.is_match(body)
}

const WORD_SUFFIXES: [&str; 3] = ["billion", "million", "kilo"];

fn is_word_char_at(text: &str, i: usize) -> bool {
    text[i..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

fn digit_run(bytes: &[u8], i: usize) -> usize {
    bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count()
}

/// End offsets reachable after an optional magnitude suffix, longest first.
fn with_suffixes(text: &str, base: usize, out: &mut Vec<usize>) {
    let bytes = text.as_bytes();
    for skip_ws in [true, false] {
        let mut i = base;
        if skip_ws {
            match bytes.get(i) {
                Some(b' ' | b'\t') => i += 1,
                _ => continue,
            }
        }
        let rest = &text[i..];
        for word in WORD_SUFFIXES {
            if rest.len() >= word.len()
                && rest.is_char_boundary(word.len())
                && rest[..word.len()].eq_ignore_ascii_case(word)
            {
                out.push(i + word.len());
            }
        }
        if matches!(bytes.get(i), Some(b'k' | b'm' | b'b' | b'K' | b'M' | b'B')) {
            out.push(i + 1);
        }
    }
    out.push(base);
}

/// Candidate ends for `\(?\d{1,3}(,\d{3})*(\.\d+)?\)?` + suffix, starting right after `$`.
fn grouped_candidates(text: &str, start: usize, out: &mut Vec<usize>) {
    let bytes = text.as_bytes();
    let mut i = start;
    if bytes.get(i) == Some(&b'(') {
        i += 1;
    }
    let lead = digit_run(bytes, i);
    if lead == 0 || lead > 3 {
        return;
    }
    let mut group_ends = vec![i + lead];
    let mut pos = i + lead;
    while bytes.get(pos) == Some(&b',') && digit_run(bytes, pos + 1) == 3 {
        pos += 4;
        group_ends.push(pos);
    }
    for &g in group_ends.iter().rev() {
        let mut bases = Vec::with_capacity(2);
        if bytes.get(g) == Some(&b'.') {
            let frac = digit_run(bytes, g + 1);
            if frac > 0 {
                bases.push(g + 1 + frac);
            }
        }
        bases.push(g);
        for b in bases {
            if bytes.get(b) == Some(&b')') {
                with_suffixes(text, b + 1, out);
            }
            with_suffixes(text, b, out);
        }
    }
}

/// Candidate ends for `-?\d+(\.\d+)?` + suffix, starting right after `$`.
fn plain_candidates(text: &str, start: usize, out: &mut Vec<usize>) {
    let bytes = text.as_bytes();
    let mut i = start;
    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    let run = digit_run(bytes, i);
    if run == 0 {
        return;
    }
    let int_end = i + run;
    if bytes.get(int_end) == Some(&b'.') {
        let frac = digit_run(bytes, int_end + 1);
        if frac > 0 {
            with_suffixes(text, int_end + 1 + frac, out);
        }
    }
    with_suffixes(text, int_end, out);
}

/// Length-preferring match of one currency lexeme at `start`.
///
/// The lexeme may not be followed by a word character; when its longest reading is, shorter
/// readings are tried, so `$10n` is rejected outright while `$5 kg` still yields `$5`.
pub fn match_amount_at(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = start;
    let mut leading_minus = false;
    if bytes.get(i) == Some(&b'-') {
        leading_minus = true;
        i += 1;
    }
    if bytes.get(i) != Some(&b'$') {
        return None;
    }
    if i > 0 && bytes[i - 1] == b'\\' {
        return None;
    }

    let mut candidates = Vec::new();
    grouped_candidates(text, i + 1, &mut candidates);
    if !leading_minus {
        plain_candidates(text, i + 1, &mut candidates);
    }
    candidates
        .into_iter()
        .find(|&end| end >= text.len() || !is_word_char_at(text, end))
}

fn match_range_at(text: &str, start: usize) -> Option<(usize, usize, usize)> {
    let left_end = match_amount_at(text, start)?;
    let bytes = text.as_bytes();
    let mut i = left_end;
    if matches!(bytes.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }
    let rest = &text[i..];
    if rest.starts_with('-') {
        i += 1;
    } else if rest.starts_with('–') {
        i += '–'.len_utf8();
    } else {
        return None;
    }
    if matches!(bytes.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }
    let right_end = match_amount_at(text, i)?;
    Some((left_end, i, right_end))
}

/// Replaces every currency literal and range side in `text` with a `CURRENCY` token.
pub fn extract_currency(text: &str, map: &mut PlaceholderMap) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut i = 0usize;
    let before = map.len();

    while i < bytes.len() {
        if bytes[i] != b'$' && bytes[i] != b'-' {
            i += 1;
            continue;
        }
        if let Some((left_end, right_start, right_end)) = match_range_at(text, i) {
            out.push_str(&text[cursor..i]);
            out.push_str(&map.insert(PlaceholderKind::Currency, &text[i..left_end]));
            out.push_str(&text[left_end..right_start]);
            out.push_str(&map.insert(PlaceholderKind::Currency, &text[right_start..right_end]));
            cursor = right_end;
            i = right_end;
            continue;
        }
        if let Some(end) = match_amount_at(text, i) {
            out.push_str(&text[cursor..i]);
            out.push_str(&map.insert(PlaceholderKind::Currency, &text[i..end]));
            cursor = end;
            i = end;
            continue;
        }
        i += 1;
    }
    out.push_str(&text[cursor..]);

    trace!(amounts = map.len() - before, "extracted currency literals");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(text: &str) -> Option<&str> {
        match_amount_at(text, 0).map(|end| &text[..end])
    }

    #[test]
    fn matches_common_amount_shapes() {
        assert_eq!(amount("$5 each"), Some("$5"));
        assert_eq!(amount("$1,299.99."), Some("$1,299.99"));
        assert_eq!(amount("-$3.25"), Some("-$3.25"));
        assert_eq!(amount("$(12.50)"), Some("$(12.50)"));
        assert_eq!(amount("$1.2k"), Some("$1.2k"));
        assert_eq!(amount("$3 million in"), Some("$3 million"));
        assert_eq!(amount("$2.5B"), Some("$2.5B"));
        assert_eq!(amount("$12345"), Some("$12345"));
    }

    #[test]
    fn rejects_algebra_and_bare_dollars() {
        assert_eq!(amount("$10n$"), None);
        assert_eq!(amount("$x$"), None);
        assert_eq!(amount("$ alone"), None);
        assert_eq!(amount("$2x + 3$"), None);
    }

    #[test]
    fn backs_off_a_suffix_that_runs_into_a_word() {
        assert_eq!(amount("$5 kg"), Some("$5"));
        assert_eq!(amount("$5mph"), None);
    }

    #[test]
    fn escaped_dollar_is_not_an_amount() {
        let text = r"\$5";
        assert_eq!(match_amount_at(text, 1), None);
    }
}
