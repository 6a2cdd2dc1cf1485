use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::autowrap::auto_wrap;
use crate::currency::extract_currency;
use crate::delimiters::normalize_delimiters;
use crate::disambiguate::disambiguate;
use crate::mask::{mask, mask_inline_math, mask_math_blocks};
use crate::placeholder::{PlaceholderKind, PlaceholderMap};

const STRUCTURAL: [PlaceholderKind; 3] = [
    PlaceholderKind::DisplayMath,
    PlaceholderKind::FencedCode,
    PlaceholderKind::InlineCode,
];

/// Rewrites markdown so a commonmark renderer with a math extension reads every `$` correctly.
///
/// Currency amounts come out with escaped dollars (`\$5`), math spans stay delimited, and code
/// or display math is returned byte-for-byte. Empty input yields an empty string; any other
/// output ends in exactly one newline.
///
/// The rewrite never fails: if a pass panics, the input is returned unchanged.
pub fn preprocess(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    match panic::catch_unwind(AssertUnwindSafe(|| run_pipeline(content))) {
        Ok(out) => out,
        Err(_) => {
            warn!(
                len = content.len(),
                "markdown preprocessing failed; returning input unchanged"
            );
            content.to_string()
        }
    }
}

fn run_pipeline(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

    let masked = mask(&normalized);
    let mut masks = masked.map;
    let mut currency = masks.sibling();

    let text = extract_currency(&masked.text, &mut currency);
    // Everything already delimited is masked before auto-wrap looks for bare math.
    let text = normalize_delimiters(&text);
    let text = mask_math_blocks(&text, &mut masks);
    let text = mask_inline_math(&text, &mut masks);
    let text = auto_wrap(&text, masks.sentinel());
    let text = disambiguate(&text, masks.sentinel());
    let text = restore(&text, &currency, &masks);

    debug!(
        masks = masks.len(),
        currency = currency.len(),
        "preprocessed markdown"
    );
    let mut out = text.trim_end().to_string();
    out.push('\n');
    out
}

/// Substitutes placeholders back into `text`.
///
/// Math masks go first since they may hold currency tokens; currency literals follow with every
/// `$` escaped; structural masks are restored verbatim last.
pub fn restore(text: &str, currency: &PlaceholderMap, masks: &PlaceholderMap) -> String {
    let text = masks.restore_kinds(
        text,
        &[PlaceholderKind::InlineMath, PlaceholderKind::MathBlock],
    );
    let text = currency.restore_escaping_dollars(&text);
    masks.restore_kinds(&text, &STRUCTURAL)
}

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\$\s?\d+(?:,\d{3})*(?:\.\d+)?\b").unwrap());
static DISPLAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\$.+?\$\$").unwrap());
static BRACKET_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\\[.+?\\\]").unwrap());
static PAREN_INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\\([^)]+?\\\)").unwrap());

/// Cheap check for math notation, ignoring dollar amounts.
pub fn contains_math_notation(text: &str) -> bool {
    let without_currency = AMOUNT.replace_all(text, "");
    let text = without_currency.as_ref();
    DISPLAY.is_match(text)
        || has_inline_dollar_pair(text)
        || BRACKET_BLOCK.is_match(text)
        || PAREN_INLINE.is_match(text)
}

fn has_inline_dollar_pair(text: &str) -> bool {
    let bytes = text.as_bytes();
    (0..bytes.len()).any(|i| {
        if bytes[i] != b'$' || (i > 0 && bytes[i - 1] == b'\\') {
            return false;
        }
        match bytes[i + 1..].iter().position(|&b| b == b'$' || b == b'\n') {
            Some(rel) => {
                let j = i + 1 + rel;
                rel > 0 && bytes[j] == b'$' && bytes[j - 1] != b'\\'
            }
            None => false,
        }
    })
}
