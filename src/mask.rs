//! Verbatim segment masking.
//!
//! Display math, fenced code and inline code are swapped for placeholder tokens before any
//! rewrite pass runs, and swapped back at the very end.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

use crate::disambiguate::inline_math_spans;
use crate::placeholder::{PlaceholderKind, PlaceholderMap};
use crate::syntax::find_fenced_blocks;

static DISPLAY_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\$\$(.*?)\$\$").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`]+`").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Masked {
    pub text: String,
    pub map: PlaceholderMap,
}

/// Masks display math, then fenced code, then inline code.
pub fn mask(text: &str) -> Masked {
    let mut map = PlaceholderMap::for_input(text);

    let text = DISPLAY_MATH.replace_all(text, |caps: &Captures<'_>| {
        map.insert(PlaceholderKind::DisplayMath, &caps[0])
    });
    let display_count = map.len();

    let text = mask_fenced_blocks(&text, &mut map);
    let fence_count = map.len() - display_count;

    let text = INLINE_CODE
        .replace_all(&text, |caps: &Captures<'_>| {
            map.insert(PlaceholderKind::InlineCode, &caps[0])
        })
        .into_owned();

    trace!(
        display_math = display_count,
        fenced_code = fence_count,
        inline_code = map.len() - display_count - fence_count,
        "masked verbatim segments"
    );
    Masked { text, map }
}

/// Puts every masked segment back, byte-for-byte.
pub fn unmask(text: &str, map: &PlaceholderMap) -> String {
    map.restore(text)
}

fn mask_fenced_blocks(text: &str, map: &mut PlaceholderMap) -> String {
    let spans = find_fenced_blocks(text);
    if spans.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for span in spans {
        // The newline that ends the previous line belongs to the fence's blank-line context.
        let start = if span.start > cursor && text.as_bytes()[span.start - 1] == b'\n' {
            span.start - 1
        } else {
            span.start
        };
        out.push_str(&text[cursor..start]);
        out.push_str(&map.insert(PlaceholderKind::FencedCode, &text[start..span.end]));
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Masks the `$$…$$` blocks the delimiter pass produced from `\[…\]`.
///
/// Runs after currency extraction, so a block may hold currency tokens; it is restored before
/// them.
pub fn mask_math_blocks(text: &str, map: &mut PlaceholderMap) -> String {
    DISPLAY_MATH
        .replace_all(text, |caps: &Captures<'_>| {
            map.insert(PlaceholderKind::MathBlock, &caps[0])
        })
        .into_owned()
}

/// Masks `$…$` spans that read as math so later heuristics cannot wrap inside them.
///
/// Spans whose body is just an amount are left alone for the disambiguator.
pub fn mask_inline_math(text: &str, map: &mut PlaceholderMap) -> String {
    let spans = inline_math_spans(text);
    if spans.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut masked = 0usize;
    for span in spans {
        if crate::currency::looks_like_amount(span.inner(text).trim()) {
            continue;
        }
        out.push_str(&text[cursor..span.start]);
        out.push_str(&map.insert(PlaceholderKind::InlineMath, span.as_str(text)));
        cursor = span.end;
        masked += 1;
    }
    out.push_str(&text[cursor..]);
    trace!(inline_math = masked, "masked inline math");
    out
}
