//! Rewrites LaTeX bracket delimiters into the dollar forms the math extension understands.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static BRACKET_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").unwrap());
static PAREN_INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\\((.*?)\\\)").unwrap());

/// `\[ … \]` becomes a `$$ … $$` block on its own lines; `\( … \)` becomes `$ … $`.
pub fn normalize_delimiters(text: &str) -> String {
    let text = BRACKET_BLOCK.replace_all(text, |caps: &Captures<'_>| {
        format!("\n$${}$$\n", &caps[1])
    });
    PAREN_INLINE
        .replace_all(&text, |caps: &Captures<'_>| format!("${}$", &caps[1]))
        .into_owned()
}
