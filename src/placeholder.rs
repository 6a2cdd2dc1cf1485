use std::borrow::Cow;
use std::collections::HashSet;

/// What a placeholder token stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    DisplayMath,
    FencedCode,
    InlineCode,
    InlineMath,
    /// A `$$…$$` block produced from `\[…\]` after currency extraction.
    MathBlock,
    Currency,
}

impl PlaceholderKind {
    pub fn label(self) -> &'static str {
        match self {
            PlaceholderKind::DisplayMath => "DISPLAY_MATH",
            PlaceholderKind::FencedCode => "FENCED_CODE",
            PlaceholderKind::InlineCode => "INLINE_CODE",
            PlaceholderKind::InlineMath => "INLINE_MATH",
            PlaceholderKind::MathBlock => "MATH_BLOCK",
            PlaceholderKind::Currency => "CURRENCY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub token: String,
    pub kind: PlaceholderKind,
    pub original: String,
}

/// Ordered table of protected spans.
///
/// Each token is `<S>__KIND_<index>__<S>` where `<S>` is a private-use character that does not
/// occur anywhere in the input the map was created for. Tokens therefore cannot collide with input
/// text, contain none of the characters the rewrite passes react to (`$`, backticks, backslashes,
/// whitespace, ASCII letters at their edges), and can be found again by literal search after later
/// passes moved them around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMap {
    sentinel: char,
    next_index: usize,
    entries: Vec<Placeholder>,
}

const PRIVATE_USE_RANGES: [(u32, u32); 3] = [
    (0xE000, 0xF8FF),
    (0xF0000, 0xFFFFD),
    (0x100000, 0x10FFFD),
];

fn is_private_use(c: char) -> bool {
    let cp = c as u32;
    PRIVATE_USE_RANGES
        .iter()
        .any(|&(lo, hi)| cp >= lo && cp <= hi)
}

fn pick_sentinel(input: &str) -> char {
    let used: HashSet<char> = input.chars().filter(|c| is_private_use(*c)).collect();
    PRIVATE_USE_RANGES
        .iter()
        .flat_map(|&(lo, hi)| (lo..=hi).filter_map(char::from_u32))
        .find(|c| !used.contains(c))
        .unwrap_or('\u{E000}')
}

impl PlaceholderMap {
    /// Creates an empty map whose tokens are guaranteed absent from `input`.
    pub fn for_input(input: &str) -> Self {
        Self {
            sentinel: pick_sentinel(input),
            next_index: 0,
            entries: Vec::new(),
        }
    }

    /// An independent, empty map that uses the same sentinel (and so is safe for the same input).
    pub fn sibling(&self) -> Self {
        Self {
            sentinel: self.sentinel,
            next_index: 0,
            entries: Vec::new(),
        }
    }

    pub fn sentinel(&self) -> char {
        self.sentinel
    }

    /// Records `original` and returns the token that now stands in for it.
    pub fn insert(&mut self, kind: PlaceholderKind, original: impl Into<String>) -> String {
        let s = self.sentinel;
        let token = format!("{s}__{}_{}__{s}", kind.label(), self.next_index);
        self.next_index += 1;
        self.entries.push(Placeholder {
            token: token.clone(),
            kind,
            original: original.into(),
        });
        token
    }

    pub fn entries(&self) -> &[Placeholder] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.token == token)
            .map(|p| p.original.as_str())
    }

    /// True if `text` contains any token minted by this map (or a sibling).
    pub fn has_token_in(&self, text: &str) -> bool {
        text.contains(self.sentinel)
    }

    /// Substitutes every token back verbatim.
    ///
    /// Entries are visited newest first: a span masked later may have swallowed the token of an
    /// earlier one, and must be put back before that inner token can be found.
    pub fn restore(&self, text: &str) -> String {
        self.substitute(text, |_| true, |original| Cow::Borrowed(original))
    }

    /// Substitutes only the tokens of the given kinds, verbatim.
    pub fn restore_kinds(&self, text: &str, kinds: &[PlaceholderKind]) -> String {
        self.substitute(
            text,
            |p| kinds.contains(&p.kind),
            |original| Cow::Borrowed(original),
        )
    }

    /// Substitutes every token, prefixing each literal `$` of the original with a backslash.
    pub fn restore_escaping_dollars(&self, text: &str) -> String {
        self.substitute(
            text,
            |_| true,
            |original| {
                if original.contains('$') {
                    Cow::Owned(original.replace('$', "\\$"))
                } else {
                    Cow::Borrowed(original)
                }
            },
        )
    }

    fn substitute<'m>(
        &'m self,
        text: &str,
        include: impl Fn(&Placeholder) -> bool,
        rewrite: impl Fn(&'m str) -> Cow<'m, str>,
    ) -> String {
        let mut out = text.to_string();
        if !self.has_token_in(&out) {
            return out;
        }
        for p in self.entries.iter().rev() {
            if !include(p) || !out.contains(&p.token) {
                continue;
            }
            out = out.replace(&p.token, &rewrite(p.original.as_str()));
        }
        out
    }
}
