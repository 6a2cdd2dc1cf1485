//! Line-level fenced code block detection.

/// The opening line of a fenced code block: marker character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceOpening<'a> {
    pub marker: char,
    pub len: usize,
    /// First word of the info string, if any.
    pub language: Option<&'a str>,
}

impl FenceOpening<'_> {
    /// A closing line is the same marker repeated at least as often, and nothing else.
    pub fn is_closed_by(&self, line: &str) -> bool {
        let rest = indent_stripped(line).trim_end();
        rest.chars().count() >= self.len && rest.chars().all(|c| c == self.marker)
    }
}

fn indent_stripped(line: &str) -> &str {
    let indent = line.bytes().take(3).take_while(|&b| b == b' ').count();
    &line[indent..]
}

/// Parses a line as the opening of a ```` ``` ```` or `~~~` fence (three or more markers,
/// indented by at most three spaces).
pub fn fence_opening(line: &str) -> Option<FenceOpening<'_>> {
    let rest = indent_stripped(line);
    let marker = rest.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = rest.chars().take_while(|&c| c == marker).count();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(FenceOpening {
        marker,
        len,
        language: info.split_whitespace().next(),
    })
}

/// Byte range of one fenced code block inside a larger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceSpan {
    /// Start of the opening fence line.
    pub start: usize,
    /// End of the closing fence line, including its `\n` when present.
    pub end: usize,
    /// False when the text ended before a closing line was seen.
    pub closed: bool,
}

/// Finds every fenced code block in `text`, in order.
///
/// An unclosed fence extends to the end of the text, matching how a streaming renderer treats
/// a block whose closing fence has not arrived yet.
pub fn find_fenced_blocks(text: &str) -> Vec<FenceSpan> {
    let mut out = Vec::new();
    let mut open: Option<(FenceOpening<'_>, usize)> = None;
    let mut line_start = 0usize;

    for line in text.split_inclusive('\n') {
        let next = line_start + line.len();
        let body = line.strip_suffix('\n').unwrap_or(line);
        match open {
            None => open = fence_opening(body).map(|opening| (opening, line_start)),
            Some((opening, start)) if opening.is_closed_by(body) => {
                out.push(FenceSpan {
                    start,
                    end: next,
                    closed: true,
                });
                open = None;
            }
            Some(_) => {}
        }
        line_start = next;
    }

    if let Some((_, start)) = open {
        out.push(FenceSpan {
            start,
            end: text.len(),
            closed: false,
        });
    }
    out
}
