use pulldown_cmark::{CodeBlockKind, Event, Options as PulldownOptions, Parser, Tag, TagEnd};

use crate::fence::FenceBlock;
use crate::options::Options;
use crate::preprocess::preprocess;

#[derive(Debug, Clone)]
pub struct PulldownAdapterOptions {
    pub pulldown: PulldownOptions,
    /// Parse the content as-is instead of running [`preprocess`] first.
    pub skip_preprocess: bool,
}

impl Default for PulldownAdapterOptions {
    fn default() -> Self {
        Self {
            pulldown: PulldownOptions::ENABLE_MATH
                | PulldownOptions::ENABLE_TABLES
                | PulldownOptions::ENABLE_STRIKETHROUGH,
            skip_preprocess: false,
        }
    }
}

impl PulldownAdapterOptions {
    /// Parser setup matching `options`; with math disabled, dollars are left to plain markdown.
    pub fn from_options(options: &Options) -> Self {
        let mut out = Self::default();
        if !options.math {
            out.pulldown.remove(PulldownOptions::ENABLE_MATH);
            out.skip_preprocess = true;
        }
        out
    }
}

/// Preprocesses `content` (unless disabled) and parses it into owned events.
pub fn parse_events(content: &str, opts: &PulldownAdapterOptions) -> Vec<Event<'static>> {
    if opts.skip_preprocess {
        return parse_events_static(content, opts.pulldown);
    }
    let prepared = preprocess(content);
    parse_events_static(&prepared, opts.pulldown)
}

fn parse_events_static(input: &str, options: PulldownOptions) -> Vec<Event<'static>> {
    Parser::new_ext(input, options)
        .map(|e| e.into_static())
        .collect()
}

/// A fenced code block pulled out of an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedBlock {
    pub language: Option<String>,
    pub code: String,
}

impl FencedBlock {
    pub fn as_block(&self) -> FenceBlock<'_> {
        FenceBlock {
            language: self.language.as_deref(),
            code: &self.code,
        }
    }
}

/// Collects every fenced code block, in document order.
///
/// The language is the first word of the info string; one trailing newline is dropped from the
/// body. Indented code blocks are skipped.
pub fn fenced_blocks(events: &[Event<'_>]) -> Vec<FencedBlock> {
    let mut out = Vec::new();
    let mut current: Option<FencedBlock> = None;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                current = Some(FencedBlock {
                    language: info.split_whitespace().next().map(str::to_string),
                    code: String::new(),
                });
            }
            Event::Text(text) => {
                if let Some(block) = current.as_mut() {
                    block.code.push_str(text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(mut block) = current.take() {
                    if block.code.ends_with('\n') {
                        block.code.pop();
                    }
                    out.push(block);
                }
            }
            _ => {}
        }
    }
    out
}
