#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use mdrich::{DiagramKind, DiagramRenderer, DiagramRequest, Sanitizer, Theme};

/// Every proper prefix of `text` (on char boundaries), shortest first.
pub fn prefixes(text: &str) -> Vec<&str> {
    text.char_indices()
        .skip(1)
        .map(|(i, _)| &text[..i])
        .collect()
}

pub fn chunk_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(|s| s.to_string()).collect()
}

pub fn fenced(language: &str, body: &str) -> String {
    format!("```{language}\n{body}\n```\n")
}

pub fn table(header: &[&str], rows: &[&[&str]]) -> String {
    let mut out = format!("| {} |\n", header.join(" | "));
    out.push_str(&format!("|{}|\n", vec!["---"; header.len()].join("|")));
    for row in rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out
}

/// Strips `<script>` the way a real sanitizer would, or returns nothing when `reject_all`.
#[derive(Debug, Default)]
pub struct FakeSanitizer {
    pub reject_all: bool,
}

impl Sanitizer for FakeSanitizer {
    fn sanitize(&self, html: &str) -> String {
        if self.reject_all {
            return String::new();
        }
        html.replace("<script>", "").replace("</script>", "")
    }
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub init_calls: Cell<usize>,
    pub requests: RefCell<Vec<(DiagramKind, Option<String>, Theme)>>,
    pub fail_with: Option<String>,
}

impl DiagramRenderer for RecordingRenderer {
    fn initialize(&self, _theme: Theme) {
        self.init_calls.set(self.init_calls.get() + 1);
    }

    fn render(&self, request: &DiagramRequest<'_>) -> Result<String, String> {
        self.requests.borrow_mut().push((
            request.kind,
            request.server_url.map(str::to_string),
            request.theme,
        ));
        if let Some(message) = &self.fail_with {
            return Err(message.clone());
        }
        Ok(format!("img:{}:{}", request.kind.as_str(), request.source.len()))
    }
}
