//! Inline emphasis parsing
//!
//! Bold (`**x**`) is matched first; italic (`*x*`) is then matched only in
//! the text bold left behind. Matches never overlap or nest.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
static ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    Text(String),
    Bold(String),
    Italic(String),
}

impl InlineSpan {
    pub fn as_str(&self) -> &str {
        match self {
            InlineSpan::Text(s) | InlineSpan::Bold(s) | InlineSpan::Italic(s) => s,
        }
    }
}

pub fn parse_inline(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_italics(&mut spans, &text[last..whole.start()]);
        spans.push(InlineSpan::Bold(inner.as_str().to_string()));
        last = whole.end();
    }
    push_italics(&mut spans, &text[last..]);
    spans
}

fn push_italics(spans: &mut Vec<InlineSpan>, text: &str) {
    let mut last = 0;
    for caps in ITALIC.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_text(spans, &text[last..whole.start()]);
        spans.push(InlineSpan::Italic(inner.as_str().to_string()));
        last = whole.end();
    }
    push_text(spans, &text[last..]);
}

fn push_text(spans: &mut Vec<InlineSpan>, text: &str) {
    if !text.is_empty() {
        spans.push(InlineSpan::Text(text.to_string()));
    }
}

/// Plain text of a span list, markers removed
pub fn plain_text(spans: &[InlineSpan]) -> String {
    spans.iter().map(InlineSpan::as_str).collect()
}
