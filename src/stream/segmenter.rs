//! Markup segmenter
//!
//! Splits one message's content into text and fenced-code segments. The
//! function is pure: the same `(content, is_streaming)` always yields the
//! same segments, so callers recompute from scratch on every update.

const FENCE: &str = "```";

/// Language reported for a fence without a tag
pub const DEFAULT_LANGUAGE: &str = "text";

/// Classification of a contiguous slice of content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    /// Fenced block; closed, or left open by a finished message
    Code,
    /// Fenced block still receiving content
    StreamingCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Raw text between delimiters
    pub body: String,
    tag: String,
    open_newline: bool,
    terminated: bool,
}

impl Segment {
    fn text(body: &str) -> Self {
        Self {
            kind: SegmentKind::Text,
            body: body.to_string(),
            tag: String::new(),
            open_newline: false,
            terminated: false,
        }
    }

    fn code(kind: SegmentKind, tag: &str, body: &str, open_newline: bool, terminated: bool) -> Self {
        Self {
            kind,
            body: body.to_string(),
            tag: tag.to_string(),
            open_newline,
            terminated,
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind != SegmentKind::Text
    }

    /// Language tag of a code segment; `"text"` when the fence had none.
    pub fn language(&self) -> Option<&str> {
        match self.kind {
            SegmentKind::Text => None,
            _ if self.tag.is_empty() => Some(DEFAULT_LANGUAGE),
            _ => Some(&self.tag),
        }
    }

    /// Whether a closing fence was seen
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The slice of normalized content this segment was cut from,
    /// delimiters included.
    pub fn source(&self) -> String {
        if self.kind == SegmentKind::Text {
            return self.body.clone();
        }
        let mut out = String::with_capacity(self.body.len() + self.tag.len() + 7);
        out.push_str(FENCE);
        out.push_str(&self.tag);
        if self.open_newline {
            out.push('\n');
        }
        out.push_str(&self.body);
        if self.terminated {
            out.push_str(FENCE);
        }
        out
    }
}

/// Collapse non-breaking spaces and unify line endings.
pub fn normalize(content: &str) -> String {
    content
        .replace('\u{00A0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-' | '.' | '#')
}

struct FenceOpen<'a> {
    tag: &'a str,
    /// Byte offset just past the opening marker
    end: usize,
    /// False when the marker runs into end-of-input before its newline
    complete: bool,
}

fn fence_open_at(s: &str, at: usize, is_streaming: bool) -> Option<FenceOpen<'_>> {
    let after = &s[at + FENCE.len()..];
    let tag_len = after
        .char_indices()
        .find(|&(_, c)| !is_tag_char(c))
        .map(|(i, _)| i)
        .unwrap_or(after.len());
    let tag = &after[..tag_len];
    let rest = &after[tag_len..];

    if rest.starts_with('\n') {
        Some(FenceOpen {
            tag,
            end: at + FENCE.len() + tag_len + 1,
            complete: true,
        })
    } else if rest.is_empty() && is_streaming {
        Some(FenceOpen {
            tag,
            end: s.len(),
            complete: false,
        })
    } else {
        None
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::text(text));
    }
}

/// Partition `content` into ordered segments covering all of it.
pub fn segment(content: &str, is_streaming: bool) -> Vec<Segment> {
    let normalized = normalize(content);
    let s = normalized.as_str();
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut search = 0;

    while let Some(rel) = s[search..].find(FENCE) {
        let at = search + rel;
        let Some(open) = fence_open_at(s, at, is_streaming) else {
            search = at + 1;
            continue;
        };

        push_text(&mut segments, &s[cursor..at]);

        if !open.complete {
            segments.push(Segment::code(SegmentKind::StreamingCode, open.tag, "", false, false));
            cursor = s.len();
            break;
        }

        match s[open.end..].find(FENCE) {
            Some(rel_close) => {
                let close = open.end + rel_close;
                segments.push(Segment::code(
                    SegmentKind::Code,
                    open.tag,
                    &s[open.end..close],
                    true,
                    true,
                ));
                cursor = close + FENCE.len();
                search = cursor;
            }
            None => {
                let kind = if is_streaming {
                    SegmentKind::StreamingCode
                } else {
                    SegmentKind::Code
                };
                segments.push(Segment::code(kind, open.tag, &s[open.end..], true, false));
                cursor = s.len();
                break;
            }
        }
    }

    push_text(&mut segments, &s[cursor..]);
    if segments.is_empty() {
        segments.push(Segment::text(""));
    }
    segments
}
