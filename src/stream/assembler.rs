//! Chunk assembler
//!
//! Turns an ordered sequence of text chunks into one or more assistant
//! messages. The gateway marks the end of a logical message in-band with a
//! checkmark glyph; every occurrence closes the active message (glyph
//! included) and opens a new one holding whatever follows.

use std::fmt;

use uuid::Uuid;

use crate::types::message::Message;

/// In-band glyph that ends one logical message and starts the next.
pub const DEFAULT_SENTINEL: char = '✓';

/// Lifecycle of one assembled turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Still receiving appended content
    Accumulating,
    /// Immutable; no further chunk touches it
    Finalized,
}

/// Observable changes produced while assembling a stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A new assistant message was spliced off after a sentinel
    Started(Message),
    /// Current full content of a message
    Content { id: Uuid, content: String },
    /// The message will not change again
    Finalized { id: Uuid },
    /// The transport failed after content was published; content is kept
    Failed { id: Uuid, error: String },
}

/// Two-state assembler over one physical stream.
#[derive(Debug)]
pub struct ChunkAssembler {
    sentinel: char,
    finalized: Vec<Message>,
    active: Message,
    state: TurnState,
    chunks: usize,
}

impl ChunkAssembler {
    /// Start assembling into `target`, usually the empty assistant message
    /// created when the user submitted the question.
    pub fn new(sentinel: char, target: Message) -> Self {
        Self {
            sentinel,
            finalized: Vec::new(),
            active: target,
            state: TurnState::Accumulating,
            chunks: 0,
        }
    }

    pub fn sentinel(&self) -> char {
        self.sentinel
    }

    /// The message currently receiving content
    pub fn active(&self) -> &Message {
        &self.active
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == TurnState::Finalized
    }

    /// Number of chunks processed so far
    pub fn chunks_processed(&self) -> usize {
        self.chunks
    }

    /// All messages in stream order, the active one last
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.finalized.iter().chain(std::iter::once(&self.active))
    }

    pub fn into_messages(self) -> Vec<Message> {
        let mut messages = self.finalized;
        messages.push(self.active);
        messages
    }

    /// Append one chunk, splitting on every sentinel it contains.
    pub fn push(&mut self, chunk: &str) -> Vec<StreamEvent> {
        if self.is_finished() {
            tracing::warn!(
                "Ignoring {} bytes received after message {} was finalized",
                chunk.len(),
                self.active.id
            );
            return Vec::new();
        }

        self.chunks += 1;
        let mut events = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.find(self.sentinel) {
            let (head, tail) = rest.split_at(pos + self.sentinel.len_utf8());
            self.active.content.push_str(head);
            events.push(StreamEvent::Content {
                id: self.active.id,
                content: self.active.content.clone(),
            });
            events.push(StreamEvent::Finalized { id: self.active.id });

            let next = Message::assistant("");
            events.push(StreamEvent::Started(next.clone()));
            let done = std::mem::replace(&mut self.active, next);
            tracing::debug!("Sentinel closed message {}", done.id);
            self.finalized.push(done);
            rest = tail;
        }

        self.active.content.push_str(rest);
        events.push(StreamEvent::Content {
            id: self.active.id,
            content: self.active.content.clone(),
        });
        events
    }

    /// End of stream or cancellation: finalize the active message as-is.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        self.state = TurnState::Finalized;
        vec![StreamEvent::Finalized { id: self.active.id }]
    }

    /// Transport failure: keep the partial content, finalize, report.
    pub fn fail(&mut self, error: impl fmt::Display) -> Vec<StreamEvent> {
        let mut events = self.finish();
        events.push(StreamEvent::Failed {
            id: self.active.id,
            error: error.to_string(),
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> ChunkAssembler {
        ChunkAssembler::new(DEFAULT_SENTINEL, Message::assistant(""))
    }

    fn contents(assembler: &ChunkAssembler) -> Vec<String> {
        assembler.messages().map(|m| m.content.clone()).collect()
    }

    #[test]
    fn test_chunks_without_sentinel_append() {
        let mut asm = assembler();
        asm.push("Hel");
        asm.push("");
        let events = asm.push("lo");
        assert_eq!(contents(&asm), vec!["Hello"]);
        assert_eq!(
            events,
            vec![StreamEvent::Content {
                id: asm.active().id,
                content: "Hello".to_string()
            }]
        );
        assert_eq!(asm.chunks_processed(), 3);
    }

    #[test]
    fn test_sentinel_splits_message() {
        let mut asm = assembler();
        let first_id = asm.active().id;
        let events = asm.push("abc✓def");
        asm.finish();

        assert_eq!(contents(&asm), vec!["abc✓", "def"]);
        assert_ne!(asm.active().id, first_id);
        assert!(matches!(events[1], StreamEvent::Finalized { id } if id == first_id));
        assert!(matches!(&events[2], StreamEvent::Started(m) if m.content.is_empty()));
    }

    #[test]
    fn test_multiple_sentinels_in_one_chunk() {
        let mut asm = assembler();
        asm.push("one✓two✓three");
        assert_eq!(contents(&asm), vec!["one✓", "two✓", "three"]);
        assert_eq!(asm.state(), TurnState::Accumulating);
    }

    #[test]
    fn test_sentinel_at_chunk_end_opens_empty_message() {
        let mut asm = assembler();
        asm.push("done✓");
        asm.push("next");
        assert_eq!(contents(&asm), vec!["done✓", "next"]);
    }

    #[test]
    fn test_custom_sentinel() {
        let mut asm = ChunkAssembler::new('✅', Message::assistant(""));
        asm.push("a✓b✅c");
        assert_eq!(contents(&asm), vec!["a✓b✅", "c"]);
    }

    #[test]
    fn test_push_after_finish_is_ignored() {
        let mut asm = assembler();
        asm.push("partial");
        asm.finish();
        assert!(asm.push(" more").is_empty());
        assert_eq!(contents(&asm), vec!["partial"]);
        assert!(asm.finish().is_empty());
    }

    #[test]
    fn test_fail_keeps_partial_content() {
        let mut asm = assembler();
        asm.push("partial answer");
        let events = asm.fail("connection reset");
        assert!(asm.is_finished());
        assert_eq!(contents(&asm), vec!["partial answer"]);
        assert!(matches!(&events[1], StreamEvent::Failed { error, .. } if error == "connection reset"));
    }

    #[test]
    fn test_target_message_keeps_identity() {
        let target = Message::assistant("");
        let id = target.id;
        let mut asm = ChunkAssembler::new(DEFAULT_SENTINEL, target);
        asm.push("x");
        assert_eq!(asm.into_messages()[0].id, id);
    }
}
