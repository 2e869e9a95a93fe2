//! Incremental stream rendering
//!
//! Chunks from the gateway are decoded, assembled into messages and
//! segmented into text and code for display.

pub mod assembler;
pub mod decoder;
pub mod driver;
pub mod segmenter;

pub use assembler::{ChunkAssembler, StreamEvent, TurnState, DEFAULT_SENTINEL};
pub use driver::{drive, ChunkSource, DriveOutcome, StopSignal};
pub use segmenter::{segment, Segment, SegmentKind};
