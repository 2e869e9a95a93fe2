//! Markdown rendering for text segments
//!
//! Produces presentational nodes only; the UI decides how they look.

pub mod blocks;
pub mod inline;

pub use blocks::{render_markdown, MarkdownNode};
pub use inline::{parse_inline, plain_text, InlineSpan};
