//! Per-code-block view state
//!
//! Keyed by message id and segment index. A block gets its defaults the
//! first time it is observed and keeps whatever the user chose afterwards,
//! no matter how often the message is re-segmented while streaming.

use std::collections::HashMap;

use uuid::Uuid;

use crate::stream::segmenter::Segment;

/// Default number of lines above which a block counts as long
pub const DEFAULT_LONG_CODE_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeBlockKey {
    pub message_id: Uuid,
    pub segment_index: usize,
}

impl CodeBlockKey {
    pub fn new(message_id: Uuid, segment_index: usize) -> Self {
        Self {
            message_id,
            segment_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlockState {
    pub collapsed: bool,
    /// Only meaningful for long blocks
    pub expanded: bool,
}

impl Default for CodeBlockState {
    fn default() -> Self {
        Self {
            collapsed: true,
            expanded: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeBlockStates {
    blocks: HashMap<CodeBlockKey, CodeBlockState>,
}

impl CodeBlockStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a block. Returns true only the first time the key is seen.
    pub fn observe(&mut self, key: CodeBlockKey) -> bool {
        if self.blocks.contains_key(&key) {
            return false;
        }
        self.blocks.insert(key, CodeBlockState::default());
        true
    }

    /// Observe every code segment of a message; returns how many were new.
    pub fn observe_segments(&mut self, message_id: Uuid, segments: &[Segment]) -> usize {
        segments
            .iter()
            .enumerate()
            .filter(|(_, seg)| seg.is_code())
            .filter(|(idx, _)| self.observe(CodeBlockKey::new(message_id, *idx)))
            .count()
    }

    /// State for `key`; unseen blocks report the defaults.
    pub fn get(&self, key: &CodeBlockKey) -> CodeBlockState {
        self.blocks.get(key).copied().unwrap_or_default()
    }

    pub fn is_observed(&self, key: &CodeBlockKey) -> bool {
        self.blocks.contains_key(key)
    }

    pub fn toggle_collapsed(&mut self, key: CodeBlockKey) {
        let state = self.blocks.entry(key).or_default();
        state.collapsed = !state.collapsed;
    }

    pub fn toggle_expanded(&mut self, key: CodeBlockKey) {
        let state = self.blocks.entry(key).or_default();
        state.expanded = !state.expanded;
    }

    /// Drop every block belonging to a message
    pub fn forget_message(&mut self, message_id: Uuid) {
        self.blocks.retain(|key, _| key.message_id != message_id);
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Lines to display for a block, and how many were held back.
pub fn visible_code(body: &str, state: CodeBlockState, long_code_lines: usize) -> (String, usize) {
    let lines: Vec<&str> = body.lines().collect();
    if state.expanded || lines.len() <= long_code_lines {
        return (body.to_string(), 0);
    }
    (lines[..long_code_lines].join("\n"), lines.len() - long_code_lines)
}
