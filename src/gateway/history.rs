//! History replay
//!
//! Rebuilds the message list of a session from stored question/answer
//! pairs. Replayed messages are complete, so they render with
//! `is_streaming = false` and their code blocks get default view state.

use crate::stream::segmenter::segment;
use crate::types::message::Message;
use crate::types::session::HistoryEntry;
use crate::ui::code_state::CodeBlockStates;

/// One user message and one assistant message per entry, in order.
pub fn replay_history(entries: &[HistoryEntry]) -> Vec<Message> {
    entries
        .iter()
        .flat_map(|entry| {
            [
                Message::user(entry.question.as_str()),
                Message::assistant(entry.answer.as_str()),
            ]
        })
        .collect()
}

/// Register the code blocks of replayed assistant messages.
pub fn observe_replayed(messages: &[Message], states: &mut CodeBlockStates) -> usize {
    messages
        .iter()
        .filter(|m| !m.is_user())
        .map(|m| states.observe_segments(m.id, &segment(&m.content, false)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::Role;
    use crate::ui::code_state::CodeBlockKey;

    fn entry(q: &str, a: &str) -> HistoryEntry {
        HistoryEntry {
            question: q.to_string(),
            answer: a.to_string(),
        }
    }

    #[test]
    fn test_replay_alternates_roles() {
        let messages = replay_history(&[entry("hi", "hello"), entry("plot it", "done")]);
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(messages[3].content, "done");
    }

    #[test]
    fn test_replay_empty() {
        assert!(replay_history(&[]).is_empty());
    }

    #[test]
    fn test_replayed_code_blocks_start_collapsed() {
        let messages = replay_history(&[entry(
            "show ```code```",
            "Sure:\n```python\ndf.head()\n```\nand\n```sql\nSELECT 1\n```",
        )]);
        let mut states = CodeBlockStates::new();

        // User text is never segmented
        assert_eq!(observe_replayed(&messages, &mut states), 2);
        let answer = &messages[1];
        assert!(states.get(&CodeBlockKey::new(answer.id, 1)).collapsed);
        assert!(states.is_observed(&CodeBlockKey::new(answer.id, 3)));
    }
}
