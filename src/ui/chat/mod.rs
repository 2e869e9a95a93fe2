//! Chat interface components
//!
//! Contains the chat view, message display, and input components. A sent
//! question spawns one task that streams the answer into `AppState`.

pub mod input;
pub mod message;

use std::sync::Arc;

use dioxus::prelude::*;
use input::ChatInput;
use message::MessageBubble;
use uuid::Uuid;

use crate::app::AppState;
use crate::gateway::ask;
use crate::stream::assembler::StreamEvent;
use crate::stream::segmenter::segment;
use crate::stream::StopSignal;
use crate::types::message::Message;
use crate::ui::code_state::CodeBlockStates;

/// Fold one stream event into the visible conversation.
///
/// Code blocks are observed on every content update so each block gets its
/// defaults the moment it first appears.
pub fn apply_event(
    messages: &mut Vec<Message>,
    code_blocks: &mut CodeBlockStates,
    streaming: &mut Option<Uuid>,
    event: StreamEvent,
) {
    match event {
        StreamEvent::Started(message) => {
            code_blocks.observe_segments(message.id, &segment(&message.content, true));
            *streaming = Some(message.id);
            messages.push(message);
        }
        StreamEvent::Content { id, content } => {
            let is_streaming = *streaming == Some(id);
            if let Some(message) = messages.iter_mut().rev().find(|m| m.id == id) {
                code_blocks.observe_segments(id, &segment(&content, is_streaming));
                message.content = content;
            }
        }
        StreamEvent::Finalized { id } => finalize(messages, code_blocks, streaming, id),
        StreamEvent::Failed { id, error } => {
            tracing::warn!("Message {} ended early: {}", id, error);
            finalize(messages, code_blocks, streaming, id);
        }
    }
}

fn finalize(
    messages: &[Message],
    code_blocks: &mut CodeBlockStates,
    streaming: &mut Option<Uuid>,
    id: Uuid,
) {
    if let Some(message) = messages.iter().rev().find(|m| m.id == id) {
        code_blocks.observe_segments(id, &segment(&message.content, false));
    }
    if *streaming == Some(id) {
        *streaming = None;
    }
}

/// Question to send for `text`, if a turn may start now.
///
/// Questions are only accepted inside a session and never while a previous
/// answer is still streaming.
pub fn prepare_question(text: &str, has_session: bool, is_generating: bool) -> Option<String> {
    let question = text.trim();
    if !has_session || is_generating || question.is_empty() {
        return None;
    }
    Some(question.to_string())
}

#[component]
pub fn ChatView() -> Element {
    let app_state = use_context::<AppState>();
    let is_generating = app_state.is_generating;

    // Handler for sending a message
    let handle_send = move |text: String| {
        let mut state = app_state;
        let has_session = state.current_session.read().is_some();
        let Some(question) = prepare_question(&text, has_session, (state.is_generating)()) else {
            tracing::debug!("Question ignored (session open: {})", has_session);
            return;
        };

        let client = match state.client() {
            Ok(client) => client,
            Err(e) => {
                state.report("Could not reach the gateway", e);
                return;
            }
        };
        let sentinel = state.settings.read().sentinel;

        // Empty assistant message to stream into
        let target = Message::assistant("");
        state.messages.write().push(Message::user(question.as_str()));
        state.messages.write().push(target.clone());
        state.streaming_id.set(Some(target.id));

        // Fresh flag per turn so a stopped task can never be revived
        let stop = Arc::new(StopSignal::new());
        state.stop_signal.set(stop.clone());
        state.is_generating.set(true);
        state.error.set(None);

        spawn(async move {
            let result = ask(&client, &question, target, sentinel, &stop, |event| {
                let mut messages = state.messages.write();
                let mut code_blocks = state.code_blocks.write();
                let mut streaming = state.streaming_id.write();
                apply_event(&mut *messages, &mut *code_blocks, &mut *streaming, event);
            })
            .await;

            if Arc::ptr_eq(&state.stop_flag(), &stop) {
                state.is_generating.set(false);
                state.streaming_id.set(None);
            }

            match result {
                Ok(outcome) => tracing::info!("Turn finished: {:?}", outcome),
                Err(e) => state.report("Chat request rejected", e),
            }
        });
    };

    // Handler for stopping generation
    let handle_stop = move |_: ()| {
        let mut state = app_state;
        state.stop_flag().raise();
        state.is_generating.set(false);
        state.streaming_id.set(None);
    };

    let streaming_id = *app_state.streaming_id.read();
    let messages = app_state.messages.read().clone();
    let has_session = app_state.current_session.read().is_some();

    rsx! {
        div { class: "flex flex-col flex-1 min-h-0 relative",

            // Messages Area
            div { class: "flex-1 min-h-0 overflow-y-auto px-4 py-4 custom-scrollbar scroll-smooth",
                div { class: "max-w-3xl mx-auto w-full flex flex-col gap-1 pb-4",
                    if messages.is_empty() {
                        div { class: "flex flex-col items-center justify-center py-24 text-[var(--text-tertiary)] gap-2 opacity-60",
                            span { class: "text-sm font-medium",
                                if has_session { "Ask a question about your data" } else { "Select or create a session to start" }
                            }
                        }
                    }

                    for msg in messages.into_iter() {
                        // Split turns can leave an empty trailing message behind
                        if msg.is_user() || !msg.content.is_empty() {
                            MessageBubble {
                                key: "{msg.id}",
                                is_streaming: streaming_id == Some(msg.id),
                                message: msg.clone(),
                            }
                        }
                    }

                    // Generating indicator
                    if is_generating() {
                        div { class: "message-layout",
                            div { class: "flex items-center gap-3 py-2 animate-fade-in",
                                div {
                                    class: "w-6 h-6 rounded-full flex items-center justify-center",
                                    style: "background: var(--accent-primary); opacity: 0.7;",
                                    div { class: "w-2 h-2 rounded-full animate-pulse", style: "background: #F2EDE7;" }
                                }
                                div { class: "flex items-center gap-1.5",
                                    div { class: "w-1.5 h-1.5 rounded-full bg-[var(--accent-primary)] opacity-60 animate-bounce" }
                                    div { class: "w-1.5 h-1.5 rounded-full bg-[var(--accent-primary)] opacity-60 animate-bounce delay-75" }
                                    div { class: "w-1.5 h-1.5 rounded-full bg-[var(--accent-primary)] opacity-60 animate-bounce delay-150" }
                                }
                            }
                        }
                    }

                    div { class: "h-4" }
                }
            }

            ChatInput {
                on_send: handle_send,
                on_stop: handle_stop,
                is_generating: is_generating(),
                has_session,
            }
        }
    }
}
