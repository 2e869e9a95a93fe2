//! Message display components
//!
//! Assistant content is segmented into prose and fenced code; prose goes
//! through the Markdown renderer, code is shown verbatim in a collapsible
//! block.

use dioxus::prelude::*;
use uuid::Uuid;

use crate::app::AppState;
use crate::markdown::{render_markdown, InlineSpan, MarkdownNode};
use crate::stream::segmenter::{segment, SegmentKind, DEFAULT_LANGUAGE};
use crate::types::message::Message;
use crate::ui::code_state::{visible_code, CodeBlockKey};

/// Script writing `code` to the clipboard; resolves to `true` once written
fn clipboard_script(code: &str) -> Result<String, serde_json::Error> {
    let literal = serde_json::to_string(code)?;
    Ok(format!(
        "await navigator.clipboard.writeText({literal});\nreturn true;"
    ))
}

#[component]
pub fn MessageBubble(message: Message, is_streaming: bool) -> Element {
    if message.is_user() {
        // User text is shown as typed, never parsed
        return rsx! {
            div { class: "message-layout animate-fade-in-up",
                div { class: "flex justify-end mb-4",
                    div { class: "message-user px-4 py-3 max-w-[85%]",
                        div { class: "text-[15px] leading-relaxed text-[var(--text-primary)] whitespace-pre-wrap",
                            "{message.content}"
                        }
                    }
                }
            }
        };
    }

    let segments = segment(&message.content, is_streaming);

    rsx! {
        div { class: "message-layout animate-fade-in-up",
            div { class: "flex items-start gap-3 mb-4",
                div {
                    class: "flex-shrink-0 w-6 h-6 rounded-full flex items-center justify-center mt-1",
                    style: "background: var(--accent-primary); box-shadow: 0 4px 12px -4px var(--accent-glow);",
                    svg {
                        class: "w-3 h-3",
                        style: "color: #F2EDE7;",
                        view_box: "0 0 24 24",
                        fill: "none",
                        stroke: "currentColor",
                        stroke_width: "2.5",
                        stroke_linecap: "round",
                        stroke_linejoin: "round",
                        path { d: "M21 15a2 2 0 0 1-2 2H7l-4 4V5a2 2 0 0 1 2-2h14a2 2 0 0 1 2 2z" }
                    }
                }

                div { class: "flex-1 min-w-0",
                    for (index, seg) in segments.into_iter().enumerate() {
                        if seg.kind == SegmentKind::Text {
                            MarkdownView { key: "{index}", body: seg.body.clone() }
                        } else {
                            CodeBlock {
                                key: "{index}",
                                message_id: message.id,
                                index: index,
                                language: seg.language().unwrap_or(DEFAULT_LANGUAGE).to_string(),
                                streaming: seg.kind == SegmentKind::StreamingCode,
                                code: seg.body.clone(),
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Fenced code with collapse, long-code truncation and copy
#[component]
fn CodeBlock(
    message_id: Uuid,
    index: usize,
    language: String,
    code: String,
    streaming: bool,
) -> Element {
    let app_state = use_context::<AppState>();
    let mut copied = use_signal(|| false);

    let key = CodeBlockKey::new(message_id, index);
    let state = app_state.code_blocks.read().get(&key);
    let long_code_lines = app_state.settings.read().long_code_lines;
    let is_long = code.lines().count() > long_code_lines;
    let (shown, hidden) = visible_code(&code, state, long_code_lines);

    let mut code_blocks = app_state.code_blocks;
    let toggle_label = if state.collapsed { "Show code" } else { "Hide code" };
    let copy_label = if copied() { "Copied" } else { "Copy" };

    let copy_source = code.clone();
    let copy = move |_: MouseEvent| {
        let script = match clipboard_script(&copy_source) {
            Ok(script) => script,
            Err(e) => {
                tracing::warn!("Could not copy code block: {}", e);
                return;
            }
        };
        copied.set(false);
        spawn(async move {
            match document::eval(&script).await {
                Ok(serde_json::Value::Bool(true)) => copied.set(true),
                Ok(other) => tracing::warn!("Clipboard write did not complete: {}", other),
                Err(e) => tracing::warn!("Clipboard write failed: {:?}", e),
            }
        });
    };

    rsx! {
        div { class: "my-3 rounded-xl overflow-hidden border border-[var(--border-subtle)]",
            style: "background: #121110;",

            div { class: "code-header flex items-center gap-2",
                span { "{language}" }
                if streaming {
                    span { class: "w-1.5 h-1.5 rounded-full bg-[var(--accent-primary)] animate-pulse" }
                }
                div { class: "flex-1" }
                button {
                    class: "text-xs opacity-70 hover:opacity-100",
                    onclick: copy,
                    "{copy_label}"
                }
                button {
                    class: "text-xs opacity-70 hover:opacity-100",
                    onclick: move |_| code_blocks.write().toggle_collapsed(key),
                    "{toggle_label}"
                }
            }

            if !state.collapsed {
                pre { class: "p-4 overflow-x-auto",
                    code { class: "text-sm font-mono leading-relaxed",
                        style: "color: #E8E2DB;",
                        "{shown}"
                    }
                }
                if hidden > 0 {
                    button {
                        class: "w-full py-2 text-xs text-[var(--text-tertiary)] hover:text-[var(--text-primary)]",
                        onclick: move |_| code_blocks.write().toggle_expanded(key),
                        "Show {hidden} more lines"
                    }
                } else if is_long {
                    button {
                        class: "w-full py-2 text-xs text-[var(--text-tertiary)] hover:text-[var(--text-primary)]",
                        onclick: move |_| code_blocks.write().toggle_expanded(key),
                        "Show less"
                    }
                }
            }
        }
    }
}

#[component]
fn MarkdownView(body: String) -> Element {
    let nodes = render_markdown(&body);
    rsx! {
        div { class: "text-[var(--text-primary)]",
            {nodes.into_iter().map(render_node)}
        }
    }
}

fn render_node(node: MarkdownNode) -> Element {
    match node {
        MarkdownNode::Spacer => rsx! {
            div { class: "h-3" }
        },
        MarkdownNode::Heading { level, spans } => {
            let class = match level {
                1 => "text-2xl font-bold mt-6 mb-3",
                2 => "text-xl font-semibold mt-5 mb-2",
                3 => "text-lg font-semibold mt-4 mb-2",
                4 => "text-base font-semibold mt-3 mb-1",
                _ => "text-sm font-semibold mt-2 mb-1",
            };
            rsx! {
                div { class: "{class}", {render_spans(spans)} }
            }
        }
        MarkdownNode::Bullet(spans) => rsx! {
            div { class: "flex items-start gap-2",
                span { class: "text-[var(--accent-primary)] mt-2 text-xs", "•" }
                span { class: "leading-[1.75] flex-1", {render_spans(spans)} }
            }
        },
        MarkdownNode::Numbered { number, spans } => rsx! {
            div { class: "flex items-start gap-2",
                span { class: "text-[var(--accent-primary)] font-medium text-sm min-w-[1.25rem]", "{number}." }
                span { class: "leading-[1.75] flex-1", {render_spans(spans)} }
            }
        },
        MarkdownNode::Table { header, rows } => rsx! {
            div { class: "my-4 overflow-x-auto rounded-xl border border-[var(--border-subtle)]",
                table { class: "w-full text-sm",
                    thead { class: "bg-[var(--bg-tertiary)]",
                        tr {
                            for cell in header {
                                th { class: "px-4 py-3 text-left font-semibold border-b border-[var(--border-subtle)]",
                                    {render_spans(cell)}
                                }
                            }
                        }
                    }
                    tbody {
                        for (row_idx, row) in rows.into_iter().enumerate() {
                            tr {
                                class: if row_idx % 2 == 0 { "bg-[var(--bg-secondary)]" } else { "bg-[var(--bg-primary)]" },
                                for cell in row {
                                    td { class: "px-4 py-2.5 text-[var(--text-secondary)] border-b border-[var(--border-subtle)]/50",
                                        {render_spans(cell)}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        MarkdownNode::Paragraph(spans) => rsx! {
            p { class: "leading-[1.75]", {render_spans(spans)} }
        },
    }
}

fn render_spans(spans: Vec<InlineSpan>) -> Element {
    rsx! {
        for span in spans {
            match span {
                InlineSpan::Text(text) => rsx! { "{text}" },
                InlineSpan::Bold(text) => rsx! {
                    strong { class: "font-semibold", "{text}" }
                },
                InlineSpan::Italic(text) => rsx! {
                    em { class: "italic", "{text}" }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_script_quotes_code() {
        let code = "print(\"it's\")\n`x` </script>\\n";
        let script = clipboard_script(code).unwrap();

        let start = script.find('(').unwrap() + 1;
        let end = script.find(");").unwrap();
        let literal: String = serde_json::from_str(&script[start..end]).unwrap();
        assert_eq!(literal, code);
        assert!(script.ends_with("return true;"));
        assert_eq!(script.lines().count(), 2);
    }
}
