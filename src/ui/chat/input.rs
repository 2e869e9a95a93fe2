//! Question input with send/stop button

use dioxus::prelude::*;

const WRAP_WIDTH: usize = 70;
const MAX_ROWS: usize = 8;

/// Rows the textarea needs for `text`
fn compute_rows(text: &str) -> usize {
    let newlines = text.matches('\n').count();
    let wrapped: usize = text
        .lines()
        .map(|line| line.chars().count().saturating_sub(1) / WRAP_WIDTH)
        .sum();
    (newlines + wrapped + 1).clamp(1, MAX_ROWS)
}

#[component]
pub fn ChatInput(
    on_send: EventHandler<String>,
    on_stop: EventHandler<()>,
    is_generating: bool,
    has_session: bool,
) -> Element {
    let mut text = use_signal(String::new);

    let mut submit = move || {
        if has_session && !is_generating && !text().trim().is_empty() {
            on_send.call(text());
            text.set(String::new());
        }
    };

    let handle_keydown = move |evt: KeyboardEvent| {
        if evt.key() == Key::Escape && is_generating {
            on_stop.call(());
        } else if evt.key() == Key::Enter && !evt.modifiers().contains(Modifiers::SHIFT) {
            evt.prevent_default();
            submit();
        }
    };

    let can_send = has_session && !is_generating && !text().trim().is_empty();
    let placeholder = if has_session {
        "Ask about your dataset..."
    } else {
        "Open a session to ask a question"
    };
    let rows = compute_rows(&text());
    let is_multiline = rows > 1;

    let container_class = if is_multiline {
        "glass-input flex items-end gap-2 pr-2"
    } else {
        "glass-input flex items-center gap-2 pr-2"
    };
    let button_margin = if is_multiline { "margin-bottom: 8px;" } else { "" };
    let send_class = if can_send {
        "flex-shrink-0 w-9 h-9 rounded-full flex items-center justify-center transition-all hover:scale-105 active:scale-95"
    } else {
        "flex-shrink-0 w-9 h-9 rounded-full flex items-center justify-center transition-all cursor-not-allowed opacity-30"
    };
    let send_background = if can_send {
        "background: var(--accent-primary); color: #F2EDE7;"
    } else {
        "background: var(--bg-elevated);"
    };

    rsx! {
        div { class: "w-full px-4 pb-5 pt-2",
            div { class: "relative max-w-3xl mx-auto",
                div {
                    class: "{container_class}",
                    style: "border-radius: 28px; min-height: 52px;",

                    textarea {
                        class: "flex-1 bg-transparent outline-none text-[var(--text-primary)] resize-none placeholder-[var(--text-tertiary)] text-[15px] custom-scrollbar",
                        style: "line-height: 22px; padding: 14px 0 14px 20px; max-height: 180px; overflow-y: auto;",
                        placeholder: "{placeholder}",
                        value: "{text}",
                        oninput: move |evt| text.set(evt.value()),
                        onkeydown: handle_keydown,
                        disabled: is_generating || !has_session,
                        rows: "{rows}",
                    }

                    if is_generating {
                        button {
                            onclick: move |_| on_stop.call(()),
                            class: "flex-shrink-0 w-9 h-9 rounded-full flex items-center justify-center text-white transition-all animate-pulse-ring",
                            style: "background: var(--error); {button_margin}",
                            title: "Stop (Esc)",
                            svg {
                                width: "14",
                                height: "14",
                                view_box: "0 0 24 24",
                                fill: "currentColor",
                                rect { x: "6", y: "6", width: "12", height: "12", rx: "2" }
                            }
                        }
                    } else {
                        button {
                            onclick: move |_| submit(),
                            disabled: !can_send,
                            class: "{send_class}",
                            style: "{send_background} {button_margin}",
                            title: "Send (Enter)",
                            svg {
                                width: "16",
                                height: "16",
                                view_box: "0 0 24 24",
                                fill: "none",
                                stroke: "currentColor",
                                stroke_width: "2",
                                stroke_linecap: "round",
                                stroke_linejoin: "round",
                                line { x1: "12", y1: "19", x2: "12", y2: "5" }
                                polyline { points: "5 12 12 5 19 12" }
                            }
                        }
                    }
                }

                p { class: "text-center text-[11px] text-[var(--text-tertiary)] mt-2 opacity-40",
                    "Enter to send, Shift+Enter for a new line"
                }
            }
        }
    }
}
