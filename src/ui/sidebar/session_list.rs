use dioxus::prelude::*;

use crate::app::AppState;
use crate::gateway::history::{observe_replayed, replay_history};
use crate::gateway::GatewayError;
use crate::types::session::ActiveSession;
use crate::ui::code_state::CodeBlockStates;
use crate::ui::sidebar::file_list::refresh_files;

/// Fetch the session list
pub async fn refresh_sessions(mut state: AppState) {
    let result = match state.client() {
        Ok(client) => client.list_sessions().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(sessions) => state.sessions.set(sessions),
        Err(e) => state.report("Could not load sessions", e),
    }
}

/// Make `session` the gateway's active session and replay its history.
pub async fn open_session(mut state: AppState, session: ActiveSession) {
    // Any running turn belongs to the previous session
    state.stop_flag().raise();
    state.is_generating.set(false);

    let client = match state.client() {
        Ok(client) => client,
        Err(e) => return state.report("Could not reach the gateway", e),
    };

    if let Err(e) = client.set_active_session(&session.title).await {
        return state.report("Could not activate session", e);
    }
    tracing::info!("Switched to session '{}'", session.title);

    state.current_session.set(Some(session.clone()));
    let remembered = session.clone();
    state.update_settings(move |settings| settings.active_session = Some(remembered));

    match client.chat_history(&session.id).await {
        Ok(entries) => {
            let messages = replay_history(&entries);
            let mut code_blocks = CodeBlockStates::new();
            let blocks = observe_replayed(&messages, &mut code_blocks);
            tracing::debug!(
                "Replayed {} messages ({} code blocks) for '{}'",
                messages.len(),
                blocks,
                session.title
            );
            state.streaming_id.set(None);
            state.code_blocks.set(code_blocks);
            state.messages.set(messages);
        }
        Err(e) => {
            state.clear_conversation();
            state.report("Could not load chat history", e);
        }
    }

    refresh_files(state).await;
}

async fn create_session(mut state: AppState, title: String) -> bool {
    let client = match state.client() {
        Ok(client) => client,
        Err(e) => {
            state.report("Could not reach the gateway", e);
            return false;
        }
    };

    match client.create_session(&title).await {
        Ok(session) => {
            refresh_sessions(state).await;
            open_session(state, ActiveSession::from(&session)).await;
            true
        }
        Err(GatewayError::Conflict(_)) => {
            state
                .error
                .set(Some(format!("A session named '{title}' already exists")));
            false
        }
        Err(e) => {
            state.report("Could not create session", e);
            false
        }
    }
}

#[component]
pub fn SessionList() -> Element {
    let app_state = use_context::<AppState>();
    let mut new_title = use_signal(String::new);

    let mut submit = move || {
        let title = new_title().trim().to_string();
        if title.is_empty() {
            return;
        }
        spawn(async move {
            if create_session(app_state, title).await {
                new_title.set(String::new());
            }
        });
    };

    let sessions = app_state.sessions.read().clone();
    let selected_id = app_state
        .current_session
        .read()
        .as_ref()
        .map(|session| session.id.clone());

    rsx! {
        div { class: "flex-1 overflow-y-auto p-2 space-y-1 scrollbar-thin",

            div { class: "px-1 pb-2",
                input {
                    class: "w-full px-3 py-2 rounded-lg bg-transparent border border-[var(--border-subtle)] text-sm text-[var(--text-primary)] outline-none",
                    placeholder: "New session title",
                    value: "{new_title}",
                    oninput: move |evt| new_title.set(evt.value()),
                    onkeydown: move |evt: KeyboardEvent| {
                        if evt.key() == Key::Enter {
                            submit();
                        }
                    },
                }
            }

            if sessions.is_empty() {
                div { class: "flex flex-col items-center justify-center py-10 text-[var(--text-tertiary)] gap-2 opacity-50",
                    span { class: "text-xs font-medium", "No sessions yet" }
                }
            } else {
                div { class: "text-[10px] uppercase tracking-widest text-[var(--text-tertiary)] font-semibold px-3 py-2 select-none opacity-60",
                    "Sessions"
                }

                {sessions.into_iter().map(|session| {
                    let is_selected = selected_id.as_deref() == Some(session.id.as_str());
                    let row_class = if is_selected {
                        "group flex items-center gap-2.5 px-3 py-2 rounded-lg bg-white/[0.08] border-l-2 border-[var(--accent-primary)] text-[var(--text-primary)] cursor-pointer transition-all"
                    } else {
                        "group flex items-center gap-2.5 px-3 py-2 rounded-lg hover:bg-white/[0.05] border-l-2 border-transparent text-[var(--text-secondary)] hover:text-[var(--text-primary)] cursor-pointer transition-all"
                    };
                    let target = ActiveSession::from(&session);

                    rsx! {
                        div {
                            key: "{session.id}",
                            class: "px-1",
                            onclick: move |_| {
                                if !is_selected {
                                    spawn(open_session(app_state, target.clone()));
                                }
                            },
                            div { class: row_class,
                                div { class: "truncate flex-1 text-sm", "{session.title}" }
                            }
                        }
                    }
                })}
            }
        }
    }
}
