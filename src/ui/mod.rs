//! UI components for the ML Agent client
//!
//! This module contains all user interface components built with Dioxus.

pub mod chat;
pub mod code_state;
pub mod sidebar;
pub mod sign_in;

use dioxus::prelude::*;

use crate::app::AppState;
use chat::ChatView;
use sidebar::session_list::{open_session, refresh_sessions};
use sidebar::Sidebar;
use sign_in::SignInPanel;

#[component]
pub fn Layout() -> Element {
    let app_state = use_context::<AppState>();
    let signed_in = app_state.settings.read().is_signed_in();

    rsx! {
        div { class: "flex h-full w-full bg-[var(--bg-primary)] text-[var(--text-primary)]",
            if signed_in {
                Workspace {}
            } else {
                SignInPanel {}
            }
        }
    }
}

/// Signed-in view. Mounting it loads sessions and restores the last one.
#[component]
fn Workspace() -> Element {
    let mut app_state = use_context::<AppState>();

    use_hook(move || {
        let restore = app_state.settings.read().active_session.clone();
        spawn(async move {
            refresh_sessions(app_state).await;
            if let Some(session) = restore {
                tracing::info!("Restoring session '{}'", session.title);
                open_session(app_state, session).await;
            }
        });
    });

    let error = app_state.error.read().clone();

    rsx! {
        Sidebar {}
        main { class: "flex flex-col flex-1 min-w-0 h-full",
            if let Some(message) = error {
                div { class: "flex items-center gap-2 px-4 py-2 text-xs text-[var(--text-error)] border-b border-[var(--border-subtle)]",
                    span { class: "flex-1", "{message}" }
                    button {
                        class: "opacity-70 hover:opacity-100",
                        onclick: move |_| app_state.error.set(None),
                        "Dismiss"
                    }
                }
            }
            ChatView {}
        }
    }
}
