pub mod file_list;
pub mod session_list;

use dioxus::prelude::*;

use crate::app::AppState;
use file_list::FileList;
use session_list::SessionList;

#[component]
pub fn Sidebar() -> Element {
    let mut app_state = use_context::<AppState>();
    let title = app_state
        .current_session
        .read()
        .as_ref()
        .map(|session| session.title.clone());

    rsx! {
        aside { class: "w-64 flex-none flex flex-col h-full border-r border-[var(--border-subtle)] bg-[var(--bg-secondary)]",
            div { class: "px-4 py-4 flex items-center justify-between",
                div { class: "flex flex-col",
                    span { class: "text-sm font-semibold text-[var(--text-primary)]", "ML Agent" }
                    if let Some(title) = title {
                        span { class: "text-xs text-[var(--text-tertiary)] truncate", "{title}" }
                    }
                }
                button {
                    class: "text-xs text-[var(--text-tertiary)] hover:text-[var(--text-primary)]",
                    onclick: move |_| app_state.sign_out(),
                    "Sign out"
                }
            }
            SessionList {}
            FileList {}
        }
    }
}
