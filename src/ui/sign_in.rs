//! Credentials entry shown whenever no access token is stored

use dioxus::prelude::*;

use crate::app::AppState;

#[component]
pub fn SignInPanel() -> Element {
    let mut app_state = use_context::<AppState>();
    let mut gateway_url = use_signal(|| app_state.settings.read().gateway_url.clone());
    let mut token = use_signal(String::new);

    let can_submit = !token().trim().is_empty() && !gateway_url().trim().is_empty();

    let mut submit = move || {
        if !can_submit {
            return;
        }
        let url = gateway_url();
        let access_token = token().trim().to_string();
        app_state.update_settings(move |settings| {
            settings.gateway_url = url;
            settings.access_token = Some(access_token);
        });
        tracing::info!("Signed in");
    };

    rsx! {
        div { class: "flex flex-1 items-center justify-center",
            div { class: "w-full max-w-sm p-6 rounded-2xl border border-[var(--border-subtle)] bg-[var(--bg-secondary)] flex flex-col gap-4",
                h2 { class: "text-lg font-semibold text-[var(--text-primary)]", "Sign in to ML Agent" }

                label { class: "flex flex-col gap-1 text-xs text-[var(--text-secondary)]",
                    "Gateway URL"
                    input {
                        class: "px-3 py-2 rounded-lg bg-transparent border border-[var(--border-subtle)] text-sm text-[var(--text-primary)] outline-none",
                        value: "{gateway_url}",
                        oninput: move |evt| gateway_url.set(evt.value()),
                    }
                }

                label { class: "flex flex-col gap-1 text-xs text-[var(--text-secondary)]",
                    "Access token"
                    input {
                        r#type: "password",
                        class: "px-3 py-2 rounded-lg bg-transparent border border-[var(--border-subtle)] text-sm text-[var(--text-primary)] outline-none",
                        value: "{token}",
                        oninput: move |evt| token.set(evt.value()),
                        onkeydown: move |evt: KeyboardEvent| {
                            if evt.key() == Key::Enter {
                                submit();
                            }
                        },
                    }
                }

                button {
                    class: "py-2 rounded-lg text-sm font-medium transition-all",
                    style: "background: var(--accent-primary); color: #F2EDE7;",
                    disabled: !can_submit,
                    onclick: move |_| submit(),
                    "Continue"
                }
            }
        }
    }
}
