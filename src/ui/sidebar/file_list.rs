use dioxus::prelude::*;

use crate::app::AppState;
use crate::gateway::{GatewayClient, GatewayError};
use crate::types::session::FileItem;

async fn fetch_files(client: &GatewayClient) -> Result<(Vec<FileItem>, Option<String>), GatewayError> {
    let files = client.list_files().await?;
    let active = match files.iter().find(|file| file.is_active()) {
        Some(file) => Some(file.file_name.clone()),
        None => client.get_active_file().await?.map(|file| file.file_name),
    };
    Ok((files, active))
}

/// Reload the dataset list and the active dataset
pub async fn refresh_files(mut state: AppState) {
    let result = match state.client() {
        Ok(client) => fetch_files(&client).await,
        Err(e) => Err(e),
    };
    match result {
        Ok((files, active)) => {
            tracing::debug!("{} files, active: {:?}", files.len(), active);
            state.files.set(files);
            state.active_file.set(active);
        }
        Err(e) => state.report("Could not load files", e),
    }
}

async fn activate_file(mut state: AppState, file_name: String) {
    let result = match state.client() {
        Ok(client) => client.set_active_file(&file_name).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => state.active_file.set(Some(file_name)),
        Err(e) => state.report("Could not select file", e),
    }
}

async fn remove_file(mut state: AppState, file_name: String) {
    let result = match state.client() {
        Ok(client) => client.delete_file(&file_name).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => refresh_files(state).await,
        Err(e) => state.report("Could not delete file", e),
    }
}

#[component]
pub fn FileList() -> Element {
    let app_state = use_context::<AppState>();
    let files = app_state.files.read().clone();
    let active = app_state.active_file.read().clone();

    rsx! {
        div { class: "border-t border-[var(--border-subtle)] p-2 space-y-1 max-h-64 overflow-y-auto scrollbar-thin",
            div { class: "text-[10px] uppercase tracking-widest text-[var(--text-tertiary)] font-semibold px-3 py-2 select-none opacity-60",
                "Datasets"
            }

            if files.is_empty() {
                div { class: "px-3 py-2 text-xs text-[var(--text-tertiary)] opacity-50", "No files uploaded" }
            }

            {files.into_iter().map(|file| {
                let is_active = active.as_deref() == Some(file.file_name.as_str());
                let row_class = if is_active {
                    "group flex items-center gap-2 px-3 py-1.5 rounded-lg bg-white/[0.08] text-[var(--text-primary)] cursor-pointer"
                } else {
                    "group flex items-center gap-2 px-3 py-1.5 rounded-lg hover:bg-white/[0.05] text-[var(--text-secondary)] cursor-pointer"
                };
                let detail = file.file_type.clone().unwrap_or_default();
                let select_name = file.file_name.clone();
                let delete_name = file.file_name.clone();

                rsx! {
                    div {
                        key: "{file.file_name}",
                        class: row_class,
                        onclick: move |_| {
                            if !is_active {
                                spawn(activate_file(app_state, select_name.clone()));
                            }
                        },
                        div { class: "truncate flex-1 text-sm", "{file.file_name}" }
                        span { class: "text-[10px] text-[var(--text-tertiary)]", "{detail}" }
                        button {
                            class: "opacity-0 group-hover:opacity-100 transition-opacity p-1 rounded-md hover:bg-white/[0.08] text-[var(--text-tertiary)] hover:text-[var(--text-error)]",
                            title: "Delete file",
                            onclick: move |evt| {
                                evt.stop_propagation();
                                spawn(remove_file(app_state, delete_name.clone()));
                            },
                            svg {
                                width: "12",
                                height: "12",
                                view_box: "0 0 24 24",
                                fill: "none",
                                stroke: "currentColor",
                                stroke_width: "2",
                                stroke_linecap: "round",
                                stroke_linejoin: "round",
                                line { x1: "18", y1: "6", x2: "6", y2: "18" }
                                line { x1: "6", y1: "6", x2: "18", y2: "18" }
                            }
                        }
                    }
                }
            })}
        }
    }
}
