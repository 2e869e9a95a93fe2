//! Root Dioxus application component
//!
//! Holds the shared state every view reads from and the handful of
//! transitions that touch several signals at once.

use std::sync::Arc;

use dioxus::prelude::*;
use uuid::Uuid;

use crate::gateway::{GatewayClient, GatewayError};
use crate::storage::settings::{load_settings, save_settings, AppSettings};
use crate::stream::StopSignal;
use crate::types::message::Message;
use crate::types::session::{ActiveSession, FileItem, Session};
use crate::ui::code_state::CodeBlockStates;
use crate::ui::Layout;

/// Global application state shared across components
#[derive(Clone, Copy)]
pub struct AppState {
    pub settings: Signal<AppSettings>,
    pub sessions: Signal<Vec<Session>>,
    pub current_session: Signal<Option<ActiveSession>>,
    pub files: Signal<Vec<FileItem>>,
    pub active_file: Signal<Option<String>>,
    pub messages: Signal<Vec<Message>>,
    pub code_blocks: Signal<CodeBlockStates>,
    /// Message currently receiving chunks
    pub streaming_id: Signal<Option<Uuid>>,
    pub is_generating: Signal<bool>,
    /// Last non-fatal request error, shown inline
    pub error: Signal<Option<String>>,
    pub stop_signal: Signal<Arc<StopSignal>>,
}

impl AppState {
    pub fn new() -> Self {
        let settings = load_settings();
        let current_session = settings.active_session.clone();
        tracing::info!(
            "AppState initialized (gateway {}, signed in: {})",
            settings.gateway_url,
            settings.is_signed_in()
        );

        Self {
            settings: Signal::new(settings),
            sessions: Signal::new(Vec::new()),
            current_session: Signal::new(current_session),
            files: Signal::new(Vec::new()),
            active_file: Signal::new(None),
            messages: Signal::new(Vec::new()),
            code_blocks: Signal::new(CodeBlockStates::new()),
            streaming_id: Signal::new(None),
            is_generating: Signal::new(false),
            error: Signal::new(None),
            stop_signal: Signal::new(Arc::new(StopSignal::new())),
        }
    }

    /// Client for the current settings snapshot
    pub fn client(&self) -> Result<GatewayClient, GatewayError> {
        GatewayClient::new(&self.settings.read())
    }

    pub fn stop_flag(&self) -> Arc<StopSignal> {
        self.stop_signal.read().clone()
    }

    /// Persist a settings change
    pub fn update_settings(&mut self, update: impl FnOnce(&mut AppSettings)) {
        let mut settings = self.settings.write();
        update(&mut *settings);
        settings.validate();
        if let Err(e) = save_settings(&*settings) {
            tracing::error!("Failed to save settings: {}", e);
        }
    }

    /// Route a failed request: credentials problems end the session,
    /// anything else is shown inline.
    pub fn report(&mut self, context: &str, err: GatewayError) {
        if err.is_unauthorized() {
            tracing::warn!("{}: {}; signing out", context, err);
            self.sign_out();
        } else {
            tracing::error!("{}: {}", context, err);
            self.error.set(Some(format!("{context}: {err}")));
        }
    }

    /// Forget credentials and everything fetched with them
    pub fn sign_out(&mut self) {
        self.stop_flag().raise();
        self.update_settings(AppSettings::sign_out);
        self.current_session.set(None);
        self.sessions.set(Vec::new());
        self.files.set(Vec::new());
        self.active_file.set(None);
        self.clear_conversation();
        self.is_generating.set(false);
        self.error.set(None);
    }

    pub fn clear_conversation(&mut self) {
        self.messages.set(Vec::new());
        self.code_blocks.write().clear();
        self.streaming_id.set(None);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[component]
pub fn App() -> Element {
    let app_state = use_context_provider(AppState::new);
    let theme = app_state.settings.read().theme.clone();

    rsx! {
        div { class: "theme-{theme} h-screen",
            Layout {}
        }
    }
}
