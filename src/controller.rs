use std::sync::Arc;

use crate::backend::{Backend, BackendError, QueryResponse, StatusResponse};
use crate::render::{render_message, render_tool_calls, Role};
use crate::view::{NetworkBadge, View};

pub const WELCOME_MESSAGE: &str = "Welcome to the AI Agent of Profit! Ask me about my wallet, token positions, market data, or any DeFi operations I can perform.";
pub const RESET_MESSAGE: &str = "Conversation has been reset. Ask me about your wallet, token positions, market data, or any DeFi operations you'd like to perform.";

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
const UNREACHABLE: &str = "Could not connect to the server. Please try again later.";
const WARN_UNINITIALIZED: &str = "⚠️ **Warning**: The MCP client is not initialized. Some functionality may be limited or unavailable.";
const WARN_UNREACHABLE: &str = "⚠️ **Warning**: Could not connect to the server. Some functionality may be limited or unavailable.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Submitting,
    Resetting,
}

fn error_notice(error: &BackendError) -> String {
    match error {
        BackendError::Api { error: Some(text), .. } if !text.is_empty() => format!("Error: {}", text),
        BackendError::Api { .. } => format!("Error: {}", GENERIC_FAILURE),
        BackendError::Transport(_) | BackendError::Decode(_) => format!("Error: {}", UNREACHABLE),
    }
}

/// Drives the conversation: turns input into backend requests and writes
/// the outcome to the view.
///
/// Each flow is split into a synchronous `begin_*` step, the backend call,
/// and a `finish_*` step, so an event loop can run the call elsewhere and
/// deliver the result later. The `async` helpers run a whole flow inline.
pub struct ChatController<V: View> {
    view: V,
    backend: Arc<dyn Backend>,
    network_name: String,
    input: String,
    pending_queries: usize,
    reset_pending: bool,
}

impl<V: View> ChatController<V> {
    pub fn new(view: V, backend: Arc<dyn Backend>, network_name: impl Into<String>) -> Self {
        ChatController {
            view,
            backend,
            network_name: network_name.into(),
            input: String::new(),
            pending_queries: 0,
            reset_pending: false,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        self.backend.clone()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn activity(&self) -> Activity {
        if self.pending_queries > 0 {
            Activity::Submitting
        } else if self.reset_pending {
            Activity::Resetting
        } else {
            Activity::Idle
        }
    }

    fn append(&mut self, role: Role, content: &str) {
        self.view.append_message(render_message(role, content));
        self.view.scroll_to_bottom();
    }

    /// Greet the user if nothing has been said yet.
    pub fn greet(&mut self) {
        if self.view.is_empty() {
            self.append(Role::System, WELCOME_MESSAGE);
        }
    }

    /// Start a submission from the current input.
    ///
    /// Returns the trimmed query to send, or `None` when the input is blank.
    /// The user message is shown right away and stays even if the request
    /// later fails.
    pub fn begin_submit(&mut self) -> Option<String> {
        let query = self.input.trim().to_string();
        if query.is_empty() {
            return None;
        }

        self.append(Role::User, &query);
        self.input.clear();
        self.view.set_loading(true);
        self.pending_queries += 1;

        Some(query)
    }

    /// Put a suggestion into the input and submit it.
    pub fn select_suggestion(&mut self, suggestion: &str) -> Option<String> {
        self.set_input(suggestion);
        self.begin_submit()
    }

    pub fn finish_submit(&mut self, result: Result<QueryResponse, BackendError>) {
        match result {
            Ok(reply) => {
                if !reply.tool_calls.is_empty() {
                    self.view.append_tool_calls(render_tool_calls(&reply.tool_calls));
                    self.view.scroll_to_bottom();
                }
                self.append(Role::Assistant, &reply.response);
            }
            Err(e) => {
                tracing::warn!("Query failed: {}", e);
                self.append(Role::System, &error_notice(&e));
            }
        }

        self.pending_queries = self.pending_queries.saturating_sub(1);
        self.view.set_loading(false);
    }

    #[allow(dead_code)]
    pub async fn submit(&mut self) {
        if let Some(query) = self.begin_submit() {
            let result = self.backend.query(&query).await;
            self.finish_submit(result);
        }
    }

    #[allow(dead_code)]
    pub async fn submit_suggestion(&mut self, suggestion: &str) {
        self.set_input(suggestion);
        self.submit().await;
    }

    pub fn begin_reset(&mut self) {
        self.reset_pending = true;
    }

    /// On failure the transcript is kept and the error only goes to the log.
    pub fn finish_reset(&mut self, result: Result<(), BackendError>) {
        self.reset_pending = false;

        match result {
            Ok(()) => {
                self.view.clear_transcript();
                self.append(Role::System, RESET_MESSAGE);
            }
            Err(e) => tracing::error!("Error resetting conversation: {}", e),
        }
    }

    #[allow(dead_code)]
    pub async fn reset(&mut self) {
        self.begin_reset();
        let result = self.backend.reset().await;
        self.finish_reset(result);
    }

    pub fn apply_status(&mut self, result: Result<StatusResponse, BackendError>) {
        match result {
            Ok(status) if status.mcp_client_initialized => {
                tracing::info!(tools = ?status.tools_count, "Backend ready");
                self.view
                    .set_network_badge(NetworkBadge::Connected(self.network_name.clone()));
            }
            Ok(_) => {
                self.append(Role::System, WARN_UNINITIALIZED);
                self.view.set_network_badge(NetworkBadge::Disconnected);
            }
            Err(e) => {
                tracing::warn!("Error checking server status: {}", e);
                self.append(Role::System, WARN_UNREACHABLE);
                self.view.set_network_badge(NetworkBadge::Disconnected);
            }
        }
    }

    #[allow(dead_code)]
    pub async fn check_status(&mut self) {
        let result = self.backend.status().await;
        self.apply_status(result);
    }
}
