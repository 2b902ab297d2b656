//! Chat interaction controller
//!
//! Owns the transcript, the view state of the input controls and the
//! pending flag, and runs at most one exchange at a time. Front ends either
//! call [`ChatController::submit`] directly or split it into
//! [`ChatController::begin`] and [`ChatController::settle`] so they can keep
//! drawing while the request is outstanding.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ChatError;
use crate::state::{ExchangeState, Message, Transcript};
use crate::transport::ChatTransport;

/// Which widget owns keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Transcript,
}

/// State of the controls the controller drives
#[derive(Debug, Clone)]
pub struct ViewState {
    pub input: String,
    /// Cursor position in `input`, counted in chars
    pub cursor: usize,
    pub input_enabled: bool,
    pub send_enabled: bool,
    pub indicator_visible: bool,
    pub focus: Focus,
    /// Keep the latest message in view; cleared when the user scrolls back
    pub follow_latest: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            input: String::new(),
            cursor: 0,
            input_enabled: true,
            send_enabled: true,
            indicator_visible: false,
            focus: Focus::Input,
            follow_latest: true,
        }
    }
}

/// How a call to [`ChatController::submit`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input or an exchange already in flight; nothing happened
    Ignored,
    Replied,
    Failed,
}

pub struct ChatController {
    transport: Arc<dyn ChatTransport>,
    transcript: Transcript,
    view: ViewState,
    state: ExchangeState,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl ChatController {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            transcript: Transcript::new(),
            view: ViewState::default(),
            state: ExchangeState::Idle,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Shared handle to the transport, for callers that spawn the request themselves
    pub fn transport(&self) -> Arc<dyn ChatTransport> {
        Arc::clone(&self.transport)
    }

    /// Run one full exchange with whatever is in the input field.
    ///
    /// Never fails: transport errors end up in the transcript.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(text) = self.begin() else {
            return SubmitOutcome::Ignored;
        };
        let outcome = self.transport.send(&text).await;
        let failed = outcome.is_err();
        self.settle(outcome);
        if failed {
            SubmitOutcome::Failed
        } else {
            SubmitOutcome::Replied
        }
    }

    /// Start an exchange: record the user message, clear and lock the input.
    ///
    /// Returns the text to send, or `None` when the trimmed input is empty
    /// or another exchange is still pending.
    pub fn begin(&mut self) -> Option<String> {
        if self.state.is_pending() {
            warn!("submit ignored: an exchange is already pending");
            return None;
        }

        let text = self.view.input.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();

        let next = match self.state.finish().and_then(ExchangeState::begin) {
            Ok(next) => next,
            Err(err) => {
                warn!(?err, "submit ignored: invalid exchange state");
                return None;
            }
        };

        self.transcript.push(Message::user(text.clone()));
        self.view.follow_latest = true;

        self.view.input.clear();
        self.view.cursor = 0;

        self.state = next;
        self.view.input_enabled = false;
        self.view.send_enabled = false;
        self.view.indicator_visible = true;

        info!(chars = text.chars().count(), "exchange started");
        Some(text)
    }

    /// Finish the pending exchange with its outcome and unlock the input.
    ///
    /// Ignored when nothing is pending.
    pub fn settle(&mut self, outcome: Result<String, ChatError>) {
        let success = outcome.is_ok();
        let rendered = match self.state.settle(success) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(?err, "settle ignored: no exchange pending");
                return;
            }
        };

        let message = match outcome {
            Ok(reply) => {
                info!(chars = reply.chars().count(), "exchange settled");
                Message::remote(reply)
            }
            Err(err) => {
                warn!(error = %err, "exchange failed");
                Message::remote_error(err.user_message())
            }
        };
        self.transcript.push(message);
        self.view.follow_latest = true;

        self.view.indicator_visible = false;
        self.state = rendered.finish().unwrap_or(ExchangeState::Idle);
        self.view.input_enabled = true;
        self.view.send_enabled = true;
        self.view.focus = Focus::Input;
    }

    /// Replace the whole input field, cursor at the end
    pub fn set_input(&mut self, text: impl Into<String>) {
        if !self.view.input_enabled {
            return;
        }
        self.view.input = text.into();
        self.view.cursor = self.view.input.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        if !self.view.input_enabled {
            return;
        }
        let byte_pos = char_to_byte_index(&self.view.input, self.view.cursor);
        self.view.input.insert(byte_pos, c);
        self.view.cursor += 1;
    }

    /// Delete the character before the cursor
    pub fn backspace(&mut self) {
        if !self.view.input_enabled || self.view.cursor == 0 {
            return;
        }
        self.view.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.view.input, self.view.cursor);
        self.view.input.remove(byte_pos);
    }

    /// Delete the character at the cursor
    pub fn delete(&mut self) {
        if !self.view.input_enabled {
            return;
        }
        if self.view.cursor < self.view.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.view.input, self.view.cursor);
            self.view.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.view.cursor = self.view.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.view.input.chars().count();
        self.view.cursor = (self.view.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.view.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.view.cursor = self.view.input.chars().count();
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.view.focus = focus;
    }

    /// Stop pinning the view to the newest message (user scrolled back)
    pub fn unfollow(&mut self) {
        self.view.follow_latest = false;
    }

    pub fn follow(&mut self) {
        self.view.follow_latest = true;
    }
}
