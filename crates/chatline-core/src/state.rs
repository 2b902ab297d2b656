//! UI-agnostic conversation state
//!
//! This module contains the data structures shared by every front end:
//! the messages, the append-only transcript that holds them, and the
//! per-submission exchange state machine.

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Remote,
}

/// A single transcript entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    sender: Sender,
    text: String,
    /// Set when the text is a rendered failure rather than a real reply
    failed: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            failed: false,
        }
    }

    pub fn remote(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Remote,
            text: text.into(),
            failed: false,
        }
    }

    pub(crate) fn remote_error(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Remote,
            text: text.into(),
            failed: true,
        }
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True for remote messages that describe a failed exchange
    pub fn is_error(&self) -> bool {
        self.failed
    }
}

/// Ordered, append-only list of messages for the session.
///
/// Only the controller appends; nothing removes or edits an entry.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }
}

/// Lifecycle of one submission.
///
/// `Idle -> Sending -> {RenderedSuccess | RenderedError} -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeState {
    #[default]
    Idle,
    Sending,
    RenderedSuccess,
    RenderedError,
}

/// Returned when a transition is requested from the wrong state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: ExchangeState,
    pub to: ExchangeState,
}

impl ExchangeState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ExchangeState::Sending)
    }

    /// Idle -> Sending
    pub fn begin(self) -> Result<Self, InvalidTransition> {
        match self {
            ExchangeState::Idle => Ok(ExchangeState::Sending),
            from => Err(InvalidTransition {
                from,
                to: ExchangeState::Sending,
            }),
        }
    }

    /// Sending -> RenderedSuccess | RenderedError
    pub fn settle(self, success: bool) -> Result<Self, InvalidTransition> {
        let to = if success {
            ExchangeState::RenderedSuccess
        } else {
            ExchangeState::RenderedError
        };
        match self {
            ExchangeState::Sending => Ok(to),
            from => Err(InvalidTransition { from, to }),
        }
    }

    /// Rendered* -> Idle. Idle stays Idle.
    pub fn finish(self) -> Result<Self, InvalidTransition> {
        match self {
            ExchangeState::RenderedSuccess | ExchangeState::RenderedError | ExchangeState::Idle => {
                Ok(ExchangeState::Idle)
            }
            ExchangeState::Sending => Err(InvalidTransition {
                from: self,
                to: ExchangeState::Idle,
            }),
        }
    }
}
