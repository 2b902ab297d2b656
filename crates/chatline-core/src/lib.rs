pub mod config;
pub mod controller;
pub mod error;
pub mod state;
pub mod transport;

// Re-export main types for convenience
pub use config::Config;
pub use controller::{ChatController, Focus, SubmitOutcome, ViewState};
pub use error::ChatError;
pub use state::{ExchangeState, Message, Sender, Transcript};
pub use transport::{ChatTransport, HttpTransport};
