pub mod ai;
pub mod config;
pub mod conversation;
pub mod error;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod session;

use std::sync::Arc;

// Re-export main types for convenience
pub use ai::{Completer, CompletionClient, CompletionOptions, CompletionResult, HttpTransport, Transport};
pub use config::{Config, RelaySettings};
pub use conversation::{ConversationEntry, ConversationLog, Speaker};
pub use error::RelayError;
pub use profile::{Sex, UserProfile};
pub use prompt::{build_image_prompt, build_symptom_prompt};
pub use provider::Provider;
pub use session::{RelaySession, TurnState, FALLBACK_REPLY, GREETING, GREETING_WITH_IMAGE};

/// Build the HTTP-backed completer described by `settings`.
pub fn http_completer(settings: &RelaySettings) -> Result<Arc<dyn Completer>, RelayError> {
    let transport = HttpTransport::from_settings(settings)?;
    Ok(Arc::new(CompletionClient::new(transport, CompletionOptions::from(settings))))
}
