pub mod completion;
pub mod transport;

pub use completion::{
    parse_completion, ChatMessage, ChatRole, CompletionClient, CompletionOptions,
    CompletionRequest, CompletionResult, Completer,
};
pub use transport::{HttpTransport, Transport};
