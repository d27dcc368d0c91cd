//! Turn orchestration
//!
//! A [`RelaySession`] ties the prompt builders, a [`Completer`] and the
//! conversation log together. At most one completion is in flight: while a
//! turn is `Sending`, further submissions are rejected rather than queued.
//! The network call runs on a spawned tokio task; the front-end resolves it
//! with [`RelaySession::poll_pending`] from its event loop, or awaits it with
//! [`RelaySession::wait_pending`].

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ai::{Completer, CompletionResult};
use crate::conversation::{ConversationEntry, ConversationLog};
use crate::error::RelayError;
use crate::profile::UserProfile;
use crate::prompt::{build_image_prompt, build_symptom_prompt};

pub const GREETING: &str = "Hello! I am your virtual health assistant. I'm here to help you \
understand your symptoms and provide information based on your input. Please describe your symptoms:";

pub const GREETING_WITH_IMAGE: &str = "Hello! I am your virtual health assistant. I'm here to help \
you understand your symptoms and provide information based on your input. I have analyzed the image you provided.";

pub const FALLBACK_REPLY: &str = "Sorry, I couldn't get a response.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
}

pub struct RelaySession {
    completer: Arc<dyn Completer>,
    profile: Option<UserProfile>,
    log: ConversationLog,
    pending: Option<JoinHandle<CompletionResult>>,
}

impl RelaySession {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self {
            completer,
            profile: None,
            log: ConversationLog::new(),
            pending: None,
        }
    }

    pub fn state(&self) -> TurnState {
        if self.pending.is_some() {
            TurnState::Sending
        } else {
            TurnState::Idle
        }
    }

    pub fn is_sending(&self) -> bool {
        self.state() == TurnState::Sending
    }

    pub fn is_active(&self) -> bool {
        self.profile.is_some()
    }

    pub fn observe_log(&self) -> &[ConversationEntry] {
        self.log.entries()
    }

    /// Begin a session for `profile`. With a usable photo the image-analysis
    /// turn is fired straight away; otherwise the session waits for text.
    pub fn session_start(&mut self, profile: UserProfile) {
        self.session_end();

        let image_prompt = match profile.usable_photo().map(build_image_prompt) {
            Some(Ok(prompt)) => Some(prompt),
            Some(Err(e)) => {
                warn!("Skipping image analysis: {e}");
                None
            }
            None => {
                if profile.photo.is_some() {
                    warn!("Profile photo is empty, starting without image analysis");
                }
                None
            }
        };

        info!(with_image = image_prompt.is_some(), "Session started");
        self.profile = Some(profile);

        match image_prompt {
            Some(prompt) => {
                self.log.append_assistant(GREETING_WITH_IMAGE);
                self.dispatch(prompt);
            }
            None => self.log.append_assistant(GREETING),
        }
    }

    /// Submit the user's text. Rejected with no effect on the log while a
    /// turn is in flight or when the text is blank.
    pub fn submit(&mut self, text: &str) -> Result<(), RelayError> {
        let Some(profile) = self.profile.as_ref() else {
            return Err(RelayError::SessionNotStarted);
        };
        if self.is_sending() {
            debug!("Submission rejected: request already in flight");
            return Err(RelayError::Busy);
        }
        if text.trim().is_empty() {
            return Err(RelayError::EmptyInput);
        }

        let prompt = build_symptom_prompt(text, profile);
        self.log.append_user(text);
        self.dispatch(prompt);
        Ok(())
    }

    /// End the session: empty the log and forget the profile. An in-flight
    /// request is aborted and its result never reaches any log.
    pub fn session_end(&mut self) {
        if let Some(task) = self.pending.take() {
            debug!("Session ended with a request in flight, aborting it");
            task.abort();
        }
        if self.profile.take().is_some() {
            info!("Session ended");
        }
        self.log.clear();
    }

    /// Apply the in-flight result if it has arrived. Returns true when the
    /// log changed.
    pub async fn poll_pending(&mut self) -> bool {
        let finished = self.pending.as_ref().map(|task| task.is_finished()).unwrap_or(false);
        if !finished {
            return false;
        }
        self.wait_pending().await
    }

    /// Wait for the in-flight turn, however long the transport takes.
    /// Returns true when a turn was resolved.
    pub async fn wait_pending(&mut self) -> bool {
        let Some(task) = self.pending.take() else {
            return false;
        };

        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Completion task did not finish: {e}");
                CompletionResult::Failure(e.to_string())
            }
        };

        match result {
            CompletionResult::Success(text) => self.log.append_assistant(text),
            CompletionResult::Failure(reason) => {
                debug!("Turn failed ({reason}), showing fallback reply");
                self.log.append_assistant(FALLBACK_REPLY);
            }
        }
        true
    }

    fn dispatch(&mut self, prompt: String) {
        let completer = Arc::clone(&self.completer);
        self.pending = Some(tokio::spawn(async move {
            completer.complete(&prompt).await
        }));
    }
}
