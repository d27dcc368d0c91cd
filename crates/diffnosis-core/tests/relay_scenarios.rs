use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diffnosis_core::{
    Completer, CompletionResult, ConversationEntry, RelayError, RelaySession, Sex, Speaker,
    TurnState, UserProfile, FALLBACK_REPLY, GREETING, GREETING_WITH_IMAGE,
};
use tokio::sync::Semaphore;

/// Hands out queued results in order. Each call waits for a permit on the
/// gate, so a test can hold a request in flight for as long as it likes.
struct ScriptedCompleter {
    replies: Mutex<VecDeque<CompletionResult>>,
    prompts: Mutex<Vec<String>>,
    gate: Semaphore,
}

impl ScriptedCompleter {
    fn new(replies: Vec<CompletionResult>) -> Arc<Self> {
        Self::gated(replies, Semaphore::MAX_PERMITS)
    }

    fn gated(replies: Vec<CompletionResult>, permits: usize) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            gate: Semaphore::new(permits),
        })
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    async fn complete(&self, prompt: &str) -> CompletionResult {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let permit = self.gate.acquire().await.unwrap();
        permit.forget();
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| CompletionResult::Failure("no scripted reply".into()))
    }
}

fn alice() -> UserProfile {
    UserProfile {
        name: "Alice".into(),
        age: "30".into(),
        email: "a@example.com".into(),
        height: "170".into(),
        weight: "60".into(),
        sex: Sex::Female,
        photo: None,
    }
}

#[tokio::test]
async fn headache_turn_without_photo() {
    let completer = ScriptedCompleter::new(vec![CompletionResult::Success("Try resting.".into())]);
    let mut session = RelaySession::new(completer.clone());

    session.session_start(alice());
    assert_eq!(session.observe_log(), &[ConversationEntry::assistant(GREETING)]);
    assert_eq!(session.state(), TurnState::Idle);

    session.submit("I have a headache").unwrap();
    assert_eq!(session.state(), TurnState::Sending);
    assert_eq!(session.observe_log()[1], ConversationEntry::user("I have a headache"));

    session.wait_pending().await;
    assert_eq!(
        session.observe_log(),
        &[
            ConversationEntry::assistant(GREETING),
            ConversationEntry::user("I have a headache"),
            ConversationEntry::assistant("Try resting."),
        ]
    );
    assert_eq!(session.state(), TurnState::Idle);

    let prompts = completer.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("I have a headache"));
    assert!(prompts[0].contains("Email: a@example.com"));
    assert!(prompts[0].contains("Sex: Female"));
}

#[tokio::test]
async fn photo_triggers_image_analysis_turn() {
    let completer = ScriptedCompleter::new(vec![
        CompletionResult::Success("Looks like a mild rash.".into()),
        CompletionResult::Success("Keep it clean.".into()),
    ]);
    let mut session = RelaySession::new(completer.clone());

    session.session_start(alice().with_photo(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]));
    assert_eq!(session.observe_log(), &[ConversationEntry::assistant(GREETING_WITH_IMAGE)]);
    assert!(session.is_sending());

    // Free text waits until the image turn has resolved.
    assert!(matches!(session.submit("it itches"), Err(RelayError::Busy)));

    session.wait_pending().await;
    assert_eq!(session.observe_log().len(), 2);
    assert_eq!(
        session.observe_log()[1],
        ConversationEntry::assistant("Looks like a mild rash.")
    );
    assert!(completer.prompts()[0].contains("data:image/jpeg;base64,/9j/4AECAw=="));

    session.submit("it itches").unwrap();
    session.wait_pending().await;
    assert_eq!(session.observe_log().len(), 4);
}

#[tokio::test]
async fn submission_while_sending_leaves_log_untouched() {
    let completer = ScriptedCompleter::gated(vec![CompletionResult::Success("ok".into())], 0);
    let mut session = RelaySession::new(completer.clone());
    session.session_start(alice());
    session.submit("first").unwrap();
    let before = session.observe_log().to_vec();

    assert!(matches!(session.submit("second"), Err(RelayError::Busy)));
    assert!(!session.poll_pending().await);
    assert_eq!(session.observe_log(), before.as_slice());

    completer.release();
    session.wait_pending().await;
    assert_eq!(session.observe_log().len(), before.len() + 1);
    assert_eq!(completer.prompts().len(), 1);
}

#[tokio::test]
async fn poll_pending_resolves_once_finished() {
    let completer = ScriptedCompleter::new(vec![CompletionResult::Success("done".into())]);
    let mut session = RelaySession::new(completer);
    session.session_start(alice());
    session.submit("hello").unwrap();

    let mut resolved = false;
    for _ in 0..100 {
        if session.poll_pending().await {
            resolved = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert!(resolved);
    assert!(!session.poll_pending().await);
    let assistant_replies = session
        .observe_log()
        .iter()
        .filter(|e| e.speaker == Speaker::Assistant)
        .count();
    assert_eq!(assistant_replies, 2);
}

#[tokio::test]
async fn failure_shows_fixed_fallback_only() {
    let completer = ScriptedCompleter::new(vec![CompletionResult::Failure("malformed response".into())]);
    let mut session = RelaySession::new(completer);
    session.session_start(alice());
    session.submit("back pain").unwrap();
    session.wait_pending().await;

    let last = session.observe_log().last().unwrap();
    assert_eq!(last.text, FALLBACK_REPLY);
    assert!(!last.text.contains("malformed"));
}

#[tokio::test]
async fn session_end_empties_log_and_drops_late_result() {
    let completer = ScriptedCompleter::gated(vec![CompletionResult::Success("late".into())], 0);
    let mut session = RelaySession::new(completer.clone());
    session.session_start(alice());
    session.submit("cough").unwrap();

    session.session_end();
    assert!(session.observe_log().is_empty());
    assert!(!session.is_sending());
    assert!(!session.is_active());

    completer.release();
    tokio::task::yield_now().await;
    assert!(!session.wait_pending().await);
    assert!(session.observe_log().is_empty());
    assert!(matches!(session.submit("again"), Err(RelayError::SessionNotStarted)));
}
