//! Turn controller: one request/response cycle per user question.
//!
//! The controller owns the transcript and the turn state of a single chat
//! surface. A question is appended and dispatched synchronously by
//! [`TurnController::submit`]; the answer is recorded later by a spawned task
//! that only holds a weak reference to the session, so a torn-down session is
//! never written to.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use sakila_core::config::ChatConfig;

use crate::error::ChatError;
use crate::message::Message;
use crate::state::TurnState;
use crate::transcript::Transcript;
use crate::transport::{AnswerTransport, AskOutcome};

// =============================================================================
// Public types
// =============================================================================

/// User-facing strings for failed turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureText {
    /// Written when the service is unreachable or answers garbage.
    pub transport_failure: String,
    /// Written when the service reports a failure without a message.
    pub no_answer: String,
}

impl Default for FailureText {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for FailureText {
    fn from(config: &ChatConfig) -> Self {
        Self {
            transport_failure: config.transport_failure_text.clone(),
            no_answer: config.no_answer_text.clone(),
        }
    }
}

/// Everything a projector needs to render one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub pending: bool,
    /// Current content of the question field.
    pub draft: String,
    /// Increases on every published change.
    pub revision: u64,
    /// Number of resets so far. A change means earlier rows are gone.
    pub epoch: u64,
}

/// How a dispatched turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// The assistant message that was appended.
    Recorded(Message),
    /// The session was closed, dropped or reset before the answer arrived.
    Discarded,
}

/// Handle to a dispatched turn.
///
/// Dropping the handle does not cancel the turn.
#[derive(Debug)]
pub struct TurnHandle {
    settled: oneshot::Receiver<Settlement>,
    task: JoinHandle<()>,
}

impl TurnHandle {
    /// Wait for the turn to settle.
    pub async fn settled(self) -> Settlement {
        self.settled.await.unwrap_or(Settlement::Discarded)
    }

    /// Stop waiting for the service. The turn is recorded as a transport
    /// failure and the controller returns to idle.
    pub fn abort(&self) {
        self.task.abort();
    }
}

// =============================================================================
// Session
// =============================================================================

struct Session {
    id: Uuid,
    transcript: Transcript,
    state: TurnState,
    draft: String,
    /// Bumped by reset so stale settlements are dropped.
    epoch: u64,
    revision: u64,
    closed: bool,
    updates: Arc<watch::Sender<ChatSnapshot>>,
}

/// A snapshot waiting to be sent once the session lock is released.
///
/// Subscribers may hold a `watch` borrow while calling into the controller,
/// so the channel is never written with the session locked.
#[must_use]
struct Publication {
    updates: Arc<watch::Sender<ChatSnapshot>>,
    snapshot: ChatSnapshot,
}

impl Publication {
    /// Send unless a newer revision was already published.
    fn send(self) {
        let Publication { updates, snapshot } = self;
        updates.send_if_modified(move |current| {
            if snapshot.revision > current.revision {
                *current = snapshot;
                true
            } else {
                false
            }
        });
    }
}

impl Session {
    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.transcript.snapshot(),
            pending: self.state.is_pending(),
            draft: self.draft.clone(),
            revision: self.revision,
            epoch: self.epoch,
        }
    }

    fn publish(&mut self) -> Publication {
        self.revision += 1;
        Publication {
            updates: Arc::clone(&self.updates),
            snapshot: self.snapshot(),
        }
    }

    fn transition(&mut self, target: TurnState) {
        if self.state.can_transition_to(&target) {
            tracing::debug!(session = %self.id, "Turn state: {} -> {}", self.state, target);
        } else {
            tracing::warn!(session = %self.id, "Unexpected turn state change: {} -> {}", self.state, target);
        }
        self.state = target;
    }
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// TurnController
// =============================================================================

/// Orchestrates question/answer turns for one chat surface.
///
/// At most one turn is in flight; a submit while pending is ignored rather
/// than queued, so every answer pairs with the question before it.
pub struct TurnController {
    session: Arc<Mutex<Session>>,
    transport: Arc<dyn AnswerTransport>,
    text: Arc<FailureText>,
}

impl TurnController {
    pub fn new(transport: Arc<dyn AnswerTransport>, text: FailureText) -> Self {
        let (updates, _) = watch::channel(ChatSnapshot::default());
        let session = Session {
            id: Uuid::new_v4(),
            transcript: Transcript::new(),
            state: TurnState::Idle,
            draft: String::new(),
            epoch: 0,
            revision: 0,
            closed: false,
            updates: Arc::new(updates),
        };
        tracing::debug!(session = %session.id, "Chat session started");
        Self {
            session: Arc::new(Mutex::new(session)),
            transport,
            text: Arc::new(text),
        }
    }

    pub fn with_default_text(transport: Arc<dyn AnswerTransport>) -> Self {
        Self::new(transport, FailureText::default())
    }

    /// Ask `question` on behalf of the user.
    ///
    /// On success the user message is already in the transcript, the
    /// controller is pending and the draft is empty. Returns an error only
    /// when the call had no effect.
    pub fn submit(&self, question: &str) -> Result<TurnHandle, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ChatError::NoRuntime)?;

        let mut session = lock(&self.session);
        if session.closed {
            return Err(ChatError::SessionClosed);
        }
        if session.state.is_pending() {
            tracing::debug!(session = %session.id, "Submit ignored while a turn is pending");
            return Err(ChatError::TurnInFlight);
        }

        session.transcript.append(Message::user(question));
        session.transition(TurnState::Pending);
        session.draft.clear();
        let publication = session.publish();

        let session_id = session.id;
        let epoch = session.epoch;
        drop(session);
        publication.send();

        let (reply, settled) = oneshot::channel();
        let guard = SettleGuard {
            session: Arc::downgrade(&self.session),
            epoch,
            text: Arc::clone(&self.text),
            reply: Some(reply),
        };
        let transport = Arc::clone(&self.transport);
        let question = question.to_string();
        let span = tracing::debug_span!("turn", session = %session_id);

        tracing::debug!(session = %session_id, question_len = question.len(), "Question dispatched");
        let task = runtime.spawn(
            async move {
                let outcome = transport.ask(&question).await;
                guard.settle(outcome);
            }
            .instrument(span),
        );

        Ok(TurnHandle { settled, task })
    }

    /// Submit the current draft.
    pub fn submit_draft(&self) -> Result<TurnHandle, ChatError> {
        let draft = lock(&self.session).draft.clone();
        self.submit(&draft)
    }

    /// Replace the question field content.
    pub fn set_draft(&self, text: &str) {
        let mut session = lock(&self.session);
        if session.closed {
            return;
        }
        session.draft = text.to_string();
        let publication = session.publish();
        drop(session);
        publication.send();
    }

    pub fn draft(&self) -> String {
        lock(&self.session).draft.clone()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        lock(&self.session).snapshot()
    }

    /// Receive a new snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        lock(&self.session).updates.subscribe()
    }

    pub fn state(&self) -> TurnState {
        lock(&self.session).state
    }

    pub fn is_pending(&self) -> bool {
        self.state().is_pending()
    }

    pub fn session_id(&self) -> Uuid {
        lock(&self.session).id
    }

    /// Start over with an empty transcript. A turn still in flight is
    /// discarded when it settles.
    pub fn reset(&self) {
        let mut session = lock(&self.session);
        if session.closed {
            return;
        }
        session.transcript.clear();
        session.state = TurnState::Idle;
        session.draft.clear();
        session.epoch += 1;
        let publication = session.publish();
        tracing::debug!(session = %session.id, epoch = session.epoch, "Chat session reset");
        drop(session);
        publication.send();
    }

    /// Tear the session down. Later submits fail and outstanding settlements
    /// are ignored; the last snapshot stays readable.
    pub fn close(&self) {
        let mut session = lock(&self.session);
        if !session.closed {
            session.closed = true;
            tracing::debug!(session = %session.id, "Chat session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.session).closed
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// Records exactly one assistant message for a turn.
///
/// If the transport task ends without settling (panic or abort), the drop
/// impl records a transport failure so the controller always returns to idle.
struct SettleGuard {
    session: Weak<Mutex<Session>>,
    epoch: u64,
    text: Arc<FailureText>,
    reply: Option<oneshot::Sender<Settlement>>,
}

impl SettleGuard {
    fn settle(mut self, outcome: AskOutcome) {
        self.finish(outcome);
    }

    fn finish(&mut self, outcome: AskOutcome) {
        let Some(reply) = self.reply.take() else {
            return;
        };
        let settlement = record(&self.session, self.epoch, &self.text, outcome);
        let _ = reply.send(settlement);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.reply.is_some() {
            self.finish(AskOutcome::transport("turn ended before the service answered"));
        }
    }
}

fn record(
    session: &Weak<Mutex<Session>>,
    epoch: u64,
    text: &FailureText,
    outcome: AskOutcome,
) -> Settlement {
    let Some(session) = session.upgrade() else {
        tracing::debug!(kind = outcome.kind(), "Session dropped; settlement discarded");
        return Settlement::Discarded;
    };
    let mut session = lock(&session);
    if session.closed || session.epoch != epoch {
        tracing::debug!(session = %session.id, kind = outcome.kind(), "Stale settlement discarded");
        return Settlement::Discarded;
    }

    let message = match outcome {
        AskOutcome::Answer(payload) => Message::answer(payload.to_display_text()),
        AskOutcome::ServiceError { message } => {
            tracing::info!(session = %session.id, message = ?message, "Service reported a failure");
            Message::failure(message.unwrap_or_else(|| text.no_answer.clone()))
        }
        AskOutcome::TransportError { message } => {
            tracing::warn!(session = %session.id, error = %message, "Answering service unavailable");
            Message::failure(text.transport_failure.clone())
        }
    };

    session.transcript.append(message.clone());
    session.transition(TurnState::Idle);
    let publication = session.publish();
    tracing::debug!(session = %session.id, status = ?message.status(), "Turn settled");
    drop(session);
    publication.send();
    Settlement::Recorded(message)
}
