//! The per-record review cycle as an explicit state machine.
//!
//! ```text
//! Reviewing(i) --ChooseA|ChooseB--> record verdict, advance --> Reviewing(i+1) | Complete
//! Reviewing(i) --ChooseNeither--> AwaitingCustomInput(i)
//! AwaitingCustomInput(i) --Submit--> record verdict, advance --> Reviewing(i+1) | Complete
//! AwaitingCustomInput(i) --Cancel--> Reviewing(i)
//! Reviewing(i) --Back--> Reviewing(i-1)
//! Complete --Restart--> Reviewing(0)
//! ```
//!
//! Every cursor move is persisted before the transition returns. A failed
//! save does not undo the transition: the in-memory state stays
//! authoritative and the failure is reported in the [`Outcome`].

use std::fmt;

use indexmap::IndexMap;
use lawrecon_core::{
    ChosenSource, DiffRow, LegislationTypeProfile, PairedRecord, Progress, QueueError,
    ReviewQueue, ReviewState, Value, Verdict, build_rows,
};
use lawrecon_store::{PersistError, VerdictStore};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Reviewing(usize),
    AwaitingCustomInput(usize),
    Complete,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Reviewing(i) => write!(f, "reviewing pair {}", i + 1),
            SessionState::AwaitingCustomInput(i) => {
                write!(f, "awaiting custom input for pair {}", i + 1)
            }
            SessionState::Complete => f.write_str("complete"),
        }
    }
}

/// A reviewer action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ChooseA,
    ChooseB,
    ChooseNeither,
    Submit(IndexMap<String, Value>),
    Cancel,
    Back,
    Restart,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::ChooseA => "choose A",
            Action::ChooseB => "choose B",
            Action::ChooseNeither => "choose neither",
            Action::Submit(_) => "submit",
            Action::Cancel => "cancel",
            Action::Back => "back",
            Action::Restart => "restart",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Result of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub state: SessionState,
    /// Set when the transition's save failed.
    pub persist_warning: Option<String>,
}

pub struct ReviewSession {
    queue: ReviewQueue,
    profile: LegislationTypeProfile,
    store: VerdictStore,
    state: SessionState,
}

impl ReviewSession {
    /// Start a session, resuming from the store's persisted cursor.
    pub fn new(mut queue: ReviewQueue, profile: LegislationTypeProfile, store: VerdictStore) -> Self {
        let persisted = store.snapshot().cursor;
        queue.seek(persisted);
        if queue.cursor() != persisted {
            warn!(
                persisted,
                paired = queue.paired_count(),
                "persisted cursor beyond paired records, clamped"
            );
        }
        let mut session = Self {
            queue,
            profile,
            store,
            state: SessionState::Complete,
        };
        session.state = session.derive_state();
        info!(kind = %session.profile.key, state = %session.state, "review session started");
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn queue(&self) -> &ReviewQueue {
        &self.queue
    }

    pub fn profile(&self) -> &LegislationTypeProfile {
        &self.profile
    }

    pub fn store(&self) -> &VerdictStore {
        &self.store
    }

    /// Persisted state, for listing and export.
    pub fn snapshot(&self) -> &ReviewState {
        self.store.snapshot()
    }

    pub fn progress(&self) -> Progress {
        self.queue.progress()
    }

    /// The pair under review, if any.
    pub fn current(&self) -> Option<PairedRecord<'_>> {
        self.queue.current().ok()
    }

    /// Diff rows of the pair under review.
    pub fn rows(&self) -> Option<Vec<DiffRow>> {
        self.current()
            .map(|pair| build_rows(pair.record_a, pair.record_b, &self.profile))
    }

    /// Fields for the custom-input form, pre-filled from source A.
    pub fn custom_template(&self) -> Option<IndexMap<String, String>> {
        self.current().map(|pair| pair.record_a.to_text_fields())
    }

    pub fn apply(&mut self, action: Action) -> Result<Outcome, SessionError> {
        let name = action.name();
        debug!(state = %self.state, action = name, "applying action");
        match (self.state, action) {
            (SessionState::Reviewing(_), Action::ChooseA) => {
                let fields = self.queue.current()?.record_a.to_fields();
                Ok(self.record(ChosenSource::A, fields))
            }
            (SessionState::Reviewing(_), Action::ChooseB) => {
                let fields = self.queue.current()?.record_b.to_fields();
                Ok(self.record(ChosenSource::B, fields))
            }
            (SessionState::Reviewing(i), Action::ChooseNeither) => {
                self.state = SessionState::AwaitingCustomInput(i);
                Ok(self.outcome(None))
            }
            (SessionState::AwaitingCustomInput(_), Action::Submit(fields)) => {
                Ok(self.record(ChosenSource::Custom, fields))
            }
            (SessionState::AwaitingCustomInput(i), Action::Cancel) => {
                self.state = SessionState::Reviewing(i);
                Ok(self.outcome(None))
            }
            (SessionState::Reviewing(_), Action::Back) => {
                self.queue.retreat();
                let saved = self.store.set_cursor(self.queue.cursor());
                self.state = self.derive_state();
                Ok(self.outcome(saved.err()))
            }
            (SessionState::Complete, Action::Restart) => {
                self.queue.reset();
                let saved = self.store.set_cursor(self.queue.cursor());
                self.state = self.derive_state();
                info!(verdicts = self.snapshot().verdicts.len(), "restarted review");
                Ok(self.outcome(saved.err()))
            }
            (state, _) => Err(SessionError::InvalidTransition {
                state,
                action: name,
            }),
        }
    }

    /// Wipe every verdict and return to the first pair.
    pub fn clear_all(&mut self) -> Outcome {
        let saved = self.store.clear_all();
        self.queue.reset();
        self.state = self.derive_state();
        self.outcome(saved.err())
    }

    fn record(&mut self, source: ChosenSource, fields: IndexMap<String, Value>) -> Outcome {
        let index = self.queue.cursor();
        self.queue.advance();
        let saved = self
            .store
            .append_and_seek(Verdict::now(source, fields), self.queue.cursor());
        self.state = self.derive_state();
        info!(index, source = %source, next = %self.state, "verdict recorded");
        self.outcome(saved.err())
    }

    fn outcome(&self, err: Option<PersistError>) -> Outcome {
        Outcome {
            state: self.state,
            persist_warning: err.map(|e| e.to_string()),
        }
    }

    fn derive_state(&self) -> SessionState {
        if self.queue.is_complete() {
            SessionState::Complete
        } else {
            SessionState::Reviewing(self.queue.cursor())
        }
    }
}
