//! Shared, replaying wrapper around a value stream.
//!
//! A [`CachedStream`] subscribes to its upstream when the first observer
//! attaches and shares that single run with every later observer.
//!
//! # State Machine
//!
//! ```text
//!                 first observer                 upstream emits
//!  NotSubscribed ───────────────▶ Pending ─────────────────────▶ Live(v)
//!        ▲                          │  │                          │  │
//!        │   last observer leaves   │  │   complete / error       │  │
//!        └──────────────────────────┘  └───────────┬──────────────┘  │
//!        └───────────────────────────────────────────────────────────┘
//!                                                  ▼
//!                                      Completed / Failed (final)
//! ```
//!
//! - Late observers of a live run get the latest value immediately.
//! - When the last observer leaves a non-final run, the upstream is torn down
//!   and the value dropped; the next observer starts a fresh run.
//! - A final run keeps its last value and terminal signal and replays both.
//!   Under [`ErrorPolicy::Retry`] a failed run is instead restarted by the
//!   next observer.
//!
//! # Thread Safety
//!
//! State lives behind one mutex which is never held while calling the
//! upstream or an observer, so callbacks may subscribe or detach re-entrantly.
//! Every upstream run carries a generation number; signals from a run that
//! has been abandoned are ignored.

use super::{Notification, Observer, Source, Subscription, ValueStream};
use crate::error::StreamError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    mem,
    sync::{Arc, Weak},
};

/// What a cached stream does with an upstream error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// The error is final and replayed to late observers.
    #[default]
    Terminal,
    /// The next observer after an error restarts the upstream.
    Retry,
}

/// Observable state of a cached stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus<T> {
    /// No observer, no upstream run.
    NotSubscribed,
    /// Upstream running, nothing emitted yet.
    Pending,
    /// Upstream running, latest value attached.
    Live(T),
    /// Upstream completed, with the last value if there was one.
    Completed(Option<T>),
    Failed(StreamError),
}

#[derive(Clone)]
enum Terminal {
    Completed,
    Failed(StreamError),
}

impl Terminal {
    fn notify<T>(&self, observer: &Observer<T>) {
        match self {
            Self::Completed => observer.complete(),
            Self::Failed(err) => observer.error(err.clone()),
        }
    }
}

/// Upstream connection state.
enum Link {
    Idle,
    /// Upstream `subscribe` is in progress.
    Connecting,
    Live(Subscription),
}

struct State<T> {
    observers: Vec<(u64, Observer<T>)>,
    next_id: u64,
    generation: u64,
    link: Link,
    value: Option<T>,
    /// Bumped on every upstream value.
    version: u64,
    terminal: Option<Terminal>,
}

impl<T> State<T> {
    fn register(&mut self, observer: Observer<T>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }
}

struct Shared<T> {
    upstream: ValueStream<T>,
    policy: ErrorPolicy,
    state: Mutex<State<T>>,
}

/// Replaying wrapper sharing one upstream run between observers.
///
/// Usually created through [`ValueStream::cached`].
pub struct CachedStream<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + 'static> CachedStream<T> {
    pub fn new(upstream: ValueStream<T>, policy: ErrorPolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                upstream,
                policy,
                state: Mutex::new(State {
                    observers: Vec::new(),
                    next_id: 0,
                    generation: 0,
                    link: Link::Idle,
                    value: None,
                    version: 0,
                    terminal: None,
                }),
            }),
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.shared.policy
    }
}

impl<T: Clone + Send + 'static> Source<T> for CachedStream<T> {
    fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let mut state = self.shared.state.lock();
        // Version of the value already replayed to this observer
        let mut replayed = None;

        let id = loop {
            if let Some(terminal) = state.terminal.clone() {
                let retry = matches!(terminal, Terminal::Failed(_))
                    && self.shared.policy == ErrorPolicy::Retry;
                if !retry {
                    let value = state.value.clone().filter(|_| replayed != Some(state.version));
                    drop(state);
                    if let Some(value) = value {
                        observer.next(value);
                    }
                    terminal.notify(&observer);
                    return Subscription::empty();
                }
                state.terminal = None;
                state.value = None;
            }

            if matches!(state.link, Link::Idle) {
                let id = state.register(observer.clone());
                state.generation += 1;
                state.link = Link::Connecting;
                let generation = state.generation;
                drop(state);
                self.shared.connect(generation);
                break id;
            }

            // Late observer: the replay goes out before it can see live
            // signals, and is repeated if a newer value or a terminal signal
            // arrived meanwhile.
            match state.value.clone() {
                Some(value) if replayed != Some(state.version) => {
                    replayed = Some(state.version);
                    drop(state);
                    observer.next(value);
                    state = self.shared.state.lock();
                }
                _ => break state.register(observer.clone()),
            }
        };

        let weak = Arc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.detach(id);
            }
        })
    }

    fn is_cached(&self) -> bool {
        true
    }

    fn status(&self) -> Option<StreamStatus<T>> {
        let state = self.shared.state.lock();
        Some(match (&state.terminal, &state.link, &state.value) {
            (Some(Terminal::Completed), _, value) => StreamStatus::Completed(value.clone()),
            (Some(Terminal::Failed(err)), _, _) => StreamStatus::Failed(err.clone()),
            (None, Link::Idle, _) => StreamStatus::NotSubscribed,
            (None, _, None) => StreamStatus::Pending,
            (None, _, Some(value)) => StreamStatus::Live(value.clone()),
        })
    }
}

impl<T: Clone + Send + 'static> Shared<T> {
    fn connect(self: &Arc<Self>, generation: u64) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let upstream = self.upstream.subscribe(Observer::new(move |notification| {
            if let Some(shared) = weak.upgrade() {
                shared.on_upstream(generation, notification);
            }
        }));

        let mut state = self.state.lock();
        if state.generation == generation && matches!(state.link, Link::Connecting) {
            state.link = Link::Live(upstream);
        } else {
            // Finished or abandoned while subscribing
            drop(state);
            drop(upstream);
        }
    }

    fn on_upstream(&self, generation: u64, notification: Notification<T>) {
        let mut state = self.state.lock();
        if state.generation != generation || state.terminal.is_some() {
            return;
        }

        let terminal = match notification {
            Notification::Next(value) => {
                state.value = Some(value.clone());
                state.version += 1;
                let observers: Vec<_> = state.observers.iter().map(|(_, o)| o.clone()).collect();
                drop(state);
                for observer in observers {
                    observer.next(value.clone());
                }
                return;
            }
            Notification::Complete => Terminal::Completed,
            Notification::Error(err) => {
                if self.policy == ErrorPolicy::Retry {
                    state.value = None;
                }
                Terminal::Failed(err)
            }
        };

        state.terminal = Some(terminal.clone());
        let link = mem::replace(&mut state.link, Link::Idle);
        let observers = mem::take(&mut state.observers);
        drop(state);

        drop(link);
        for (_, observer) in observers {
            terminal.notify(&observer);
        }
    }

    fn detach(&self, id: u64) {
        let mut state = self.state.lock();
        let before = state.observers.len();
        state.observers.retain(|(other, _)| *other != id);
        let removed = state.observers.len() != before;
        if !removed || !state.observers.is_empty() || state.terminal.is_some() {
            return;
        }

        state.generation += 1;
        state.value = None;
        let link = mem::replace(&mut state.link, Link::Idle);
        drop(state);
        drop(link);
    }
}
