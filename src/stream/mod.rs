//! Push-based value streams.
//!
//! A [`ValueStream`] is a handle to a producer of zero or more values
//! followed by at most one terminal signal (complete or error). Nothing runs
//! until someone subscribes; dropping the returned [`Subscription`] detaches
//! the observer and tears the producer down.
//!
//! ```text
//!  producer ──Next/Error/Complete──▶ Observer ──▶ consumer callback
//!      ▲                                              │
//!      └──────────── Subscription (drop) ◀────────────┘
//! ```
//!
//! Streams are usually stored in a dataset wrapped in a [`CachedStream`] so
//! that an expensive producer runs once no matter how many consumers attach.

mod cached;
mod publisher;

pub use cached::{CachedStream, ErrorPolicy, StreamStatus};
pub use publisher::Publisher;

use crate::error::StreamError;
use parking_lot::Mutex;
use std::{fmt, future::Future, sync::Arc};
use tokio::{runtime::Handle, sync::oneshot};

// ============================================================================
// Notifications & Observers
// ============================================================================

/// A single signal delivered to an observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<T> {
    Next(T),
    Error(StreamError),
    Complete,
}

/// Callback receiving the signals of one subscription.
pub struct Observer<T> {
    callback: Arc<dyn Fn(Notification<T>) + Send + Sync>,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> Observer<T> {
    pub fn new(callback: impl Fn(Notification<T>) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    #[inline]
    pub fn notify(&self, notification: Notification<T>) {
        (self.callback)(notification)
    }

    pub fn next(&self, value: T) {
        self.notify(Notification::Next(value))
    }

    pub fn error(&self, err: StreamError) {
        self.notify(Notification::Error(err))
    }

    pub fn complete(&self) {
        self.notify(Notification::Complete)
    }
}

/// Handle to an attached observer. Dropping it runs the teardown.
#[must_use = "dropping a subscription immediately detaches the observer"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to tear down.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Detach now. Same as dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

// ============================================================================
// Sources
// ============================================================================

/// A producer that can be subscribed to.
pub trait Source<T>: Send + Sync {
    fn subscribe(&self, observer: Observer<T>) -> Subscription;

    /// Whether this source already shares one upstream run between observers.
    fn is_cached(&self) -> bool {
        false
    }

    /// State of the shared upstream run, for cached sources.
    fn status(&self) -> Option<StreamStatus<T>> {
        None
    }
}

/// Source backed by a subscribe closure.
struct FnSource<F>(F);

impl<T, F> Source<T> for FnSource<F>
where
    F: Fn(Observer<T>) -> Subscription + Send + Sync,
{
    fn subscribe(&self, observer: Observer<T>) -> Subscription {
        (self.0)(observer)
    }
}

// ============================================================================
// ValueStream
// ============================================================================

/// Cloneable handle to a value producer.
pub struct ValueStream<T> {
    source: Arc<dyn Source<T>>,
}

impl<T> Clone for ValueStream<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T> fmt::Debug for ValueStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStream")
            .field("cached", &self.source.is_cached())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> ValueStream<T> {
    /// Stream whose subscribe behaviour is the given closure.
    ///
    /// The closure runs once per subscription and returns the teardown handle.
    pub fn new(subscribe: impl Fn(Observer<T>) -> Subscription + Send + Sync + 'static) -> Self {
        Self::from_source(FnSource(subscribe))
    }

    pub fn from_source(source: impl Source<T> + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Stream that errors immediately on every subscription.
    pub fn failed(err: StreamError) -> Self {
        Self::new(move |observer| {
            observer.error(err.clone());
            Subscription::empty()
        })
    }

    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        self.source.subscribe(observer)
    }

    /// Subscribe with a plain closure.
    pub fn observe(
        &self,
        callback: impl Fn(Notification<T>) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe(Observer::new(callback))
    }

    pub fn is_cached(&self) -> bool {
        self.source.is_cached()
    }

    /// Upstream state when this stream is cached, `None` otherwise.
    pub fn status(&self) -> Option<StreamStatus<T>> {
        self.source.status()
    }

    /// Whether both handles point at the same producer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

impl<T: Clone + Send + Sync + 'static> ValueStream<T> {
    /// Emit `value` then complete.
    pub fn just(value: T) -> Self {
        Self::new(move |observer| {
            observer.next(value.clone());
            observer.complete();
            Subscription::empty()
        })
    }

    /// Run `produce` on each subscription, emitting its result then completing.
    pub fn lazy(produce: impl Fn() -> Result<T, StreamError> + Send + Sync + 'static) -> Self {
        Self::new(move |observer| {
            match produce() {
                Ok(value) => {
                    observer.next(value);
                    observer.complete();
                }
                Err(err) => observer.error(err),
            }
            Subscription::empty()
        })
    }

    /// Run an async producer on `handle` for each subscription.
    ///
    /// Detaching before the future resolves aborts the spawned task.
    pub fn spawn<F, Fut>(handle: Handle, produce: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, StreamError>> + Send + 'static,
    {
        Self::new(move |observer| {
            let pending = produce();
            let task = handle.spawn(async move {
                match pending.await {
                    Ok(value) => {
                        observer.next(value);
                        observer.complete();
                    }
                    Err(err) => observer.error(err),
                }
            });
            Subscription::new(move || task.abort())
        })
    }

    pub fn map<U, F>(&self, f: F) -> ValueStream<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_map(move |value| Ok(f(value)))
    }

    /// Map values, turning the first `Err` into the error signal.
    ///
    /// Upstream signals after a mapping failure are dropped.
    pub fn try_map<U, F>(&self, f: F) -> ValueStream<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> Result<U, StreamError> + Send + Sync + 'static,
    {
        let upstream = self.clone();
        let f = Arc::new(f);
        ValueStream::new(move |observer: Observer<U>| {
            let f = Arc::clone(&f);
            let failed = Arc::new(Mutex::new(false));
            upstream.observe(move |notification| {
                if *failed.lock() {
                    return;
                }
                match notification {
                    Notification::Next(value) => match f(value) {
                        Ok(mapped) => observer.next(mapped),
                        Err(err) => {
                            *failed.lock() = true;
                            observer.error(err);
                        }
                    },
                    Notification::Error(err) => observer.error(err),
                    Notification::Complete => observer.complete(),
                }
            })
        })
    }

    /// Wrap in a [`CachedStream`] with the default error policy.
    ///
    /// An already cached stream is returned unchanged.
    pub fn cached(self) -> Self {
        self.cached_with(ErrorPolicy::default())
    }

    pub fn cached_with(self, policy: ErrorPolicy) -> Self {
        if self.is_cached() {
            return self;
        }
        Self::from_source(CachedStream::new(self, policy))
    }

    /// Synchronous peek: the last value or error delivered while subscribing.
    ///
    /// Returns `None` when the producer emits nothing synchronously.
    pub fn current(&self) -> Option<Result<T, StreamError>> {
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        let subscription = self.observe(move |notification| match notification {
            Notification::Next(value) => *sink.lock() = Some(Ok(value)),
            Notification::Error(err) => *sink.lock() = Some(Err(err)),
            Notification::Complete => {}
        });
        drop(subscription);
        slot.lock().take()
    }

    /// Wait for the first value.
    pub async fn first(&self) -> Result<T, StreamError> {
        let (tx, rx) = oneshot::channel();
        let tx = Mutex::new(Some(tx));
        let _subscription = self.observe(move |notification| {
            let result = match notification {
                Notification::Next(value) => Ok(value),
                Notification::Error(err) => Err(err),
                Notification::Complete => Err(StreamError::msg("stream completed without a value")),
            };
            if let Some(tx) = tx.lock().take() {
                tx.send(result).ok();
            }
        });
        rx.await
            .unwrap_or_else(|_| Err(StreamError::msg("stream dropped before emitting a value")))
    }
}

// ============================================================================
// Tests
// ============================================================================
