//! Replay-current multicast cell.
//!
//! A [`Publisher`] always holds a value. Subscribers get the current value
//! right away and every later update. The registry keeps its set of known
//! URLs in one.

use super::{Observer, Subscription, ValueStream};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

struct Inner<T> {
    value: T,
    observers: Vec<(u64, Observer<T>)>,
    next_id: u64,
}

/// Shared, observable value.
///
/// # Thread Safety
///
/// Observers are notified after the lock is released, so a callback may read
/// or update the publisher again.
pub struct Publisher<T> {
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Publisher<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                value,
                observers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn get(&self) -> T {
        self.inner.lock().value.clone()
    }

    /// Replace the value and notify every observer.
    pub fn publish(&self, value: T) {
        let observers = {
            let mut inner = self.inner.lock();
            inner.value = value.clone();
            snapshot(&inner.observers)
        };
        for observer in observers {
            observer.next(value.clone());
        }
    }

    /// Edit a copy of the value; publish it only when `edit` returns `true`.
    pub fn update(&self, edit: impl FnOnce(&mut T) -> bool) -> bool {
        let (value, observers) = {
            let mut inner = self.inner.lock();
            let mut value = inner.value.clone();
            if !edit(&mut value) {
                return false;
            }
            inner.value = value.clone();
            (value, snapshot(&inner.observers))
        };
        for observer in observers {
            observer.next(value.clone());
        }
        true
    }

    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    /// Stream of the current value followed by every update. Never completes.
    pub fn stream(&self) -> ValueStream<T> {
        let weak = Arc::downgrade(&self.inner);
        ValueStream::new(move |observer| attach(&weak, observer))
    }
}

fn snapshot<T>(observers: &[(u64, Observer<T>)]) -> Vec<Observer<T>> {
    observers.iter().map(|(_, o)| o.clone()).collect()
}

fn attach<T: Clone + Send + Sync + 'static>(
    weak: &Weak<Mutex<Inner<T>>>,
    observer: Observer<T>,
) -> Subscription {
    let Some(inner) = weak.upgrade() else {
        return Subscription::empty();
    };
    let (id, current) = {
        let mut guard = inner.lock();
        let id = guard.next_id;
        guard.next_id += 1;
        guard.observers.push((id, observer.clone()));
        (id, guard.value.clone())
    };
    observer.next(current);

    let weak = Weak::clone(weak);
    Subscription::new(move || {
        if let Some(inner) = weak.upgrade() {
            inner.lock().observers.retain(|(other, _)| *other != id);
        }
    })
}
