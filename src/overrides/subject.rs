//! # Replay-One Subject
//!
//! Holds a current value and a list of subscriber callbacks. A new
//! subscriber receives the current value immediately, then every value
//! published afterwards, synchronously on the publishing thread.
//!
//! Callbacks run with no internal lock held, so a callback may publish or
//! subscribe again. When a nested publish happens during delivery, the
//! outer delivery stops: every subscriber has already seen the newer
//! value and must not receive the older one after it.

use std::sync::{Arc, RwLock, Weak};

use uuid::Uuid;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SubjectState<T> {
    current: T,
    version: u64,
    subscribers: Vec<(Uuid, Callback<T>)>,
}

impl<T> SubjectState<T> {
    fn contains(&self, id: &Uuid) -> bool {
        self.subscribers.iter().any(|(sub_id, _)| sub_id == id)
    }

    fn remove(&mut self, id: &Uuid) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| sub_id != id);
        self.subscribers.len() != before
    }
}

/// Publisher with replay-one semantics
pub struct Subject<T> {
    state: Arc<RwLock<SubjectState<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> std::fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (version, subscribers) = self
            .state
            .read()
            .map(|s| (s.version, s.subscribers.len()))
            .unwrap_or((0, 0));
        f.debug_struct("Subject")
            .field("version", &version)
            .field("subscribers", &subscribers)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
    /// Create a subject holding `initial`
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(SubjectState {
                current: initial,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Latest published value
    pub fn current(&self) -> Option<T> {
        self.state.read().ok().map(|s| s.current.clone())
    }

    /// Number of publishes so far
    pub fn version(&self) -> u64 {
        self.state.read().map(|s| s.version).unwrap_or(0)
    }

    /// Replace the current value and notify every subscriber
    pub fn publish(&self, value: T) {
        let (version, subscribers) = {
            let Ok(mut state) = self.state.write() else {
                return;
            };
            state.current = value.clone();
            state.version += 1;
            (state.version, state.subscribers.clone())
        };

        for (id, callback) in subscribers {
            let still_current = self
                .state
                .read()
                .map(|s| s.version == version && s.contains(&id))
                .unwrap_or(false);
            if !still_current {
                // Either unsubscribed mid-delivery or superseded by a
                // nested publish; skip this subscriber.
                if self.version() != version {
                    return;
                }
                continue;
            }
            callback(&value);
        }
    }

    /// Subscribe; `callback` is invoked with the current value before
    /// this returns.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let callback: Callback<T> = Arc::new(callback);

        let current = match self.state.write() {
            Ok(mut state) => {
                state.subscribers.push((id, Arc::clone(&callback)));
                Some(state.current.clone())
            }
            Err(_) => None,
        };

        if let Some(current) = current {
            callback(&current);
        }

        let weak: Weak<RwLock<SubjectState<T>>> = Arc::downgrade(&self.state);
        Subscription {
            id,
            detach: Some(Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    if let Ok(mut state) = state.write() {
                        state.remove(&id);
                    }
                }
            })),
        }
    }

    /// Active subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.state.read().map(|s| s.subscribers.len()).unwrap_or(0)
    }
}

/// Handle to an active subscription.
///
/// Dropping the handle unsubscribes. Call [`Subscription::detach_forever`]
/// to keep the callback registered for the lifetime of the subject.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: Uuid,
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Subscription id
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop receiving notifications
    pub fn unsubscribe(mut self) {
        self.run_detach();
    }

    /// Keep the callback attached until the subject itself is dropped
    pub fn detach_forever(mut self) {
        self.detach = None;
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.detach.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}
