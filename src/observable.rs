use crate::dispatch::AffinityContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub type Callback<P> = Arc<dyn Fn(P) + Send + Sync + 'static>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// Recovers the data from a poisoned mutex; a panicking subscriber
// shouldn't take the whole view state down with it.
pub(crate) fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::error!("{} mutex poisoned!", what);
            poisoned.into_inner()
        }
    }
}

/// A value changed only through its owner's setters, which raise the
/// matching property via [`PropertyChanged`].
#[derive(Debug, Default)]
pub struct ObservableField<T> {
    value: Mutex<T>,
}

impl<T: Clone + PartialEq> ObservableField<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    pub fn get(&self) -> T {
        lock_or_recover(&self.value, "Observable field").clone()
    }

    // Assigns and reports whether the value actually changed
    pub(crate) fn replace_if_changed(&self, value: T) -> bool {
        let mut current = lock_or_recover(&self.value, "Observable field");
        if *current == value {
            return false;
        }
        *current = value;
        true
    }
}

/// Change notification source. Subscribers are told which property
/// changed, never the new value; they read it back from the owner.
///
/// Every notification is delivered through the affinity context, so
/// subscribers always run on the affinity thread no matter who called the
/// setter.
pub struct PropertyChanged<P> {
    context: AffinityContext,
    subscribers: Arc<Mutex<Vec<(SubscriptionId, Callback<P>)>>>,
    next_id: AtomicU64,
}

impl<P> PropertyChanged<P>
where
    P: Copy + Send + std::fmt::Debug + 'static,
{
    pub fn new(context: AffinityContext) -> Self {
        Self {
            context,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn context(&self) -> &AffinityContext {
        &self.context
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(P) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock_or_recover(&self.subscribers, "Subscriber list").push((id, Arc::new(callback)));
        log::debug!("Added subscriber {:?}", id);
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = lock_or_recover(&self.subscribers, "Subscriber list");
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        before != subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        lock_or_recover(&self.subscribers, "Subscriber list").len()
    }

    /// Assigns `value` to `field` and raises `property` if it differs from
    /// the current value. Returns whether anything changed.
    pub fn set_field<T>(&self, field: &ObservableField<T>, value: T, property: P) -> bool
    where
        T: Clone + PartialEq,
    {
        self.set_field_with(field, value, &[property])
    }

    /// Like [`set_field`](Self::set_field), but on change raises every
    /// property in `properties` in one dispatch, in order. Used for a field
    /// followed by the derived properties computed from it.
    pub fn set_field_with<T>(&self, field: &ObservableField<T>, value: T, properties: &[P]) -> bool
    where
        T: Clone + PartialEq,
    {
        if !field.replace_if_changed(value) {
            return false;
        }
        self.notify_all(properties);
        true
    }

    pub fn notify(&self, property: P) {
        self.notify_all(&[property]);
    }

    /// Raises each property in order as a single dispatch.
    pub fn notify_all(&self, properties: &[P]) {
        if properties.is_empty() {
            return;
        }
        log::trace!("Raising {:?}", properties);

        let subscribers = Arc::clone(&self.subscribers);
        let properties = properties.to_vec();
        self.context.dispatch(move || {
            // Snapshot so callbacks may subscribe/unsubscribe without deadlocking
            let callbacks: Vec<Callback<P>> = lock_or_recover(&subscribers, "Subscriber list")
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect();
            for property in properties {
                for callback in &callbacks {
                    callback(property);
                }
            }
        });
    }
}
