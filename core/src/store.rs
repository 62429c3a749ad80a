//! The per-instance reactive state container.
//!
//! [`Store`] is a mutable value box with a subscription list. Every write
//! replaces the value and synchronously notifies the listeners that were
//! subscribed when the write happened, in subscription order. There is no
//! batching and no deduplication across writes. This is the smallest
//! container that can drive a re-render: components that want derived
//! values compute them in their template.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type ListenerFn<T> = Rc<dyn Fn(&T)>;

struct Registered<T> {
    id: u64,
    listener: ListenerFn<T>,
}

struct Shared<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<Registered<T>>>,
    next_id: Cell<u64>,
}

/// A mutable value box whose writes synchronously notify subscribers.
pub struct Store<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("listeners", &self.shared.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Store<T> {
    /// Creates a store holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            shared: Rc::new(Shared {
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Returns a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// Reads the current value without cloning it.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.shared.value.borrow())
    }

    /// Replaces the value and synchronously notifies every subscriber.
    pub fn set(&self, value: T) {
        *self.shared.value.borrow_mut() = value;
        self.notify();
    }

    /// Replaces the value with `update(previous)` and synchronously notifies
    /// every subscriber.
    pub fn update(&self, update: impl FnOnce(&T) -> T) {
        let next = {
            let current = self.shared.value.borrow();
            update(&current)
        };
        self.set(next);
    }

    /// Registers `listener` to run after every write.
    ///
    /// Listeners registered while a notification is in flight are not
    /// invoked for that notification: the subscriber list is snapshotted at
    /// notify time.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription<T> {
        let id = self.shared.next_id.get();
        self.shared.next_id.set(id + 1);
        self.shared.listeners.borrow_mut().push(Registered {
            id,
            listener: Rc::new(listener),
        });
        Subscription {
            id,
            shared: Rc::downgrade(&self.shared),
        }
    }

    fn notify(&self) {
        let value = self.get();
        let snapshot: Vec<ListenerFn<T>> = self
            .shared
            .listeners
            .borrow()
            .iter()
            .map(|registered| Rc::clone(&registered.listener))
            .collect();
        for listener in snapshot {
            listener(&value);
        }
    }
}

/// Handle for removing a listener registered with [`Store::subscribe`].
pub struct Subscription<T> {
    id: u64,
    shared: Weak<Shared<T>>,
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<T> Subscription<T> {
    /// Removes the listener from the store. Calling this more than once, or
    /// after the store is gone, is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared
                .listeners
                .borrow_mut()
                .retain(|registered| registered.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_notify_in_order_once_per_write() {
        let store = Store::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let _subscription = store.subscribe(move |value| log.borrow_mut().push(*value));

        for _ in 0..3 {
            store.update(|value| value + 1);
        }

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
        assert_eq!(store.get(), 3);
    }

    #[test]
    fn listeners_notify_in_subscription_order() {
        let store = Store::new(());
        let order = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&order);
        let second = Rc::clone(&order);
        let _a = store.subscribe(move |()| first.borrow_mut().push("first"));
        let _b = store.subscribe(move |()| second.borrow_mut().push("second"));

        store.set(());

        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let store = Store::new(0);
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let subscription = store.subscribe(move |_| counter.set(counter.get() + 1));

        store.set(1);
        subscription.unsubscribe();
        subscription.unsubscribe();
        store.set(2);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn listener_added_during_notification_misses_that_notification() {
        let store = Store::new(0);
        let late_calls = Rc::new(Cell::new(0));
        let outer_store = store.clone();
        let late = Rc::clone(&late_calls);
        let _subscription = store.subscribe(move |_| {
            let counter = Rc::clone(&late);
            // Keep the registration alive past this notification.
            std::mem::forget(outer_store.subscribe(move |_| counter.set(counter.get() + 1)));
        });

        store.set(1);
        assert_eq!(late_calls.get(), 0);

        store.set(2);
        assert!(late_calls.get() >= 1);
    }
}
