//! Synchronous publish/subscribe.
//!
//! [`Listeners`] delivers every published value to all current subscribers,
//! in registration order, before [`Listeners::publish`] returns.
//! Owners use [`Listeners::is_empty`] transitions to set up and tear down
//! the sources feeding them.

/// Handle returned by [`Listeners::subscribe`], pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

pub struct Listeners<T> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<T>)>,
}
impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Listeners {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}
impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    pub fn publish(&mut self, value: &T) {
        for (_, callback) in &mut self.entries {
            callback(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
