//! Named-channel publish/subscribe hub.
//!
//! Listeners are compared by reference: registering the same `Rc` twice under
//! one channel keeps a single entry. `emit` is synchronous and applies no error
//! isolation, so the first failing listener aborts the emit and its error is
//! returned to the caller. Listeners registered after it do not run.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Callback registered on a channel
pub type Listener<T> = Rc<dyn Fn(&T) -> anyhow::Result<()>>;

pub struct EventDispatcher<T> {
    listeners: RefCell<HashMap<String, Vec<Listener<T>>>>,
    destroyed: Cell<bool>,
}

impl<T> Default for EventDispatcher<T> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(HashMap::new()),
            destroyed: Cell::new(false),
        }
    }
}

fn same_listener<T>(a: &Listener<T>, b: &Listener<T>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl<T> EventDispatcher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, channel: &str, listener: Listener<T>) {
        if self.destroyed.get() {
            log::debug!("ignoring listener for `{channel}` on a destroyed dispatcher");
            return;
        }
        let mut listeners = self.listeners.borrow_mut();
        let entries = listeners.entry(channel.to_string()).or_default();
        if !entries.iter().any(|existing| same_listener(existing, &listener)) {
            entries.push(listener);
        }
    }

    pub fn off(&self, channel: &str, listener: &Listener<T>) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(entries) = listeners.get_mut(channel) {
            entries.retain(|existing| !same_listener(existing, listener));
            if entries.is_empty() {
                listeners.remove(channel);
            }
        }
    }

    /// Invoke every listener of `channel` in registration order.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe or
    /// unsubscribe while the emit is running.
    pub fn emit(&self, channel: &str, payload: &T) -> anyhow::Result<()> {
        if self.destroyed.get() {
            return Ok(());
        }
        let snapshot: Vec<Listener<T>> = match self.listeners.borrow().get(channel) {
            Some(entries) => entries.clone(),
            None => return Ok(()),
        };
        for listener in snapshot {
            listener(payload)?;
        }
        Ok(())
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners.borrow().get(channel).map_or(0, Vec::len)
    }

    pub fn destroy(&self) {
        self.destroyed.set(true);
        self.listeners.borrow_mut().clear();
    }
}
