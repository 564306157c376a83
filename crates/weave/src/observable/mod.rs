//! Listener lists with registration handles.
//!
//! Listeners are plain closures called synchronously, in subscription order,
//! on the thread that made the change. A [`Registration`] is the only way to
//! remove a listener again.

use std::fmt;

/// Handle returned by [`Listeners::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping a registration leaves no way to remove the listener"]
pub struct Registration(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

/// An ordered list of event listeners.
pub struct Listeners<E> {
    next: u64,
    entries: Vec<(Registration, Listener<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, listener: F) -> Registration
    where
        F: FnMut(&E) + 'static,
    {
        let registration = Registration(self.next);
        self.next += 1;
        self.entries.push((registration, Box::new(listener)));
        registration
    }

    /// Remove a listener; returns `false` if it was already removed.
    pub fn remove(&mut self, registration: Registration) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(r, _)| *r != registration);
        self.entries.len() != before
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn fire(&mut self, event: &E) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }
}
