//! Named-event listener registry.
//!
//! `Eventer<E>` keeps listeners keyed by event name. Registration and removal
//! take `&self` so that a listener holding a handle to the emitter (through an
//! `Rc`) can unsubscribe itself, or others, while an emit is in flight.
//!
//! Emit works on a snapshot of the listeners registered when it started:
//! - a listener added during an emit first runs on the next emit;
//! - a listener removed during an emit is skipped if it has not run yet;
//! - a `once` listener is unregistered before it is invoked.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

pub type ListenerId = u64;

type Callback<E> = Rc<RefCell<Box<dyn FnMut(&E)>>>;

struct Listener<E> {
    id: ListenerId,
    name: String,
    once: bool,
    callback: Callback<E>,
}

pub struct Eventer<E> {
    listeners: RefCell<Vec<Listener<E>>>,
    next_id: Cell<ListenerId>,
}

impl<E> Default for Eventer<E> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }
}

impl<E> fmt::Debug for Eventer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .listeners
            .borrow()
            .iter()
            .map(|l| l.name.clone())
            .collect();
        f.debug_struct("Eventer").field("listeners", &names).finish()
    }
}

impl<E> Eventer<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, name: &str, once: bool, callback: Box<dyn FnMut(&E)>) -> ListenerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            name: name.to_string(),
            once,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    pub fn on(&self, name: &str, callback: impl FnMut(&E) + 'static) -> ListenerId {
        self.register(name, false, Box::new(callback))
    }

    /// Listener that unregisters itself before its first invocation.
    pub fn once(&self, name: &str, callback: impl FnMut(&E) + 'static) -> ListenerId {
        self.register(name, true, Box::new(callback))
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Remove every listener for `name`; returns how many were removed.
    pub fn off_all(&self, name: &str) -> usize {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.name != name);
        before - listeners.len()
    }

    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    pub fn has(&self, name: &str) -> bool {
        self.listeners.borrow().iter().any(|l| l.name == name)
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.name == name)
            .count()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|l| l.id == id)
    }

    /// Synchronously invoke the listeners for `name`. Returns how many ran.
    pub fn emit(&self, name: &str, event: &E) -> usize {
        let snapshot: Vec<(ListenerId, bool, Callback<E>)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.name == name)
            .map(|l| (l.id, l.once, Rc::clone(&l.callback)))
            .collect();

        let mut called = 0;
        for (id, once, callback) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            if once {
                self.off(id);
            }
            match callback.try_borrow_mut() {
                Ok(mut f) => {
                    f(event);
                    called += 1;
                }
                Err(_) => {
                    tracing::warn!(event = name, listener = id, "listener re-entered; skipped");
                }
            }
        }
        called
    }
}
