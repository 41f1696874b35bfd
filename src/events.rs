// src/events.rs

//! Observer registry for window lifecycle events.
//!
//! The dispatcher keeps one ordered listener list per event kind.
//! Listeners fire in subscription order, and emission iterates over a
//! snapshot of the list, so a callback may subscribe or unsubscribe
//! (itself included) without invalidating the pass that invoked it: a
//! listener added during emission is first called on the next emission,
//! and one removed during emission that has not fired yet still fires.

use crate::geometry::{Position, Size};
use crate::window::Window;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Callback for events that carry no payload (show, hide, focus).
pub type WindowCallback = Rc<dyn Fn(&Window)>;
/// Callback invoked with the new client-area size.
pub type SizeCallback = Rc<dyn Fn(&Window, Size)>;
/// Callback invoked with the new top-left position.
pub type PositionCallback = Rc<dyn Fn(&Window, Position)>;

/// The kinds of event a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Show,
    Hide,
    Resize,
    Move,
    Focus,
    LostFocus,
}

/// Handle returned by the `subscribe_*` methods; pass it back to
/// [`EventDispatcher::unsubscribe`] to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

struct Listeners<C> {
    entries: RefCell<Vec<(u64, C)>>,
}

impl<C: Clone> Listeners<C> {
    fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    fn add(&self, id: u64, callback: C) {
        self.entries.borrow_mut().push((id, callback));
    }

    fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    // Snapshot so callbacks can mutate the list mid-emission.
    fn snapshot(&self) -> Vec<(u64, C)> {
        self.entries.borrow().clone()
    }
}

/// Per-window listener registry.
///
/// Interior mutability throughout: subscribing only needs `&self`, which
/// lets callbacks (which receive `&Window`) manage subscriptions while an
/// event is being delivered.
pub struct EventDispatcher {
    next_id: Cell<u64>,
    show: Listeners<WindowCallback>,
    hide: Listeners<WindowCallback>,
    resize: Listeners<SizeCallback>,
    moved: Listeners<PositionCallback>,
    focus: Listeners<WindowCallback>,
    lost_focus: Listeners<WindowCallback>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            show: Listeners::new(),
            hide: Listeners::new(),
            resize: Listeners::new(),
            moved: Listeners::new(),
            focus: Listeners::new(),
            lost_focus: Listeners::new(),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    pub fn subscribe_show(&self, callback: impl Fn(&Window) + 'static) -> Subscription {
        let id = self.next_id();
        self.show.add(id, Rc::new(callback));
        Subscription {
            kind: EventKind::Show,
            id,
        }
    }

    pub fn subscribe_hide(&self, callback: impl Fn(&Window) + 'static) -> Subscription {
        let id = self.next_id();
        self.hide.add(id, Rc::new(callback));
        Subscription {
            kind: EventKind::Hide,
            id,
        }
    }

    pub fn subscribe_resize(&self, callback: impl Fn(&Window, Size) + 'static) -> Subscription {
        let id = self.next_id();
        self.resize.add(id, Rc::new(callback));
        Subscription {
            kind: EventKind::Resize,
            id,
        }
    }

    pub fn subscribe_move(
        &self,
        callback: impl Fn(&Window, Position) + 'static,
    ) -> Subscription {
        let id = self.next_id();
        self.moved.add(id, Rc::new(callback));
        Subscription {
            kind: EventKind::Move,
            id,
        }
    }

    pub fn subscribe_focus(&self, callback: impl Fn(&Window) + 'static) -> Subscription {
        let id = self.next_id();
        self.focus.add(id, Rc::new(callback));
        Subscription {
            kind: EventKind::Focus,
            id,
        }
    }

    pub fn subscribe_lost_focus(&self, callback: impl Fn(&Window) + 'static) -> Subscription {
        let id = self.next_id();
        self.lost_focus.add(id, Rc::new(callback));
        Subscription {
            kind: EventKind::LostFocus,
            id,
        }
    }

    /// Removes the listener behind `subscription`. Returns `false` if it
    /// was already removed; unsubscribing twice is harmless.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        match subscription.kind {
            EventKind::Show => self.show.remove(subscription.id),
            EventKind::Hide => self.hide.remove(subscription.id),
            EventKind::Resize => self.resize.remove(subscription.id),
            EventKind::Move => self.moved.remove(subscription.id),
            EventKind::Focus => self.focus.remove(subscription.id),
            EventKind::LostFocus => self.lost_focus.remove(subscription.id),
        }
    }

    pub(crate) fn emit_show(&self, window: &Window) {
        for (_, callback) in self.show.snapshot() {
            callback(window);
        }
    }

    pub(crate) fn emit_hide(&self, window: &Window) {
        for (_, callback) in self.hide.snapshot() {
            callback(window);
        }
    }

    pub(crate) fn emit_resize(&self, window: &Window, size: Size) {
        for (_, callback) in self.resize.snapshot() {
            callback(window, size);
        }
    }

    pub(crate) fn emit_move(&self, window: &Window, position: Position) {
        for (_, callback) in self.moved.snapshot() {
            callback(window, position);
        }
    }

    pub(crate) fn emit_focus(&self, window: &Window) {
        for (_, callback) in self.focus.snapshot() {
            callback(window);
        }
    }

    pub(crate) fn emit_lost_focus(&self, window: &Window) {
        for (_, callback) in self.lost_focus.snapshot() {
            callback(window);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
