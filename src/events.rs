//! Book events and the listener registry.
//!
//! Listeners run synchronously, in registration order, at the moment the
//! underlying state changes.

use std::fmt;

use tracing::trace;

use crate::flip::FlippingState;
use crate::render::Orientation;

/// Notifications delivered to embedding code
#[derive(Debug, Clone, PartialEq)]
pub enum BookEvent {
    /// The current page index changed
    Flip(usize),
    /// The flip controller entered a new state
    ChangeState(FlippingState),
    /// The book switched between one- and two-page layout
    ChangeOrientation(Orientation),
    /// Pages were loaded
    Init { page: usize, mode: Orientation },
    /// Pages were replaced
    Update { page: usize, mode: Orientation },
}

impl BookEvent {
    pub fn kind(&self) -> BookEventKind {
        match self {
            BookEvent::Flip(_) => BookEventKind::Flip,
            BookEvent::ChangeState(_) => BookEventKind::ChangeState,
            BookEvent::ChangeOrientation(_) => BookEventKind::ChangeOrientation,
            BookEvent::Init { .. } => BookEventKind::Init,
            BookEvent::Update { .. } => BookEventKind::Update,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookEventKind {
    Flip,
    ChangeState,
    ChangeOrientation,
    Init,
    Update,
}

impl BookEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookEventKind::Flip => "flip",
            BookEventKind::ChangeState => "changeState",
            BookEventKind::ChangeOrientation => "changeOrientation",
            BookEventKind::Init => "init",
            BookEventKind::Update => "update",
        }
    }
}

/// Handle returned by [`EventBus::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&BookEvent)>;

struct Listener {
    id: ListenerId,
    kind: Option<BookEventKind>,
    callback: Callback,
}

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, kind: Option<BookEventKind>, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener { id, kind, callback });
        id
    }

    /// Listen for one kind of event
    pub fn on(&mut self, kind: BookEventKind, callback: impl FnMut(&BookEvent) + 'static) -> ListenerId {
        self.register(Some(kind), Box::new(callback))
    }

    /// Listen for every event
    pub fn on_any(&mut self, callback: impl FnMut(&BookEvent) + 'static) -> ListenerId {
        self.register(None, Box::new(callback))
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Remove every listener for `kind`
    pub fn off_kind(&mut self, kind: BookEventKind) {
        self.listeners.retain(|l| l.kind != Some(kind));
    }

    pub fn emit(&mut self, event: &BookEvent) {
        trace!("Event {}", event.kind().as_str());
        let kind = event.kind();
        for listener in &mut self.listeners {
            if listener.kind.map_or(true, |k| k == kind) {
                (listener.callback)(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_filter_by_kind() {
        let mut bus = EventBus::new();
        let flips = Rc::new(RefCell::new(Vec::new()));
        let all = Rc::new(RefCell::new(0));

        let sink = flips.clone();
        bus.on(BookEventKind::Flip, move |e| sink.borrow_mut().push(e.clone()));
        let counter = all.clone();
        bus.on_any(move |_| *counter.borrow_mut() += 1);

        bus.emit(&BookEvent::ChangeState(FlippingState::Flipping));
        bus.emit(&BookEvent::Flip(3));

        assert_eq!(*flips.borrow(), vec![BookEvent::Flip(3)]);
        assert_eq!(*all.borrow(), 2);
    }

    #[test]
    fn test_off_removes_listener() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        let id = bus.on(BookEventKind::Flip, move |_| *counter.borrow_mut() += 1);

        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.emit(&BookEvent::Flip(1));
        assert_eq!(*hits.borrow(), 0);
        assert!(bus.is_empty());
    }
}
