// THEORY:
// Views announce what they do through a small synchronous pub/sub registry.
// Subscribers register per event kind and are called in subscription order. The
// list for a kind is snapshotted before dispatch, so a publish always reaches
// exactly the subscribers that were registered when it started.
//
// Move events carry everything a listener needs (local cursor, absolute position,
// the sample read at the new position), so listeners never need to reach back into
// the view that published them.

use crate::core_modules::sample::PixelSample;
use std::fmt;
use std::rc::Rc;

/// Correlates the start and end events of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanId(pub u32);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Move,
    ScanStart,
    ScanEnd,
    StateEnter,
    StateExit,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Move,
        EventKind::ScanStart,
        EventKind::ScanEnd,
        EventKind::StateEnter,
        EventKind::StateExit,
    ];

    fn slot(self) -> usize {
        match self {
            EventKind::Move => 0,
            EventKind::ScanStart => 1,
            EventKind::ScanEnd => 2,
            EventKind::StateEnter => 3,
            EventKind::StateExit => 4,
        }
    }
}

/// Where a move landed, in the view's own and in root coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MovePosition {
    pub x: i32,
    pub y: i32,
    pub abs_x: i32,
    pub abs_y: i32,
    /// Linear index into the root buffer: `abs_y * root_width + abs_x`.
    pub abs_index: usize,
    pub sample: Option<PixelSample>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Move(MovePosition),
    ScanStart(ScanId),
    ScanEnd(ScanId),
    StateEnter(String),
    StateExit(String),
}

impl ViewEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ViewEvent::Move(_) => EventKind::Move,
            ViewEvent::ScanStart(_) => EventKind::ScanStart,
            ViewEvent::ScanEnd(_) => EventKind::ScanEnd,
            ViewEvent::StateEnter(_) => EventKind::StateEnter,
            ViewEvent::StateExit(_) => EventKind::StateExit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Handler = Rc<dyn Fn(&ViewEvent)>;

/// Per-kind subscriber lists.
#[derive(Default)]
pub struct Subscribers {
    lists: [Vec<(SubscriptionId, Handler)>; 5],
    next_id: u64,
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("counts", &self.lists.iter().map(Vec::len).collect::<Vec<_>>())
            .finish()
    }
}

impl Subscribers {
    pub fn subscribe(&mut self, kinds: &[EventKind], handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        for kind in kinds {
            self.lists[kind.slot()].push((id, Rc::clone(&handler)));
        }
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId, kinds: &[EventKind]) {
        for kind in kinds {
            self.lists[kind.slot()].retain(|(sub, _)| *sub != id);
        }
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.lists[kind.slot()].len()
    }

    /// Copies the handler list for a kind, for dispatch outside any borrow.
    pub fn snapshot(&self, kind: EventKind) -> Vec<Handler> {
        self.lists[kind.slot()]
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect()
    }
}
