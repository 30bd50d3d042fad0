//! Line events, buffered during a tick and delivered at its end.
//!
//! The pipeline emits events while a tick runs; [`EventBus::deliver`] hands
//! them to listeners in one batch, oldest first, so listeners see them in
//! the order they happened.
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`]. Suppressed events
//! are never buffered or delivered.

use crate::sim::Ticks;
use std::fmt;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    TickStarted {
        tick: Ticks,
    },
    OrderAdmitted {
        customer: String,
        product: String,
        stage: String,
        tick: Ticks,
    },
    ItemFilled {
        customer: String,
        product: String,
        item: String,
        serial: u64,
        tick: Ticks,
    },
    ItemOutOfStock {
        customer: String,
        product: String,
        item: String,
        tick: Ticks,
    },
    OrderMoved {
        customer: String,
        product: String,
        from: String,
        to: String,
        tick: Ticks,
    },
    OrderCompleted {
        customer: String,
        product: String,
        tick: Ticks,
    },
    OrderIncomplete {
        customer: String,
        product: String,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TickStarted,
    OrderAdmitted,
    ItemFilled,
    ItemOutOfStock,
    OrderMoved,
    OrderCompleted,
    OrderIncomplete,
}

const EVENT_KIND_COUNT: usize = 7;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TickStarted { .. } => EventKind::TickStarted,
            Event::OrderAdmitted { .. } => EventKind::OrderAdmitted,
            Event::ItemFilled { .. } => EventKind::ItemFilled,
            Event::ItemOutOfStock { .. } => EventKind::ItemOutOfStock,
            Event::OrderMoved { .. } => EventKind::OrderMoved,
            Event::OrderCompleted { .. } => EventKind::OrderCompleted,
            Event::OrderIncomplete { .. } => EventKind::OrderIncomplete,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            Event::TickStarted { tick }
            | Event::OrderAdmitted { tick, .. }
            | Event::ItemFilled { tick, .. }
            | Event::ItemOutOfStock { tick, .. }
            | Event::OrderMoved { tick, .. }
            | Event::OrderCompleted { tick, .. }
            | Event::OrderIncomplete { tick, .. } => *tick,
        }
    }
}

impl EventKind {
    /// The kinds that make up the per-tick fill trace.
    pub const TRACE: [EventKind; 3] = [
        EventKind::TickStarted,
        EventKind::ItemFilled,
        EventKind::ItemOutOfStock,
    ];

    pub const ALL: [EventKind; EVENT_KIND_COUNT] = [
        EventKind::TickStarted,
        EventKind::OrderAdmitted,
        EventKind::ItemFilled,
        EventKind::ItemOutOfStock,
        EventKind::OrderMoved,
        EventKind::OrderCompleted,
        EventKind::OrderIncomplete,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::TickStarted { tick } => write!(f, "Line Manager Iteration: {tick}"),
            Event::OrderAdmitted {
                customer,
                product,
                stage,
                ..
            } => write!(f, "    Admitted {customer}, {product} at {stage}"),
            Event::ItemFilled {
                customer,
                product,
                item,
                ..
            } => write!(f, "    Filled {customer}, {product} [{item}]"),
            Event::ItemOutOfStock {
                customer,
                product,
                item,
                ..
            } => write!(f, "    Unable to fill {customer}, {product} [{item}]"),
            Event::OrderMoved {
                customer,
                product,
                from,
                to,
                ..
            } => write!(f, "    Moved {customer}, {product} from {from} to {to}"),
            Event::OrderCompleted {
                customer, product, ..
            } => write!(f, "    Completed {customer}, {product}"),
            Event::OrderIncomplete {
                customer, product, ..
            } => write!(f, "    Incomplete {customer}, {product}"),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Fixed-size ring holding the events of the current tick. When it is full
/// the oldest event is overwritten.
#[derive(Debug)]
pub struct EventBuffer {
    slots: Vec<Option<Event>>,
    /// Slot the next push writes to.
    head: usize,
    len: usize,
}

impl EventBuffer {
    /// Ring with room for `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity.max(1)).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    /// Append `event`, overwriting the oldest one when the ring is full.
    pub fn push(&mut self, event: Event) {
        let capacity = self.capacity();
        self.slots[self.head] = Some(event);
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Number of slots in the ring.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Events currently held.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been pushed since the last clear.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Held events, oldest first.
    pub fn iter(&self) -> EventBufferIter<'_> {
        // Until the ring wraps, the oldest event sits in slot 0; after that
        // it is the slot about to be overwritten.
        let start = if self.len < self.capacity() { 0 } else { self.head };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    /// Forget every held event.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

/// Oldest-first iterator returned by [`EventBuffer::iter`].
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.slots[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Read-only observer of one event kind.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// Per-tick event queue. The pipeline emits into it during a tick and
/// delivers at the end; listeners for a kind run in registration order.
pub struct EventBus {
    buffer: EventBuffer,
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<PassiveListener>; EVENT_KIND_COUNT],
    emitted: [u64; EVENT_KIND_COUNT],
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: Vec<usize> = self.listeners.iter().map(Vec::len).collect();
        f.debug_struct("EventBus")
            .field("buffer", &self.buffer)
            .field("suppressed", &self.suppressed)
            .field("listeners", &listeners)
            .field("emitted", &self.emitted)
            .finish()
    }
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: EventBuffer::new(capacity),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            emitted: [0; EVENT_KIND_COUNT],
        }
    }

    /// Stop buffering `kind`. Events of that kind already buffered are
    /// skipped at delivery.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
    }

    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    /// Buffer an event for the next delivery. No-op if its kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        self.emitted[idx] += 1;
        self.buffer.push(event);
    }

    /// Subscribe `listener` to `kind`.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Hand every buffered event to its listeners, oldest first, then empty
    /// the buffer.
    pub fn deliver(&mut self) {
        let Self {
            buffer,
            suppressed,
            listeners,
            ..
        } = self;

        for event in buffer.iter() {
            let idx = event.kind().index();
            if suppressed[idx] {
                continue;
            }
            for listener in listeners[idx].iter_mut() {
                listener(event);
            }
        }
        buffer.clear();
    }

    pub fn buffered_count(&self) -> usize {
        self.buffer.len()
    }

    /// Events of `kind` emitted since the bus was created.
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.emitted[kind.index()]
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
