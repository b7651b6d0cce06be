//! Event queue with deterministic ordering.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::models::{Event, EventKind, EventOrdering, ProcessId, Time};

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Rank of the event kind in the run's [`EventOrdering`]
/// 3. Kind (declaration order, for kinds sharing a rank)
/// 4. Process id (lexicographic name order)
/// 5. Sequence number (FIFO for everything else)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventKey {
    /// When the event fires.
    pub time: Time,
    /// Rank of the kind at equal times.
    pub rank: u8,
    /// Event kind.
    pub kind: EventKind,
    /// Subject process.
    pub process: ProcessId,
    /// Insertion sequence number.
    pub sequence: u64,
}

/// An event popped from the queue, with its insertion sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheduled {
    /// Insertion sequence number (unique per queue).
    pub sequence: u64,
    /// The event.
    pub event: Event,
}

#[derive(Debug)]
struct Entry {
    key: EventKey,
    event: Event,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Min-priority queue of pending events.
///
/// Events leave the queue only by being popped.
#[derive(Debug)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    ordering: EventOrdering,
    sequence: u64,
}

impl EventQueue {
    /// Creates an empty queue using `ordering` for same-instant ties.
    pub fn new(ordering: EventOrdering) -> Self {
        Self {
            heap: BinaryHeap::new(),
            ordering,
            sequence: 0,
        }
    }

    /// Inserts an event and returns its sequence number.
    pub fn push(&mut self, event: Event) -> u64 {
        let sequence = self.sequence;
        self.sequence += 1;
        let key = EventKey {
            time: event.time,
            rank: self.ordering.rank(event.kind),
            kind: event.kind,
            process: event.process,
            sequence,
        };
        self.heap.push(Reverse(Entry { key, event }));
        sequence
    }

    /// Inserts several events produced at one instant.
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.push(event);
        }
    }

    /// The next event to fire, without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek().map(|Reverse(entry)| &entry.event)
    }

    /// Key of the next event to fire.
    pub fn peek_key(&self) -> Option<EventKey> {
        self.heap.peek().map(|Reverse(entry)| entry.key)
    }

    /// Removes and returns the next event to fire.
    pub fn pop(&mut self) -> Option<Scheduled> {
        self.heap.pop().map(|Reverse(entry)| Scheduled {
            sequence: entry.key.sequence,
            event: entry.event,
        })
    }

    /// Rank of a kind under this queue's ordering.
    pub fn rank(&self, kind: EventKind) -> u8 {
        self.ordering.rank(kind)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
