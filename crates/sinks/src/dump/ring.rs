//! Fixed-size ring of recent envelopes
//!
//! Overwrites the oldest slot once full. A closed ring rejects pushes under
//! the same lock that guards the slots, so nothing lands after `close`.

use std::sync::Arc;

use parking_lot::RwLock;

use courier_protocol::Envelope;

/// Maximum capacity to prevent memory issues
const MAX_CAPACITY: usize = 100_000;

#[derive(Debug)]
pub(crate) struct EnvelopeRing {
    inner: RwLock<RingInner>,
}

#[derive(Debug)]
struct RingInner {
    slots: Vec<Option<Arc<Envelope>>>,
    /// Next slot to write
    write_pos: usize,
    /// Envelopes ever pushed
    total_written: u64,
    capacity: usize,
    closed: bool,
}

impl EnvelopeRing {
    /// Capacity is clamped to `1..=MAX_CAPACITY`
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CAPACITY);
        Self {
            inner: RwLock::new(RingInner {
                slots: vec![None; capacity],
                write_pos: 0,
                total_written: 0,
                capacity,
                closed: false,
            }),
        }
    }

    /// Returns false if the ring is closed
    pub(crate) fn push(&self, envelope: Arc<Envelope>) -> bool {
        let mut inner = self.inner.write();
        if inner.closed {
            return false;
        }
        let pos = inner.write_pos;
        inner.slots[pos] = Some(envelope);
        inner.write_pos = (pos + 1) % inner.capacity;
        inner.total_written += 1;
        true
    }

    /// Every retained envelope, oldest first
    pub(crate) fn snapshot(&self) -> Vec<Arc<Envelope>> {
        let inner = self.inner.read();
        let len = inner.len();
        if len == 0 {
            return Vec::new();
        }

        // Once wrapped, the oldest entry sits at write_pos
        let start = if len == inner.capacity {
            inner.write_pos
        } else {
            0
        };

        (0..len)
            .filter_map(|i| inner.slots[(start + i) % inner.capacity].clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.inner.read().capacity
    }

    pub(crate) fn total_written(&self) -> u64 {
        self.inner.read().total_written
    }

    /// Reject further pushes and release retained envelopes
    pub(crate) fn close(&self) {
        let mut inner = self.inner.write();
        inner.closed = true;
        for slot in inner.slots.iter_mut() {
            *slot = None;
        }
        inner.write_pos = 0;
        inner.total_written = 0;
    }
}

impl RingInner {
    fn len(&self) -> usize {
        self.total_written.min(self.capacity as u64) as usize
    }
}
