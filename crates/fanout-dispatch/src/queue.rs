//! Bounded intake buffer with explicit overload signalling.
//!
//! A FIFO queue between the ingestion surface and the worker pool. Offers
//! never block: a full buffer is reported as [`OfferOutcome::Overloaded`]
//! so the caller can push back instead of silently accepting work the
//! system cannot drain. Takes suspend cooperatively until an item arrives
//! or the buffer is closed and drained.

use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use fanout_core::Packet;
use tokio::sync::{Mutex, Notify};

/// Result of a non-blocking offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// The packet was enqueued.
    Accepted,
    /// The buffer is at capacity; the caller should retry later.
    Overloaded,
    /// The buffer was closed for shutdown; no further packets are taken.
    Closed,
}

#[derive(Debug)]
struct QueueInner {
    items: VecDeque<Packet>,
    closed: bool,
}

/// Bounded FIFO buffer shared by the ingestion path and all workers.
///
/// Each enqueued packet is removed by exactly one taker. Interleaving
/// across concurrent takers is unspecified; FIFO holds at the queue
/// boundary itself.
#[derive(Debug)]
pub struct IntakeQueue {
    capacity: usize,
    inner: Mutex<QueueInner>,
    depth: AtomicUsize,
    item_ready: Notify,
}

impl IntakeQueue {
    /// Creates a buffer holding at most `capacity` packets.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 1, "intake capacity must be positive");
        Self {
            capacity,
            inner: Mutex::new(QueueInner { items: VecDeque::with_capacity(capacity), closed: false }),
            depth: AtomicUsize::new(0),
            item_ready: Notify::new(),
        }
    }

    /// Offers a packet without waiting.
    pub async fn offer(&self, packet: Packet) -> OfferOutcome {
        {
            let mut inner = self.inner.lock().await;
            if inner.closed {
                return OfferOutcome::Closed;
            }
            if inner.items.len() >= self.capacity {
                return OfferOutcome::Overloaded;
            }
            inner.items.push_back(packet);
            self.depth.store(inner.items.len(), Ordering::Release);
        }
        self.item_ready.notify_one();
        OfferOutcome::Accepted
    }

    /// Takes the next packet, suspending until one is available.
    ///
    /// Returns `None` once the buffer is closed and fully drained.
    pub async fn take(&self) -> Option<Packet> {
        loop {
            let notified = self.item_ready.notified();
            tokio::pin!(notified);

            {
                let mut inner = self.inner.lock().await;
                if let Some(packet) = inner.items.pop_front() {
                    self.depth.store(inner.items.len(), Ordering::Release);
                    return Some(packet);
                }
                if inner.closed {
                    return None;
                }
                // Register interest while still holding the lock so a
                // notify between unlock and await cannot be lost.
                notified.as_mut().enable();
            }

            notified.await;
        }
    }

    /// Closes the buffer. Pending packets remain takeable; further offers
    /// return [`OfferOutcome::Closed`].
    pub async fn close(&self) {
        {
            let mut inner = self.inner.lock().await;
            inner.closed = true;
        }
        self.item_ready.notify_waiters();
    }

    /// Current occupancy. Best-effort read, always within `[0, capacity]`.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
