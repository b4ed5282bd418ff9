// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recycling pool for queued-delivery nodes.
//!
//! Every delivery that gets parked on a busy interface needs a heap node
//! (subscription reference + payload copy). Drained nodes are returned to
//! a lock-free freelist and reused, so a steady busy/drain workload stops
//! allocating after warm-up.
//!
//! # Design
//!
//! - **Lock-free**: crossbeam `ArrayQueue` freelist, fixed capacity.
//! - **Best-effort**: an empty freelist falls back to the heap; a full
//!   freelist drops the returned node. Correctness never depends on the
//!   pool.
//! - **Metrics**: reuse/allocation counters for diagnostics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crossbeam::queue::ArrayQueue;

use crate::busy::QueuedEvent;
use crate::event::EventType;
use crate::request::Request;

/// Freelist of reusable delivery nodes for one server.
pub(crate) struct DeliveryPool<T: EventType> {
    freelist: ArrayQueue<Box<DeliveryNode<T>>>,
    /// Nodes handed out from the freelist.
    reused: AtomicU64,
    /// Nodes that had to come from the heap (freelist empty).
    allocated: AtomicU64,
}

impl<T: EventType> DeliveryPool<T> {
    /// Create a pool keeping at most `capacity` drained nodes for reuse.
    pub(crate) fn new(capacity: usize) -> Result<Self, &'static str> {
        if capacity == 0 {
            return Err("delivery pool capacity must be > 0");
        }
        Ok(Self {
            freelist: ArrayQueue::new(capacity),
            reused: AtomicU64::new(0),
            allocated: AtomicU64::new(0),
        })
    }

    /// Produce a node capturing one parked delivery.
    ///
    /// The caller has already pinned one handler-count unit on `request`;
    /// the node releases it when redelivered or dropped.
    pub(crate) fn acquire(
        pool: &Arc<Self>,
        request: Arc<Request<T>>,
        event: T,
    ) -> Box<DeliveryNode<T>> {
        let mut node = match pool.freelist.pop() {
            Some(node) => {
                pool.reused.fetch_add(1, Ordering::Relaxed);
                node
            }
            None => {
                pool.allocated.fetch_add(1, Ordering::Relaxed);
                Box::new(DeliveryNode {
                    pool: Weak::new(),
                    slot: None,
                })
            }
        };
        node.pool = Arc::downgrade(pool);
        node.slot = Some((request, event));
        node
    }

    /// Return a spent node to the freelist. A full freelist simply drops
    /// it.
    fn recycle(&self, mut node: Box<DeliveryNode<T>>) {
        debug_assert!(node.slot.is_none(), "recycling a node that still holds a delivery");
        node.pool = Weak::new();
        let _ = self.freelist.push(node);
    }

    /// Nodes currently parked on the freelist.
    #[cfg(test)]
    pub(crate) fn free_nodes(&self) -> usize {
        self.freelist.len()
    }

    #[cfg(test)]
    pub(crate) fn reused_count(&self) -> u64 {
        self.reused.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn allocated_count(&self) -> u64 {
        self.allocated.load(Ordering::Relaxed)
    }
}

/// One parked delivery: the subscription, a payload copy, and the way home
/// to its pool.
///
/// The `Arc<Request<T>>` plus the pinned handler-count unit taken at
/// enqueue time are what make a queued event an *owning* reference: the
/// node cannot be reaped, and a canceller waits for this delivery, until
/// [`redeliver`](QueuedEvent::redeliver) (or drop) releases the unit.
pub(crate) struct DeliveryNode<T: EventType> {
    pool: Weak<DeliveryPool<T>>,
    slot: Option<(Arc<Request<T>>, T)>,
}

impl<T: EventType> QueuedEvent for DeliveryNode<T> {
    fn redeliver(mut self: Box<Self>) {
        let Some((request, event)) = self.slot.take() else {
            debug_assert!(false, "queued delivery node redelivered twice");
            return;
        };
        // Queued deliveries invoke unconditionally once dequeued; the
        // pinned unit released below is what a concurrent canceller is
        // waiting on.
        request.invoke(&event);
        request.stop_handling();
        drop(request);
        drop(event);
        if let Some(pool) = std::mem::take(&mut self.pool).upgrade() {
            pool.recycle(self);
        }
    }
}

impl<T: EventType> Drop for DeliveryNode<T> {
    fn drop(&mut self) {
        // Dropped without redelivery (busy interface torn down with a
        // non-empty queue): release the pinned unit so a waiting canceller
        // is not stranded, but do not run the callback.
        if let Some((request, _event)) = self.slot.take() {
            request.stop_handling();
        }
    }
}
