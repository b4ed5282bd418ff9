// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-client callback serializer.
//!
//! A [`BusyInterface`] guarantees that at most one callback bound to it runs
//! at any instant, across every subscription (of any event type) that names
//! it. Deliveries that arrive while the client is busy are captured as
//! queued events and drained, in FIFO order, by the last thread to leave
//! the busy section.
//!
//! # Design
//!
//! - **Depth counter**: an atomic unsigned counter. The thread whose
//!   increment moved it from 0 owns the right to run a callback; everyone
//!   else queues.
//! - **Drain hand-off**: the thread whose decrement moved the counter back
//!   to 0 is responsible for the queue. If another thread re-takes the
//!   interface mid-drain, the popped event is pushed back to the *front*
//!   of the queue so the winner delivers it first — this keeps queue order
//!   a close approximation of FIFO across the race.
//!
//! The queue itself holds type-erased [`QueuedEvent`] boxes so one
//! interface can serialize deliveries from servers of different event
//! types.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

/// A captured delivery parked on a busy interface.
///
/// Implementations own everything needed to re-run the delivery later: the
/// subscription and a copy of the payload. Consuming the box either invokes
/// the callback (redelivery) or, on drop, releases the resources without
/// invoking it.
pub(crate) trait QueuedEvent: Send {
    /// Invoke the captured subscription's callback with the captured
    /// payload. Only called while the draining thread holds the interface
    /// busy.
    fn redeliver(self: Box<Self>);
}

/// Per-client serialization gadget.
///
/// The event system does not own busy interfaces; the client does, and it
/// must keep the interface alive for as long as any subscription names it.
/// Dropping an interface that still holds queued events is a programmer
/// error (drain or cancel first); the queued deliveries are released
/// without running their callbacks.
///
/// # Manual busy sections
///
/// A client with a logical busy period not caused by an event (a UI thread
/// handling input, say) brackets it with [`set_busy`](Self::set_busy) /
/// [`unset_busy`](Self::unset_busy). Events triggered in between are queued
/// and delivered by the `unset_busy` call that ends the section.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use hevents::{BusyInterface, EventType, Server};
///
/// #[derive(Clone)]
/// struct Ping(u32);
/// impl EventType for Ping {}
///
/// let server = Server::<Ping>::new();
/// let busy = Arc::new(BusyInterface::new());
/// let seen = Arc::new(AtomicU32::new(0));
///
/// let sink = Arc::clone(&seen);
/// let mut handle =
///     server.request_with_busy(move |ping: &Ping| sink.store(ping.0, Ordering::SeqCst), &busy);
///
/// busy.set_busy();
/// server.trigger(&Ping(7));
/// assert_eq!(seen.load(Ordering::SeqCst), 0); // parked on the interface
/// busy.unset_busy();
/// assert_eq!(seen.load(Ordering::SeqCst), 7); // drained
///
/// handle.cancel();
/// ```
#[derive(Default)]
pub struct BusyInterface {
    /// Number of threads currently inside the busy section (or queueing).
    busy_depth: AtomicU32,
    /// Deliveries parked while the client was busy, oldest first.
    queued: Mutex<VecDeque<Box<dyn QueuedEvent>>>,
}

impl BusyInterface {
    /// Create an idle interface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the busy section.
    ///
    /// Returns `true` iff the client was idle before this call, i.e. the
    /// caller is now the sole permitted callback runner. Every `set_busy`
    /// must be balanced by exactly one [`unset_busy`](Self::unset_busy).
    pub fn set_busy(&self) -> bool {
        self.try_acquire()
    }

    /// Leave the busy section, draining queued deliveries if this caller
    /// was the last one out.
    pub fn unset_busy(&self) {
        self.release_and_drain();
    }

    /// Whether any thread currently holds the interface busy.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy_depth.load(Ordering::Acquire) > 0
    }

    /// Atomically bump the depth; `true` iff the previous depth was 0.
    pub(crate) fn try_acquire(&self) -> bool {
        self.busy_depth.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Atomically drop the depth; `true` iff this caller was the last one
    /// out and therefore owns the drain.
    pub(crate) fn release(&self) -> bool {
        let prev = self.busy_depth.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev != 0, "unset_busy called on an idle busy interface");
        prev == 1
    }

    /// Append a captured delivery to the back of the queue.
    pub(crate) fn push(&self, event: Box<dyn QueuedEvent>) {
        self.queued.lock().push_back(event);
    }

    /// Put a popped delivery back at the front of the queue (drain-race
    /// recovery: the racing thread must see it first).
    pub(crate) fn push_front(&self, event: Box<dyn QueuedEvent>) {
        self.queued.lock().push_front(event);
    }

    /// Remove and return the oldest queued delivery, if any.
    pub(crate) fn pop(&self) -> Option<Box<dyn QueuedEvent>> {
        self.queued.lock().pop_front()
    }

    /// Leave the busy section and, while this thread keeps being the last
    /// one out, deliver queued events one at a time.
    ///
    /// The loop re-acquires the interface around every redelivery so that
    /// a thread racing into `set_busy` mid-drain takes over cleanly: the
    /// popped event goes back to the front of the queue, and the next
    /// `release` iteration hands responsibility to the racer.
    pub(crate) fn release_and_drain(&self) {
        while self.release() {
            let Some(event) = self.pop() else {
                break;
            };
            if self.try_acquire() {
                log::trace!("[busy] draining one queued event");
                event.redeliver();
            } else {
                log::trace!("[busy] drain raced, handing queue to the new busy thread");
                self.push_front(event);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn queued_len(&self) -> usize {
        self.queued.lock().len()
    }
}

impl Drop for BusyInterface {
    fn drop(&mut self) {
        // Queued deliveries release their subscriptions without invoking
        // the callbacks. Reaching this with a non-empty queue means the
        // client destroyed its interface before draining or cancelling.
        debug_assert!(
            self.queued.get_mut().is_empty(),
            "busy interface dropped with {} undelivered queued events",
            self.queued.get_mut().len()
        );
    }
}
