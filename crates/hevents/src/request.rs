// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscription state machine.
//!
//! A [`Request`] is one live subscription: a callback, an optional busy
//! interface and a packed atomic state word. The state word folds two
//! facts into one atomic:
//!
//! - `handler count`: how many threads are currently delivering (or have a
//!   delivery parked on a busy interface) for this request;
//! - `cancelled`: a large marker constant subtracted once on cancellation,
//!   so `state < 0` means cancelled regardless of the remaining count.
//!
//! Folding both into one word collapses the cancel-during-handle and
//! reap-after-cancel races into single atomic transitions:
//!
//! ```text
//!   LIVE (state >= 0)
//!     |  start_handling        -> LIVE, handling (state > 0)
//!     |      |  stop_handling  -> LIVE
//!     |  cancel                -> CANCELLED, draining (state < 0, count > 0)
//!     |                            |  stop_handling drains the count
//!     |                            v
//!     |                         CANCELLED (state == -CANCEL_MARKER), reapable
//! ```
//!
//! `cancel` blocks on a condvar until the count drains, which is the whole
//! cancellation guarantee: after it returns, no callback for this request
//! is running and none will ever start.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::busy::BusyInterface;
use crate::event::EventType;
use crate::pool::DeliveryPool;

/// Subtracted from the state word exactly once, by `cancel`. Must exceed
/// any realistic concurrent handler count so the count bits never bleed
/// into the sign.
const CANCEL_MARKER: i32 = 1 << 16;

/// Outcome of a walker's attempt to claim a request for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// Claim granted; the caller must deliver and then call
    /// [`Request::stop_handling`].
    Granted,
    /// Cancelled, but other threads are still inside the request: leave it
    /// linked, one of them owns the final transition.
    Skip,
    /// Cancelled with zero handlers: the walker may unlink and release the
    /// node.
    Reap,
}

/// Callback storage for a subscription.
pub(crate) type Callback<T> = Box<dyn Fn(&T) + Send + Sync + 'static>;

/// Ties a subscription to the client's serializer and to the pool that
/// recycles its queued-delivery nodes.
pub(crate) struct BusyBinding<T: EventType> {
    pub(crate) interface: Arc<BusyInterface>,
    pub(crate) pool: Arc<DeliveryPool<T>>,
}

/// One live subscription on a server.
///
/// The server's list holds the owning `Arc`; handles hold a `Weak` back
/// reference used only for cancellation; queued deliveries hold an `Arc`
/// plus one pinned handler-count unit each, which is what keeps a node
/// alive and unreapable while deliveries for it are still parked on a
/// busy interface.
pub(crate) struct Request<T: EventType> {
    /// Packed handler count + cancel marker. See module docs.
    state: AtomicI32,
    /// Parks the canceller until the last handler leaves.
    cancel_lock: Mutex<()>,
    cancel_cv: Condvar,
    callback: Callback<T>,
    busy: Option<BusyBinding<T>>,
}

impl<T: EventType> Request<T> {
    pub(crate) fn new(callback: Callback<T>, busy: Option<BusyBinding<T>>) -> Self {
        Self {
            state: AtomicI32::new(0),
            cancel_lock: Mutex::new(()),
            cancel_cv: Condvar::new(),
            callback,
            busy,
        }
    }

    /// Try to claim this request for one delivery.
    ///
    /// Increments the handler count iff the request is not cancelled. Only
    /// [`Claim::Granted`] permits invoking the callback, and it obliges the
    /// caller to a paired [`stop_handling`](Self::stop_handling).
    pub(crate) fn start_handling(&self) -> Claim {
        let mut state = self.state.load(Ordering::Relaxed);
        loop {
            if state < 0 {
                return if state == -CANCEL_MARKER {
                    Claim::Reap
                } else {
                    Claim::Skip
                };
            }
            match self.state.compare_exchange_weak(
                state,
                state + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Claim::Granted,
                Err(current) => state = current,
            }
        }
    }

    /// Release one handler-count unit.
    ///
    /// If this was the last unit of a cancelled request, wake the thread
    /// blocked in [`cancel`](Self::cancel). The lock/unlock of
    /// `cancel_lock` before the notify is load-bearing: it guarantees the
    /// canceller has either not yet checked the condition or is already
    /// parked in `wait`, so the notification cannot be lost.
    pub(crate) fn stop_handling(&self) {
        if self.state.fetch_sub(1, Ordering::AcqRel) == 1 - CANCEL_MARKER {
            drop(self.cancel_lock.lock());
            self.cancel_cv.notify_one();
        }
    }

    /// Pin one extra handler-count unit for a delivery parked on a busy
    /// interface.
    ///
    /// Unconditional, unlike [`start_handling`](Self::start_handling): the
    /// pinning thread already holds a granted claim, and a queued delivery
    /// must keep the node alive (and the canceller waiting) even if the
    /// request is cancelled before the queue drains. Released by the
    /// queued delivery through `stop_handling`.
    pub(crate) fn pin_queued(&self) {
        let prev = self.state.fetch_add(1, Ordering::AcqRel);
        debug_assert!(
            prev != -CANCEL_MARKER,
            "queued delivery pinned on a reapable request"
        );
    }

    /// Mark cancelled and wait until no thread is inside the request.
    ///
    /// After this returns: no new callback for this request will start, no
    /// callback for it is executing, and any deliveries that were parked on
    /// a busy interface have been delivered (their pinned units are part of
    /// the count this wait drains).
    pub(crate) fn cancel(&self) {
        if self.state.fetch_sub(CANCEL_MARKER, Ordering::AcqRel) > 0 {
            log::debug!("[events] cancel waiting for in-flight handlers");
            let mut guard = self.cancel_lock.lock();
            while self.state.load(Ordering::Acquire) != -CANCEL_MARKER {
                self.cancel_cv.wait(&mut guard);
            }
        }
    }

    /// Run the callback directly. Callers hold either a granted claim or
    /// (for redelivery) a pinned unit plus the busy interface.
    pub(crate) fn invoke(&self, event: &T) {
        (self.callback)(event);
    }

    /// Deliver one event to this subscription.
    ///
    /// Without a busy interface the callback runs on the calling thread;
    /// the callback is responsible for its own synchronization if multiple
    /// threads trigger concurrently. With one, the delivery either runs
    /// immediately (interface was idle) or is captured and queued, and the
    /// call ends by leaving the busy section, draining the queue if this
    /// thread was the last one out.
    pub(crate) fn deliver(this: &Arc<Self>, event: &T) {
        let Some(busy) = &this.busy else {
            this.invoke(event);
            return;
        };

        if busy.interface.try_acquire() {
            this.invoke(event);
        } else {
            log::debug!("[events] client busy, queueing event");
            this.pin_queued();
            let node = DeliveryPool::acquire(&busy.pool, Arc::clone(this), event.clone());
            busy.interface.push(node);
        }
        busy.interface.release_and_drain();
    }

    #[cfg(test)]
    pub(crate) fn raw_state(&self) -> i32 {
        self.state.load(Ordering::SeqCst)
    }
}
