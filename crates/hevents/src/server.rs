// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-event-type registry and dispatcher.
//!
//! A [`Server`] holds the subscriptions for one event type and fans every
//! trigger out to them. The list discipline is the concurrency heart of
//! the crate:
//!
//! - the list mutex protects every mutation of the subscriber list and
//!   every claim (`start_handling`) on a node, but is **never** held
//!   across a callback;
//! - claiming under the mutex is what lets a concurrent canceller observe
//!   a non-zero handler count and park until the delivery finishes;
//! - reaping (unlinking a cancelled, quiescent node) also happens under
//!   the mutex, serializing it against registration and other walkers.
//!
//! One-shot event types take a faster path: the whole list is detached
//! under the mutex and consumed, so a node can never be observed by two
//! triggers.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::busy::BusyInterface;
use crate::config::ServerOptions;
use crate::event::{EventListener, EventType};
use crate::handle::RequestHandle;
use crate::pool::DeliveryPool;
use crate::request::{BusyBinding, Claim, Request};

/// Registry and dispatcher for one event type.
///
/// Triggering and registering are safe from any number of threads; share
/// the server behind an `Arc` (or borrow it scoped) as usual.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use hevents::{EventType, Server};
///
/// #[derive(Clone)]
/// struct Temperature(i32);
/// impl EventType for Temperature {}
///
/// let server = Server::<Temperature>::new();
/// let last = Arc::new(AtomicU32::new(0));
///
/// let sink = Arc::clone(&last);
/// let mut handle = server.request(move |t: &Temperature| {
///     sink.store(t.0 as u32, Ordering::SeqCst);
/// });
///
/// server.trigger(&Temperature(21));
/// assert_eq!(last.load(Ordering::SeqCst), 21);
///
/// handle.cancel();
/// server.trigger(&Temperature(22));
/// assert_eq!(last.load(Ordering::SeqCst), 21); // cancelled: unchanged
/// ```
pub struct Server<T: EventType> {
    /// Subscriber list, newest first. The mutex also serializes claims and
    /// reaps; see module docs.
    requests: Mutex<Vec<Arc<Request<T>>>>,
    /// Recycler for queued-delivery nodes of this event type.
    pool: Arc<DeliveryPool<T>>,
}

impl<T: EventType> Server<T> {
    /// Create a server with default sizing.
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::expect_used)] // default options are statically valid
        let server = Self::with_options(ServerOptions::default())
            .expect("default server options must be valid");
        server
    }

    /// Create a server with explicit sizing.
    ///
    /// # Errors
    ///
    /// Rejects a zero delivery-pool capacity.
    pub fn with_options(options: ServerOptions) -> Result<Self, &'static str> {
        Ok(Self {
            requests: Mutex::new(Vec::with_capacity(options.request_capacity)),
            pool: Arc::new(DeliveryPool::new(options.delivery_pool_capacity)?),
        })
    }

    /// Subscribe a callback.
    ///
    /// Without a busy interface the callback may be invoked concurrently
    /// by parallel triggers; it is responsible for its own synchronization.
    pub fn request<F>(&self, callback: F) -> RequestHandle<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.insert(Request::new(Box::new(callback), None))
    }

    /// Subscribe a callback whose deliveries are serialized through the
    /// client's busy interface.
    ///
    /// The client owns the interface and must keep it alive (and drained)
    /// for as long as the subscription exists. Any number of subscriptions,
    /// for any event types, may share one interface; their callbacks never
    /// overlap in time.
    pub fn request_with_busy<F>(&self, callback: F, busy: &Arc<BusyInterface>) -> RequestHandle<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.insert(Request::new(
            Box::new(callback),
            Some(BusyBinding {
                interface: Arc::clone(busy),
                pool: Arc::clone(&self.pool),
            }),
        ))
    }

    /// Subscribe a client object implementing [`EventListener`].
    ///
    /// The object-based equivalent of [`request`](Self::request): state the
    /// callback needs lives in the listener's fields.
    pub fn request_listener(&self, listener: Arc<dyn EventListener<T>>) -> RequestHandle<T> {
        self.request(move |event| listener.on_event(event))
    }

    /// Subscribe a client object with deliveries serialized through its
    /// busy interface.
    pub fn request_listener_with_busy(
        &self,
        listener: Arc<dyn EventListener<T>>,
        busy: &Arc<BusyInterface>,
    ) -> RequestHandle<T> {
        self.request_with_busy(move |event| listener.on_event(event), busy)
    }

    fn insert(&self, request: Request<T>) -> RequestHandle<T> {
        let request = Arc::new(request);
        let handle = RequestHandle::new(Arc::downgrade(&request));
        // Newest first: a walker that released the mutex mid-walk has
        // already passed the front and never sees this registration.
        self.requests.lock().insert(0, request);
        log::debug!("[events] subscription registered");
        handle
    }

    /// Deliver `event` to every live subscription.
    ///
    /// For repeated event types each non-cancelled subscription is invoked
    /// exactly once per trigger — directly, or through its busy interface.
    /// For one-shot event types the whole subscriber list is consumed.
    /// Callbacks run on this thread (or on the thread draining a busy
    /// interface); the list mutex is never held across them, so callbacks
    /// may re-enter the server.
    pub fn trigger(&self, event: &T) {
        if T::ONE_SHOT {
            self.trigger_one_shot(event);
        } else {
            self.trigger_repeated(event);
        }
    }

    /// Detach-then-iterate: once the list is swapped out under the mutex,
    /// no later registration or walker can reach these nodes, so the walk
    /// itself needs no list lock. Delivery is still gated per node so that
    /// a concurrent `cancel` keeps its barrier guarantee.
    fn trigger_one_shot(&self, event: &T) {
        let detached = mem::take(&mut *self.requests.lock());
        if detached.is_empty() {
            return;
        }
        log::debug!("[events] one-shot trigger consuming {} subscriptions", detached.len());
        for request in &detached {
            if request.start_handling() == Claim::Granted {
                Request::deliver(request, event);
                request.stop_handling();
            }
        }
        // Dropping the detached list releases the nodes (queued deliveries
        // keep theirs alive until drained).
    }

    /// The concurrent walk. Claims happen under the list mutex; the mutex
    /// is released across the callback and retaken to balance the claim.
    /// `Reap` unlinks in place; `Skip` (cancelled, but another thread is
    /// still inside the node) leaves the entry for whoever drains last.
    fn trigger_repeated(&self, event: &T) {
        let mut list = self.requests.lock();
        let mut idx = 0usize;
        loop {
            let current = loop {
                let claim = match list.get(idx) {
                    None => return,
                    Some(request) => request.start_handling(),
                };
                match claim {
                    Claim::Granted => break Arc::clone(&list[idx]),
                    Claim::Skip => idx += 1,
                    Claim::Reap => {
                        log::debug!("[events] reaping cancelled subscription");
                        list.remove(idx);
                    }
                }
            };

            drop(list);
            Request::deliver(&current, event);
            list = self.requests.lock();
            current.stop_handling();

            // Our claim pinned the node for the whole unlocked window, so
            // it is still linked; resume right past it. Index arithmetic
            // first, identity scan only when a concurrent registration or
            // reap shifted the list under us.
            idx = if list.get(idx).is_some_and(|r| Arc::ptr_eq(r, &current)) {
                idx + 1
            } else {
                match list.iter().position(|r| Arc::ptr_eq(r, &current)) {
                    Some(pos) => pos + 1,
                    None => {
                        debug_assert!(false, "handled subscription vanished from the list");
                        return;
                    }
                }
            };
        }
    }

    /// Current number of linked subscriptions (cancelled-but-unreaped
    /// nodes included).
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl<T: EventType> Default for Server<T> {
    fn default() -> Self {
        Self::new()
    }
}
