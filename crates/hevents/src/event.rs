// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event type and listener contracts.
//!
//! An event type is a plain payload struct plus a compile-time delivery mode:
//! *repeated* events leave their subscribers registered across triggers,
//! *one-shot* events consume the whole subscriber list on every trigger.
//!
//! # Example
//!
//! ```rust
//! use hevents::EventType;
//!
//! #[derive(Clone, Debug)]
//! struct ConnectionLost {
//!     peer_id: u64,
//! }
//!
//! impl EventType for ConnectionLost {
//!     const ONE_SHOT: bool = true;
//! }
//! ```

/// Contract every dispatched payload must satisfy.
///
/// The dispatch core treats the payload as an opaque value: it is borrowed
/// for direct callback delivery and cloned when a delivery has to be queued
/// on a busy interface.
pub trait EventType: Clone + Send + 'static {
    /// Delivery mode of this event type.
    ///
    /// `true`: every trigger detaches and consumes the whole subscriber
    /// list, so each subscription fires at most once.
    /// `false` (default): subscriptions persist until individually
    /// cancelled.
    const ONE_SHOT: bool = false;
}

/// Listener for events of type `T`.
///
/// This is the object-based registration form: instead of a free closure,
/// a client object implements `EventListener` and subscribes itself via
/// [`Server::request_listener`](crate::Server::request_listener). State the
/// callback needs (a "cookie" in the closure form) lives in fields of the
/// implementing type.
///
/// # Thread Safety
///
/// Callbacks are invoked from whichever thread triggers the event (or from
/// a draining thread when the delivery went through a busy interface), so
/// implementations must be `Send + Sync`. Without a busy interface the same
/// listener may be invoked concurrently by parallel triggers.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use hevents::{EventListener, EventType};
///
/// #[derive(Clone)]
/// struct Tick(u32);
/// impl EventType for Tick {}
///
/// struct TickCounter {
///     seen: AtomicU32,
/// }
///
/// impl EventListener<Tick> for TickCounter {
///     fn on_event(&self, event: &Tick) {
///         self.seen.fetch_add(event.0, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait EventListener<T: EventType>: Send + Sync {
    /// Called once per delivered event.
    fn on_event(&self, event: &T);
}
