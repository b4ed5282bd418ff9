// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hevents - typed in-process event dispatch
//!
//! A small, thread-safe event-dispatch core: one [`Server`] per event
//! type, any number of subscriptions per server, and an optional
//! per-client [`BusyInterface`] that guarantees at most one callback at a
//! time for that client — queueing and draining whatever arrives while it
//! is busy.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! use hevents::{EventType, Server};
//!
//! #[derive(Clone)]
//! struct FrameReady {
//!     frame_id: u32,
//! }
//! impl EventType for FrameReady {}
//!
//! let server = Server::<FrameReady>::new();
//! let last_frame = Arc::new(AtomicU32::new(0));
//!
//! let sink = Arc::clone(&last_frame);
//! let mut handle = server.request(move |event: &FrameReady| {
//!     sink.store(event.frame_id, Ordering::SeqCst);
//! });
//!
//! server.trigger(&FrameReady { frame_id: 7 });
//! assert_eq!(last_frame.load(Ordering::SeqCst), 7);
//!
//! // Cancel before anything the callback captured goes away. The call
//! // blocks until in-flight deliveries (if any) have finished.
//! handle.cancel();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        Client objects                        |
//! |   own: BusyInterface (serializer) + RequestHandle (cancel)   |
//! +--------------------------------------------------------------+
//! |                        Server<T>                             |
//! |   subscriber list + list mutex + delivery-node pool          |
//! |   trigger: claim -> callback (mutex released) -> unclaim     |
//! +--------------------------------------------------------------+
//! |                        Request<T>                            |
//! |   packed atomic state word: handler count | cancel marker    |
//! |   cancel handshake: condvar park until the count drains      |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Server`] | Per-event-type registry and dispatcher |
//! | [`RequestHandle`] | Move-only, single-use cancellation capability |
//! | [`BusyInterface`] | Per-client serializer: one callback at a time, FIFO drain |
//! | [`EventType`] | Payload contract plus the one-shot/repeated delivery mode |
//! | [`EventListener`] | Object-based callback registration |
//!
//! ## Guarantees
//!
//! - **Cancellation barrier**: after [`RequestHandle::cancel`] returns,
//!   the subscription's callback is not running and never runs again —
//!   including deliveries that were parked on a busy interface.
//! - **Per-client mutual exclusion**: callbacks bound to one
//!   [`BusyInterface`] never overlap, no matter how many threads trigger
//!   how many servers.
//! - **Delivery completeness**: a trigger reaches every subscription that
//!   was registered (and not cancelled) when it took the list — exactly
//!   once each.
//!
//! No ordering is promised between different subscribers, servers or busy
//! interfaces, and the core never blocks a trigger on a user callback
//! other than the one it is currently running.

/// Per-client callback serialization (busy interface + queued deliveries).
pub mod busy;
/// Sizing defaults and per-server options.
pub mod config;
/// Event payload and listener contracts.
pub mod event;
/// Cancellation handles.
pub mod handle;
mod pool;
mod request;
/// Per-event-type registry and dispatcher.
pub mod server;

pub use busy::BusyInterface;
pub use config::ServerOptions;
pub use event::{EventListener, EventType};
pub use handle::RequestHandle;
pub use server::Server;
