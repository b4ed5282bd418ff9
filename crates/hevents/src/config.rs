// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatch defaults and per-server tuning knobs.
//!
//! All sizing constants live here. **Never hardcode elsewhere!**
//!
//! The defaults are sized for the common case of a handful of subscribers
//! per server and short busy sections; servers embedded in larger systems
//! can override them through [`ServerOptions`].

/// Default capacity reserved for a server's subscriber list.
///
/// Registration beyond this only costs a vector growth, never a failure.
pub const DEFAULT_REQUEST_CAPACITY: usize = 64;

/// Default capacity of the queued-delivery recycling pool.
///
/// Bounds how many drained delivery nodes are kept around for reuse; a
/// burst deeper than this falls back to the heap allocator and still
/// delivers.
pub const DEFAULT_DELIVERY_POOL_CAPACITY: usize = 32;

/// Tuning knobs for one [`Server`](crate::Server).
///
/// # Example
///
/// ```rust
/// use hevents::{ServerOptions, Server, EventType};
///
/// #[derive(Clone)]
/// struct Sample(u8);
/// impl EventType for Sample {}
///
/// let options = ServerOptions {
///     delivery_pool_capacity: 128,
///     ..ServerOptions::default()
/// };
/// let server = Server::<Sample>::with_options(options).unwrap();
/// # drop(server);
/// ```
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Initial capacity of the subscriber list.
    pub request_capacity: usize,
    /// Capacity of the queued-delivery recycling pool (must be > 0).
    pub delivery_pool_capacity: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            request_capacity: DEFAULT_REQUEST_CAPACITY,
            delivery_pool_capacity: DEFAULT_DELIVERY_POOL_CAPACITY,
        }
    }
}
