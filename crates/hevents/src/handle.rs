// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cancellation capability for one subscription.
//!
//! A [`RequestHandle`] is the only way to end a repeated subscription. It
//! is move-only and single-use: `cancel` consumes the back reference, and
//! a handle must be cancelled before anything its callback captured is
//! destroyed — that is the entire memory-safety contract between the
//! dispatch core and its clients.

use std::sync::Weak;

use crate::event::EventType;
use crate::request::Request;

/// Move-only, single-use owner of one subscription's cancellation right.
///
/// `cancel` blocks until every in-flight delivery for the subscription has
/// finished — including deliveries parked on a busy interface — so after
/// it returns the callback's captures can be destroyed safely.
///
/// An unbound handle ([`RequestHandle::default`]) carries nothing and is
/// useful for late-initialized fields; cancelling it is a programmer error
/// like any double cancel.
///
/// # Drop discipline
///
/// Dropping a handle that was never cancelled is a programmer error: the
/// subscription would keep firing against captures whose lifetime the core
/// can no longer reason about. Debug builds assert on it.
#[must_use = "a subscription without its handle can never be cancelled"]
pub struct RequestHandle<T: EventType> {
    request: Option<Weak<Request<T>>>,
}

impl<T: EventType> Default for RequestHandle<T> {
    fn default() -> Self {
        Self { request: None }
    }
}

impl<T: EventType> RequestHandle<T> {
    pub(crate) fn new(request: Weak<Request<T>>) -> Self {
        Self {
            request: Some(request),
        }
    }

    /// Cancel the subscription, blocking until no delivery for it is in
    /// flight.
    ///
    /// After this returns the callback will never run again and is not
    /// currently running. Must be called exactly once; debug builds assert
    /// on a second call (or on cancelling an unbound handle).
    ///
    /// If the server (or, for a consumed one-shot subscription, the last
    /// queued delivery) is already gone, there is nothing left that could
    /// fire and the call just clears the handle.
    ///
    /// Do not call from inside a delivery that the cancelled subscription's
    /// busy interface would have to drain: the wait would be on the calling
    /// thread itself.
    pub fn cancel(&mut self) {
        let Some(request) = self.request.take() else {
            debug_assert!(false, "request handle cancelled twice (or never bound)");
            return;
        };
        if let Some(request) = request.upgrade() {
            request.cancel();
        } else {
            log::trace!("[events] cancel on an already-released subscription");
        }
    }

    /// Whether this handle has been consumed by [`cancel`](Self::cancel)
    /// (or was never bound to a subscription).
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.request.is_none()
    }
}

impl<T: EventType> Drop for RequestHandle<T> {
    fn drop(&mut self) {
        debug_assert!(
            self.request.is_none(),
            "request handle dropped without cancel(); \
             the subscription could still fire against dead captures"
        );
    }
}

impl<T: EventType> std::fmt::Debug for RequestHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
