// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Basic dispatch integration tests
//!
//! Register/trigger/cancel round trips, busy-interface queueing and FIFO
//! drain, and the different registration forms (function pointer, closure
//! with captured state, listener object).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use hevents::{BusyInterface, EventListener, EventType, Server};

#[derive(Clone, Debug, PartialEq)]
struct Foo(u32);
impl EventType for Foo {}

#[derive(Clone, Debug)]
struct Bar(u32);
impl EventType for Bar {}

#[test]
fn test_register_trigger_cancel_single_client() {
    let server = Server::<Foo>::new();
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&received);
    let mut handle = server.request(move |event: &Foo| {
        sink.lock().expect("callback log poisoned").push(event.0);
    });

    server.trigger(&Foo(42));
    assert_eq!(*received.lock().expect("callback log poisoned"), vec![42]);

    handle.cancel();
    server.trigger(&Foo(43));
    assert_eq!(
        *received.lock().expect("callback log poisoned"),
        vec![42],
        "cancelled subscription must not observe Foo(43)"
    );
}

#[test]
fn test_trigger_without_subscribers_is_harmless() {
    let server = Server::<Foo>::new();
    server.trigger(&Foo(1));
    assert_eq!(server.subscription_count(), 0);
}

#[test]
fn test_busy_queue_drains_in_fifo_order() {
    let server = Server::<Foo>::new();
    let busy = Arc::new(BusyInterface::new());
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&received);
    let mut handle = server.request_with_busy(
        move |event: &Foo| {
            sink.lock().expect("callback log poisoned").push(event.0);
        },
        &busy,
    );

    busy.set_busy();
    server.trigger(&Foo(1));
    server.trigger(&Foo(2));
    assert!(
        received.lock().expect("callback log poisoned").is_empty(),
        "deliveries must be parked while the client is busy"
    );

    busy.unset_busy();
    assert_eq!(
        *received.lock().expect("callback log poisoned"),
        vec![1, 2],
        "queued deliveries must drain in push order"
    );

    handle.cancel();
}

#[test]
fn test_one_busy_interface_serializes_multiple_event_types() {
    // One client, two servers of different event types, one serializer —
    // deliveries of both types park on the same queue during a manual busy
    // section.
    let foo_server = Server::<Foo>::new();
    let bar_server = Server::<Bar>::new();
    let busy = Arc::new(BusyInterface::new());
    let order = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&order);
    let mut foo_handle = foo_server.request_with_busy(
        move |event: &Foo| {
            sink.lock().expect("callback log poisoned").push(("foo", event.0));
        },
        &busy,
    );
    let sink = Arc::clone(&order);
    let mut bar_handle = bar_server.request_with_busy(
        move |event: &Bar| {
            sink.lock().expect("callback log poisoned").push(("bar", event.0));
        },
        &busy,
    );

    busy.set_busy();
    foo_server.trigger(&Foo(1));
    bar_server.trigger(&Bar(2));
    foo_server.trigger(&Foo(3));
    assert!(order.lock().expect("callback log poisoned").is_empty());
    busy.unset_busy();

    assert_eq!(
        *order.lock().expect("callback log poisoned"),
        vec![("foo", 1), ("bar", 2), ("foo", 3)]
    );

    foo_handle.cancel();
    bar_handle.cancel();
}

#[test]
fn test_registration_forms() {
    static PLAIN_HITS: AtomicU32 = AtomicU32::new(0);
    fn plain_callback(_event: &Foo) {
        PLAIN_HITS.fetch_add(1, Ordering::SeqCst);
    }

    struct Client {
        cookie: u32,
        total: AtomicU32,
    }
    impl EventListener<Foo> for Client {
        fn on_event(&self, event: &Foo) {
            self.total.fetch_add(event.0 + self.cookie, Ordering::SeqCst);
        }
    }

    let server = Server::<Foo>::new();

    // Function pointer.
    let mut plain = server.request(plain_callback);

    // Closure with a captured cookie.
    let closure_total = Arc::new(AtomicU32::new(0));
    let sink = Arc::clone(&closure_total);
    let cookie = 100;
    let mut closure = server.request(move |event: &Foo| {
        sink.fetch_add(event.0 + cookie, Ordering::SeqCst);
    });

    // Listener object carrying its own state.
    let client = Arc::new(Client {
        cookie: 1000,
        total: AtomicU32::new(0),
    });
    let mut listener = server.request_listener(Arc::clone(&client) as _);

    server.trigger(&Foo(5));

    assert_eq!(PLAIN_HITS.load(Ordering::SeqCst), 1);
    assert_eq!(closure_total.load(Ordering::SeqCst), 105);
    assert_eq!(client.total.load(Ordering::SeqCst), 1005);

    plain.cancel();
    closure.cancel();
    listener.cancel();
}

#[test]
fn test_listener_with_busy_interface() {
    struct Recorder {
        events: Mutex<Vec<u32>>,
    }
    impl EventListener<Foo> for Recorder {
        fn on_event(&self, event: &Foo) {
            self.events.lock().expect("recorder poisoned").push(event.0);
        }
    }

    let server = Server::<Foo>::new();
    let busy = Arc::new(BusyInterface::new());
    let recorder = Arc::new(Recorder {
        events: Mutex::new(Vec::new()),
    });

    let mut handle = server.request_listener_with_busy(Arc::clone(&recorder) as _, &busy);

    server.trigger(&Foo(8)); // idle interface: direct delivery
    busy.set_busy();
    server.trigger(&Foo(9)); // parked
    busy.unset_busy();

    assert_eq!(*recorder.events.lock().expect("recorder poisoned"), vec![8, 9]);
    handle.cancel();
}
