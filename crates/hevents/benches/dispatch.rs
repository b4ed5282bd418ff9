// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatch-path benchmarks: direct delivery, busy-interface delivery and
//! the register/cancel cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hevents::{BusyInterface, EventType, Server};

#[derive(Clone)]
struct Tick(u64);
impl EventType for Tick {}

/// Benchmark: trigger with one direct subscriber (no busy interface).
fn bench_trigger_direct(c: &mut Criterion) {
    c.bench_function("trigger_direct_1_subscriber", |b| {
        let server = Server::<Tick>::new();
        let sink = Arc::new(AtomicU64::new(0));
        let total = Arc::clone(&sink);
        let mut handle = server.request(move |event: &Tick| {
            total.fetch_add(event.0, Ordering::Relaxed);
        });

        b.iter(|| server.trigger(black_box(&Tick(1))));

        handle.cancel();
    });
}

/// Benchmark: trigger fan-out to eight direct subscribers.
fn bench_trigger_fan_out(c: &mut Criterion) {
    c.bench_function("trigger_direct_8_subscribers", |b| {
        let server = Server::<Tick>::new();
        let sink = Arc::new(AtomicU64::new(0));
        let mut handles: Vec<_> = (0..8)
            .map(|_| {
                let total = Arc::clone(&sink);
                server.request(move |event: &Tick| {
                    total.fetch_add(event.0, Ordering::Relaxed);
                })
            })
            .collect();

        b.iter(|| server.trigger(black_box(&Tick(1))));

        for handle in &mut handles {
            handle.cancel();
        }
    });
}

/// Benchmark: trigger through an idle busy interface (acquire + drain,
/// no queueing).
fn bench_trigger_busy_uncontended(c: &mut Criterion) {
    c.bench_function("trigger_busy_uncontended", |b| {
        let server = Server::<Tick>::new();
        let busy = Arc::new(BusyInterface::new());
        let sink = Arc::new(AtomicU64::new(0));
        let total = Arc::clone(&sink);
        let mut handle = server.request_with_busy(
            move |event: &Tick| {
                total.fetch_add(event.0, Ordering::Relaxed);
            },
            &busy,
        );

        b.iter(|| server.trigger(black_box(&Tick(1))));

        handle.cancel();
    });
}

/// Benchmark: queue one delivery behind a busy section and drain it
/// (exercises the delivery-node pool reuse path).
fn bench_trigger_busy_queued(c: &mut Criterion) {
    c.bench_function("trigger_busy_queued_drain", |b| {
        let server = Server::<Tick>::new();
        let busy = Arc::new(BusyInterface::new());
        let sink = Arc::new(AtomicU64::new(0));
        let total = Arc::clone(&sink);
        let mut handle = server.request_with_busy(
            move |event: &Tick| {
                total.fetch_add(event.0, Ordering::Relaxed);
            },
            &busy,
        );

        b.iter(|| {
            busy.set_busy();
            server.trigger(black_box(&Tick(1)));
            busy.unset_busy();
        });

        handle.cancel();
    });
}

/// Benchmark: full register + cancel cycle.
fn bench_register_cancel(c: &mut Criterion) {
    c.bench_function("register_cancel_cycle", |b| {
        let server = Server::<Tick>::new();
        b.iter(|| {
            let mut handle = server.request(|_: &Tick| {});
            handle.cancel();
            // Cancelled nodes are reaped by the next walk.
            server.trigger(black_box(&Tick(0)));
        });
    });
}

criterion_group!(
    benches,
    bench_trigger_direct,
    bench_trigger_fan_out,
    bench_trigger_busy_uncontended,
    bench_trigger_busy_queued,
    bench_register_cancel
);
criterion_main!(benches);
