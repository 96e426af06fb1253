#![allow(missing_docs)]

mod common;

use common::{Counter, TestConfig, init_tracing, resolver};
use dmg::{
    error::{PreloadError, ResolveError},
    method::Source,
    registry::Registry,
};
use std::{
    sync::{Arc, Barrier, mpsc},
    thread,
    time::Duration,
};

const THREADS: usize = 8;

#[test]
fn concurrent_callers_share_one_evaluation() {
    init_tracing();
    let counter = Counter::default();
    let mut registry = Registry::<TestConfig>::new();
    registry.register("slow", |m| {
        m.source(counter.slow_source("S", Duration::from_millis(50)))
    });
    let resolver = Arc::new(resolver(registry));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let resolver = resolver.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                resolver.call("slow").unwrap()
            })
        })
        .collect();
    let values: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(counter.get(), 1);
    assert_eq!(values.len(), THREADS);
    assert!(values.iter().all(|value| value.as_deref() == Some("S")));
}

#[test]
fn shared_dependency_resolves_once_across_threads() {
    //   left   right
    //      \   /
    //      both
    // `both` is reached from two threads through different parents and still
    // runs once.
    let both = Counter::default();
    let mut registry = Registry::<TestConfig>::new();
    registry
        .register("both", |m| {
            m.source(both.slow_source("B", Duration::from_millis(30)))
        })
        .register("left", |m| m.source_from("both"))
        .register("right", |m| m.source_from("both"));
    let resolver = Arc::new(resolver(registry));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|name| {
            let resolver = resolver.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                resolver.call(name).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("B"));
    }
    assert_eq!(both.get(), 1);
}

#[test]
fn preload_populates_every_cache_slot_once() {
    init_tracing();
    let counters: Vec<_> = (0..6).map(|_| Counter::default()).collect();
    let names = ["a", "b", "c", "d", "e", "f"];
    let mut registry = Registry::<TestConfig>::new();
    for (name, counter) in names.iter().zip(&counters) {
        registry.register(*name, |m| {
            m.source(counter.slow_source("v", Duration::from_millis(5)))
        });
    }
    let resolver = resolver(registry);

    resolver.preload(names, 3).unwrap();

    for (name, counter) in names.iter().zip(&counters) {
        assert_eq!(counter.get(), 1, "{name} evaluated once");
        assert_eq!(resolver.cached(name).as_deref(), Some("v"));
    }
    // Later synchronous calls are served from the cache.
    resolver.call("a").unwrap();
    assert_eq!(counters[0].get(), 1);
}

#[test]
fn preload_runs_once_per_resolver() {
    let counter = Counter::default();
    let mut registry = Registry::<TestConfig>::new();
    registry.register("m", |m| m.source(counter.source("v")));
    let resolver = resolver(registry);

    resolver.preload(["m"], 2).unwrap();
    resolver.clear_cache();
    resolver.preload(["m"], 2).unwrap();

    assert_eq!(counter.get(), 1);
    assert_eq!(resolver.cached("m"), None);
}

#[test]
fn preload_while_another_is_running_returns_immediately() {
    let counter = Counter::default();
    let started = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let mut registry = Registry::<TestConfig>::new();
    registry
        .register("held", |m| {
            let (started, release) = (started.clone(), release.clone());
            m.source(Source::expr(move |r| {
                started.wait();
                release.wait();
                r.call("value")
            }))
        })
        .register("value", |m| m.source(counter.source("v")));
    let resolver = resolver(registry);

    let (second, first_running, evaluated_meanwhile) = thread::scope(|s| {
        let first = s.spawn(|| resolver.preload(["held"], 1));
        started.wait();

        let second = resolver.preload(["held", "value"], 2);
        let first_running = !first.is_finished();
        let evaluated_meanwhile = counter.get();

        release.wait();
        first.join().unwrap().unwrap();
        (second, first_running, evaluated_meanwhile)
    });

    assert!(second.is_ok());
    assert!(first_running);
    assert_eq!(evaluated_meanwhile, 0);
    assert_eq!(counter.get(), 1);
    assert_eq!(resolver.cached("held").as_deref(), Some("v"));
}

#[test]
fn preload_without_workers_is_a_no_op() {
    let counter = Counter::default();
    let mut registry = Registry::<TestConfig>::new();
    registry.register("m", |m| m.source(counter.source("v")));
    let resolver = resolver(registry);

    resolver.preload(["m"], 0).unwrap();
    assert_eq!(counter.get(), 0);
    assert_eq!(resolver.cached("m"), None);

    // A no-op preload does not use up the resolver's single preload.
    resolver.preload(["m"], 1).unwrap();
    assert_eq!(counter.get(), 1);
}

#[test]
fn preload_reports_first_failure_after_draining_the_queue() {
    let ok = Counter::default();
    let failing = Counter::default();
    let mut registry = Registry::<TestConfig>::new();
    registry
        .register("boom", |m| m.source(failing.failing_source()))
        .register("fine", |m| m.source(ok.source("v")));
    let resolver = resolver(registry);

    let err = resolver.preload(["boom", "fine"], 1).unwrap_err();

    assert!(matches!(
        err,
        PreloadError::Resolve { ref method, source: ResolveError::Source(_) } if method == "boom"
    ));
    assert_eq!(failing.get(), 1);
    assert_eq!(ok.get(), 1);
    assert_eq!(resolver.cached("fine").as_deref(), Some("v"));
}

#[test]
fn preload_of_unknown_method_fails() {
    let resolver = resolver(Registry::<TestConfig>::new());
    let err = resolver.preload(["ghost"], 2).unwrap_err();
    assert!(matches!(
        err,
        PreloadError::Resolve { source: ResolveError::UnknownMethod { .. }, .. }
    ));
}

#[test]
fn preload_of_a_cycle_split_across_workers_terminates() {
    //   x -> y -> x
    // Each worker takes one side of the cycle, then asks for the other.
    init_tracing();
    let mut registry = Registry::<TestConfig>::new();
    for (name, next) in [("x", "y"), ("y", "x")] {
        registry.register(name, |m| {
            m.source(Source::expr(move |r| {
                thread::sleep(Duration::from_millis(20));
                r.call(next)
            }))
        });
    }
    let resolver = Arc::new(resolver(registry));

    let (tx, rx) = mpsc::channel();
    let worker = {
        let resolver = resolver.clone();
        thread::spawn(move || tx.send(resolver.preload(["x", "y"], 2)).unwrap())
    };
    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("preload returned");
    worker.join().unwrap();

    assert!(matches!(
        result,
        Err(PreloadError::Resolve { source: ResolveError::Cycle { .. }, .. })
    ));
    assert_eq!(resolver.cached("x"), None);
    assert_eq!(resolver.cached("y"), None);
}
