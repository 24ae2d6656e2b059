use std::sync::{Arc, Barrier};
use std::thread;

use mountspec::{SpecRef, SpecRegistry};

mod support;

const THREADS: usize = 8;
const ROUNDS: usize = 500;

#[test]
fn concurrent_canonicalization_converges() {
    let registry = SpecRegistry::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let spec = support::ftp("race.example.com");
                barrier.wait();
                registry.canonical_for(spec)
            })
        })
        .collect();

    let results: Vec<SpecRef> =
        handles.into_iter().map(|handle| handle.join().expect("thread panicked")).collect();

    for result in &results {
        assert!(result.is_canonical());
        assert!(SpecRef::ptr_eq(result, &results[0]));
    }
    assert_eq!(results[0].ref_count(), THREADS);
    assert_eq!(registry.len(), 1);

    drop(results);
    assert!(registry.is_empty());
}

#[test]
fn churn_never_yields_two_instances() {
    let registry = SpecRegistry::new();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    let host =
                        if (i + round) % 2 == 0 { "even.example.com" } else { "odd.example.com" };
                    let first = registry.canonical_for(support::ftp(host));
                    let second = registry.canonical_for(support::ftp(host));
                    assert!(SpecRef::ptr_eq(&first, &second));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }
    assert!(registry.is_empty());
}

#[test]
fn held_instance_stays_representative() {
    let registry = SpecRegistry::new();
    let anchor = registry.canonical_for(support::smb_share("anchor", "/"));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let anchor = anchor.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let spec = registry.canonical_for(support::smb_share("anchor", "/"));
                    assert!(SpecRef::ptr_eq(&spec, &anchor));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }
    assert_eq!(anchor.ref_count(), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn global_registry_is_shared() {
    let a = support::smb_share("global-registry-test", "/").into_canonical();
    let b = SpecRegistry::global().canonical_for(support::smb_share("global-registry-test", "/"));
    assert!(SpecRef::ptr_eq(&a, &b));

    let shared = SpecRef::new(support::smb_share("global-registry-test", "/"));
    assert!(SpecRef::ptr_eq(&shared.canonical(), &a));
}
