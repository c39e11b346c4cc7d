//! Round-robin selection: cyclic order, fairness, concurrency, counter wraparound.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use restwire_core::{EndpointProvider, RoundRobinEndpointProvider, WiringError};

fn addresses(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("http://node-{i}")).collect()
}

fn index_of(addrs: &[String], endpoint: &str) -> usize {
    addrs.iter().position(|a| a == endpoint).unwrap()
}

#[test]
fn walks_cyclically_starting_at_index_one() {
    for n in 1..=6 {
        let addrs = addresses(n);
        let rr = RoundRobinEndpointProvider::new(addrs.clone()).unwrap();
        for k in 0..(3 * n) {
            let got = index_of(&addrs, &rr.next());
            assert_eq!(got, (k + 1) % n, "n={n} k={k}");
        }
    }
}

#[test]
fn every_address_gets_its_share() {
    let n = 4;
    let k = 4 * 25 + 3;
    let addrs = addresses(n);
    let rr = RoundRobinEndpointProvider::new(addrs.clone()).unwrap();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..k {
        *counts.entry(rr.next()).or_default() += 1;
    }
    assert_eq!(counts.len(), n);
    assert!(counts.values().all(|&c| c >= k / n));
    assert_eq!(counts.values().sum::<usize>(), k);
}

#[test]
fn concurrent_callers_never_lose_an_increment() {
    let n = 5;
    let threads = 8;
    let per_thread = 10_000;
    let addrs = addresses(n);
    let rr = Arc::new(RoundRobinEndpointProvider::new(addrs.clone()).unwrap());

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let rr = Arc::clone(&rr);
            let addrs = addrs.clone();
            thread::spawn(move || {
                let mut counts = vec![0usize; addrs.len()];
                for _ in 0..per_thread {
                    counts[index_of(&addrs, &rr.next())] += 1;
                }
                counts
            })
        })
        .collect();

    let mut totals = vec![0usize; n];
    for handle in handles {
        for (i, c) in handle.join().unwrap().into_iter().enumerate() {
            totals[i] += c;
        }
    }
    let k = threads * per_thread;
    assert_eq!(totals.iter().sum::<usize>(), k);
    // Every increment is observed exactly once, so the split is as even as a serial walk.
    assert!(totals.iter().all(|&c| c == k / n));
}

#[test]
fn counter_wraps_at_the_numeric_limit() {
    let rr = RoundRobinEndpointProvider::starting_at(["a", "b", "c"], usize::MAX - 1).unwrap();
    let seen: Vec<String> = (0..4).map(|_| rr.next()).collect();
    // usize::MAX % 3 == 0, then the counter wraps to 0 and resumes at index 1.
    assert_eq!(seen, ["a", "a", "b", "c"]);
}

#[test]
fn empty_endpoint_set_is_a_configuration_error() {
    let err = RoundRobinEndpointProvider::new(Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, WiringError::Configuration(_)));
}
