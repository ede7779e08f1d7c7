use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rotating_proxy_pool::{ProxyPool, ProxyPoolConfig};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn records(prefix: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("{}.0.0.{}:8080:user{}:pass{}", prefix, i + 1, i, i))
        .collect()
}

fn sorted(mut proxies: Vec<String>) -> Vec<String> {
    proxies.sort();
    proxies
}

#[test]
fn stress_assign_and_next_keeps_pool_consistent() {
    const THREADS: usize = 8;
    const CALLS: usize = 10_000;

    let config = ProxyPoolConfig::builder().seed(99).build();
    let pool = Arc::new(ProxyPool::from_records(records("10", 12), &config));
    let original = sorted(pool.get_proxies());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(t as u64);
                let mut held: Vec<String> = Vec::new();
                for _ in 0..CALLS {
                    if held.len() < 3 && (held.is_empty() || rng.random_bool(0.5)) {
                        held.push(pool.assign_proxy().unwrap());
                    } else {
                        let i = rng.random_range(0..held.len());
                        let next = pool.next_proxy(&held[i]).unwrap();
                        assert_ne!(next, held[i]);
                        held[i] = next;
                    }
                }
                for proxy in held {
                    pool.release(&proxy);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(sorted(pool.get_proxies()), original);
    assert_eq!(pool.get_stats(), (12, 0));
}

#[test]
fn concurrent_assign_hands_out_each_proxy_once_before_saturation() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 8;

    let config = ProxyPoolConfig::builder().seed(5).build();
    let pool = Arc::new(ProxyPool::from_records(records("10", THREADS * PER_THREAD), &config));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|_| pool.assign_proxy().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for proxy in handle.join().unwrap() {
            assert!(seen.insert(proxy), "proxy handed out twice");
        }
    }
    assert_eq!(seen.len(), THREADS * PER_THREAD);
    assert_eq!(pool.get_stats(), (THREADS * PER_THREAD, THREADS * PER_THREAD));
}

#[test]
fn allocations_during_reload_see_old_or_new_pool() {
    const THREADS: usize = 4;
    const CALLS: usize = 5_000;

    let old = records("10", 6);
    let new = records("20", 4);

    let config = ProxyPoolConfig::builder().seed(3).build();
    let pool = Arc::new(ProxyPool::from_records(old.clone(), &config));
    let old_set: HashSet<String> = pool.get_proxies().into_iter().collect();
    let new_set: HashSet<String> = ProxyPool::from_records(new.clone(), &config)
        .get_proxies()
        .into_iter()
        .collect();

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(100 + t as u64);
                let mut results = Vec::with_capacity(CALLS);
                let mut current = pool.assign_proxy().unwrap();
                for _ in 0..CALLS {
                    current = match rng.random_range(0..3) {
                        0 => pool.assign_proxy().unwrap(),
                        1 => pool.next_proxy(&current).unwrap(),
                        _ => pool.random_proxy().unwrap(),
                    };
                    results.push(current.clone());
                }
                results
            })
        })
        .collect();

    for i in 0..200 {
        if i % 2 == 0 {
            pool.reload(new.clone());
        } else {
            pool.reload(old.clone());
        }
        let snapshot: HashSet<String> = pool.get_proxies().into_iter().collect();
        assert!(snapshot == old_set || snapshot == new_set);
    }

    for worker in workers {
        for proxy in worker.join().unwrap() {
            assert!(
                old_set.contains(&proxy) || new_set.contains(&proxy),
                "unexpected proxy {proxy}"
            );
        }
    }
}
