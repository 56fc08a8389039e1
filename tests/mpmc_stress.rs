use seqring::MpmcQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn mpmc_stress_preserves_multiset() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const ITEMS_PER_PRODUCER: usize = 1000;

    let queue = Arc::new(MpmcQueue::<usize>::new(1024));
    let mut producers = Vec::new();

    for p in 0..PRODUCERS {
        let queue = queue.clone();
        producers.push(thread::spawn(move || {
            for i in 0..ITEMS_PER_PRODUCER {
                queue.push(p * ITEMS_PER_PRODUCER + i);
            }
        }));
    }

    let mut consumers = Vec::new();
    for _ in 0..CONSUMERS {
        let queue = queue.clone();
        consumers.push(thread::spawn(move || {
            let mut popped = Vec::with_capacity(ITEMS_PER_PRODUCER);
            for _ in 0..ITEMS_PER_PRODUCER {
                popped.push(queue.pop());
            }
            popped
        }));
    }

    for producer in producers {
        producer.join().unwrap();
    }

    let mut all = Vec::new();
    for consumer in consumers {
        all.extend(consumer.join().unwrap());
    }

    // every pushed value came out exactly once
    assert_eq!(PRODUCERS * ITEMS_PER_PRODUCER, all.len());
    all.sort_unstable();
    assert!(all.iter().copied().eq(0..PRODUCERS * ITEMS_PER_PRODUCER));
}

#[test]
fn spsc_reduction_preserves_order() {
    const ITEMS: u64 = 10_000;

    let queue = Arc::new(MpmcQueue::<u64>::new(128));

    let producer = {
        let queue = queue.clone();
        thread::spawn(move || {
            for i in 0..ITEMS {
                queue.push(i);
            }
        })
    };

    let consumer = {
        let queue = queue.clone();
        thread::spawn(move || {
            for i in 0..ITEMS {
                assert_eq!(i, queue.pop());
            }
        })
    };

    producer.join().unwrap();
    consumer.join().unwrap();
}

#[test]
fn try_variants_make_progress_under_contention() {
    const PRODUCERS: usize = 2;
    const CONSUMERS: usize = 2;
    const ITEMS_PER_PRODUCER: usize = 5000;
    const TOTAL: usize = PRODUCERS * ITEMS_PER_PRODUCER;

    let queue = Arc::new(MpmcQueue::<usize>::new(64));
    let consumed = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();

    for p in 0..PRODUCERS {
        let queue = queue.clone();
        handles.push(thread::spawn(move || {
            for i in 0..ITEMS_PER_PRODUCER {
                let mut value = p * ITEMS_PER_PRODUCER + i;
                loop {
                    match queue.try_push(value) {
                        Ok(()) => break,
                        Err(full) => {
                            value = full.into_inner();
                            std::hint::spin_loop();
                        }
                    }
                }
            }
        }));
    }

    for _ in 0..CONSUMERS {
        let queue = queue.clone();
        let consumed = consumed.clone();
        handles.push(thread::spawn(move || loop {
            if queue.try_pop().is_ok() {
                consumed.fetch_add(1, Ordering::Relaxed);
            } else if consumed.load(Ordering::Relaxed) >= TOTAL {
                break;
            } else {
                std::hint::spin_loop();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(TOTAL, consumed.load(Ordering::Relaxed));
}

#[test]
fn drops_are_balanced_under_stress() {
    const PRODUCERS: usize = 4;
    const ITEMS_PER_PRODUCER: usize = 500;

    struct Counted(Arc<AtomicUsize>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));

    {
        let queue = Arc::new(MpmcQueue::<Counted>::new(256));
        let mut handles = Vec::new();

        for _ in 0..PRODUCERS {
            let queue = queue.clone();
            let drops = drops.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..ITEMS_PER_PRODUCER {
                    queue.push(Counted(drops.clone()));
                }
            }));
        }

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || {
                // leave a ring's worth of residue to queue teardown; the
                // producers still fit it without blocking forever
                for _ in 0..PRODUCERS * ITEMS_PER_PRODUCER - 128 {
                    let _ = queue.pop();
                }
            })
        };

        for handle in handles {
            handle.join().unwrap();
        }
        consumer.join().unwrap();
    }

    assert_eq!(
        PRODUCERS * ITEMS_PER_PRODUCER,
        drops.load(Ordering::Relaxed)
    );
}
