use crate::{
    AtomicSequenceGenerator, CombinerPool, LockSequenceGenerator, SequenceGenerator,
    SequenceSource,
};
use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread::scope;

fn run_sequence_increments_for_single_caller<G>(generator: &G, start: u64)
where
    G: SequenceGenerator,
{
    let s1 = generator.try_next_sequence(0).unwrap();
    let s2 = generator.try_next_sequence(0).unwrap();
    let s3 = generator.try_next_sequence(0).unwrap();

    assert_eq!(s1, start);
    assert_eq!(s2, start + 1);
    assert_eq!(s3, start + 2);
    assert_eq!(generator.try_counter().unwrap(), start + 3);
}

fn run_unique_under_contention<G>(generator: &G, callers: usize)
where
    G: SequenceGenerator + Sync,
{
    const PER_CALLER: usize = 8192;
    let total = callers * PER_CALLER;

    let start = generator.try_counter().unwrap();
    let seen = Mutex::new(HashSet::with_capacity(total));
    let barrier = Barrier::new(callers);

    scope(|s| {
        for caller in 0..callers {
            let (generator, seen, barrier) = (generator, &seen, &barrier);
            s.spawn(move || {
                barrier.wait();
                let mut local = Vec::with_capacity(PER_CALLER);
                let mut last = None;
                for _ in 0..PER_CALLER {
                    let n = generator.try_next_sequence(caller).unwrap();
                    // A single caller always observes increasing numbers.
                    if let Some(prev) = last {
                        assert!(n > prev, "caller {caller} went backwards: {prev} -> {n}");
                    }
                    last = Some(n);
                    local.push(n);
                }
                let mut seen = seen.lock().unwrap();
                for n in local {
                    assert!(seen.insert(n), "duplicate sequence {n}");
                }
            });
        }
    });

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), total, "expected {total} unique sequences");
    let end = generator.try_counter().unwrap();
    assert_eq!(end - start, total as u64);
    assert!(seen.iter().all(|n| (start..end).contains(n)));
}

#[test]
fn lock_generator_sequence_test() {
    run_sequence_increments_for_single_caller(&LockSequenceGenerator::starting_at(42), 42);
}

#[test]
fn atomic_generator_sequence_test() {
    let source = Arc::new(SequenceSource::starting_at(42));
    run_sequence_increments_for_single_caller(&AtomicSequenceGenerator::with_source(source), 42);
}

#[test]
fn combiner_pool_sequence_test() {
    let source = Arc::new(SequenceSource::starting_at(42));
    run_sequence_increments_for_single_caller(&CombinerPool::with_source(4, 4, source), 42);
}

#[test]
fn lock_generator_threaded_unique() {
    run_unique_under_contention(&LockSequenceGenerator::new(), 8);
}

#[test]
fn atomic_generator_threaded_unique() {
    run_unique_under_contention(&AtomicSequenceGenerator::new(), 8);
}

#[test]
fn combiner_pool_threaded_unique() {
    for group_size in [1, 2, 4, 8] {
        run_unique_under_contention(&CombinerPool::new(8, group_size), 8);
    }
}

#[test]
fn single_slot_groups_match_atomic_baseline() {
    let pool = CombinerPool::new(4, 1);
    let baseline = AtomicSequenceGenerator::new();

    for i in 0..256 {
        let caller = i % 4;
        assert_eq!(
            pool.try_next_sequence(caller).unwrap(),
            baseline.try_next_sequence(caller).unwrap()
        );
    }

    let stats = pool.stats().unwrap();
    assert_eq!(stats.rounds, 256);
    assert_eq!(stats.served, 0);
    assert!((stats.mean_batch_size() - 1.0).abs() < f64::EPSILON);
    assert_eq!(pool.try_counter().unwrap(), baseline.try_counter().unwrap());
}

#[test]
fn generators_share_a_source() {
    let source = Arc::new(SequenceSource::new());
    let atomic = AtomicSequenceGenerator::with_source(Arc::clone(&source));
    let pool = CombinerPool::with_source(2, 2, Arc::clone(&source));

    let mut seen = HashSet::new();
    for i in 0..64 {
        assert!(seen.insert(atomic.try_next_sequence(0).unwrap()));
        assert!(seen.insert(pool.try_next_sequence(i % 2).unwrap()));
    }
    assert_eq!(source.current(), 128);
}

#[cfg(feature = "parking-lot")]
#[test]
fn infallible_next_sequence() {
    let pool = CombinerPool::new(2, 2);
    assert_eq!(pool.next_sequence(0), 0);
    assert_eq!(pool.next_sequence(1), 1);

    let lock = LockSequenceGenerator::new();
    assert_eq!(lock.next_sequence(0), 0);

    let atomic = AtomicSequenceGenerator::new();
    assert_eq!(atomic.next_sequence(0), 0);
}

#[cfg(not(feature = "parking-lot"))]
#[test]
fn poisoned_lock_is_reported() {
    let generator = LockSequenceGenerator::new();

    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = generator.state.lock().unwrap();
        panic!("poison the lock");
    }));

    assert_eq!(generator.try_next(), Err(crate::Error::LockPoisoned));
    assert_eq!(generator.try_counter(), Err(crate::Error::LockPoisoned));
}
