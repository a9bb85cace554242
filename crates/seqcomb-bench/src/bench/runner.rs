use std::{
    sync::{Arc, Barrier},
    thread,
    time::{Duration, Instant},
};

use seqcomb::{
    AtomicSequenceGenerator, CombinerPool, CombinerStats, LockSequenceGenerator,
    SequenceGenerator, SequenceSource,
};
use tracing::{error, info, info_span};

use crate::bench::{
    config::{BenchConfig, Strategy},
    report,
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("worker {worker} failed to obtain a sequence number")]
    Generator {
        worker: usize,
        #[source]
        source: seqcomb::Error,
    },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("failed to read generator state")]
    State(#[source] seqcomb::Error),

    #[error("{strategy}: counter advanced by {actual}, expected {expected}")]
    CounterMismatch {
        strategy: Strategy,
        expected: u64,
        actual: u64,
    },

    #[error("{strategy}: checksum {actual}, expected {expected}")]
    ChecksumMismatch {
        strategy: Strategy,
        expected: u64,
        actual: u64,
    },
}

/// The outcome of one timed run.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub strategy: Strategy,
    pub threads: usize,
    pub operations: u64,
    pub elapsed: Duration,
    /// Wrapping sum of every sequence number handed out.
    pub checksum: u64,
    pub final_counter: u64,
    pub combiner: Option<CombinerStats>,
}

impl Measurement {
    pub fn throughput(&self) -> f64 {
        report::throughput(self.operations, self.elapsed)
    }
}

/// Runs `strategy` once with a fresh generator and verifies what it handed
/// out.
pub fn run(strategy: Strategy, config: &BenchConfig) -> Result<Measurement, RunError> {
    let span = info_span!("run", %strategy, threads = config.threads);
    let _enter = span.enter();

    info!(count = config.count, "starting");

    let measurement = match strategy {
        Strategy::Lock => {
            let generator = LockSequenceGenerator::starting_at(config.start);
            measure(strategy, &generator, config)?
        }
        Strategy::Atomic => {
            let source = Arc::new(SequenceSource::starting_at(config.start));
            let generator = AtomicSequenceGenerator::with_source(source);
            measure(strategy, &generator, config)?
        }
        Strategy::Combiner => {
            let source = Arc::new(SequenceSource::starting_at(config.start));
            let pool =
                CombinerPool::with_policy(config.threads, config.group_size, source, config.policy);
            let mut measurement = measure(strategy, &pool, config)?;
            let stats = pool
                .stats()
                .map_err(|e| RunError::State(seqcomb::Error::from(e)))?;
            info!(
                rounds = stats.rounds,
                served = stats.served,
                empty_batches = stats.empty_batches,
                stalls = stats.stalls,
                mean_batch = stats.mean_batch_size(),
                "combiner stats"
            );
            measurement.combiner = Some(stats);
            measurement
        }
    };

    verify(&measurement, config.start)?;

    info!(
        elapsed_ms = measurement.elapsed.as_millis() as u64,
        ops_per_sec = measurement.throughput(),
        "finished"
    );

    Ok(measurement)
}

fn measure<G>(strategy: Strategy, generator: &G, config: &BenchConfig) -> Result<Measurement, RunError>
where
    G: SequenceGenerator + Sync,
    G::Err: Into<seqcomb::Error>,
{
    let count = config.count;
    let barrier = Barrier::new(config.threads + 1);

    let (elapsed, sums) = thread::scope(|s| {
        let handles: Vec<_> = (0..config.threads)
            .map(|worker| {
                let barrier = &barrier;
                s.spawn(move || -> Result<u64, RunError> {
                    barrier.wait();
                    let mut sum = 0u64;
                    for _ in 0..count {
                        let sequence = generator
                            .try_next_sequence(worker)
                            .map_err(|e| RunError::Generator {
                                worker,
                                source: e.into(),
                            })?;
                        sum = sum.wrapping_add(sequence);
                    }
                    Ok(sum)
                })
            })
            .collect();

        barrier.wait();
        let start = Instant::now();

        let sums: Vec<_> = handles
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| {
                handle
                    .join()
                    .unwrap_or(Err(RunError::WorkerPanicked { worker }))
            })
            .collect();

        (start.elapsed(), sums)
    });

    let mut checksum = 0u64;
    for sum in sums {
        checksum = checksum.wrapping_add(sum?);
    }

    let final_counter = generator
        .try_counter()
        .map_err(|e| RunError::State(e.into()))?;

    Ok(Measurement {
        strategy,
        threads: config.threads,
        operations: config.total_operations,
        elapsed,
        checksum,
        final_counter,
        combiner: None,
    })
}

/// Sum of `start..start + n` modulo 2^64.
pub fn expected_checksum(start: u64, n: u64) -> u64 {
    let (start, n) = (u128::from(start), u128::from(n));
    let triangle = n * n.saturating_sub(1) / 2;
    n.wrapping_mul(start).wrapping_add(triangle) as u64
}

fn verify(measurement: &Measurement, start: u64) -> Result<(), RunError> {
    let strategy = measurement.strategy;
    let issued = measurement.final_counter.wrapping_sub(start);
    if issued != measurement.operations {
        error!(
            expected = measurement.operations,
            actual = issued,
            "counter does not match the number of operations"
        );
        return Err(RunError::CounterMismatch {
            strategy,
            expected: measurement.operations,
            actual: issued,
        });
    }

    let expected = expected_checksum(start, measurement.operations);
    if measurement.checksum != expected {
        error!(
            expected,
            actual = measurement.checksum,
            "checksum does not match the issued range"
        );
        return Err(RunError::ChecksumMismatch {
            strategy,
            expected,
            actual: measurement.checksum,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqcomb::RetryPolicy;

    fn config(threads: usize, group_size: usize, count: u64, start: u64) -> BenchConfig {
        BenchConfig {
            threads,
            group_size,
            count,
            strategies: vec![Strategy::Lock, Strategy::Atomic, Strategy::Combiner],
            policy: RetryPolicy::Relock,
            start,
            total_operations: threads as u64 * count,
        }
    }

    #[test]
    fn checksum_formula() {
        assert_eq!(expected_checksum(0, 0), 0);
        assert_eq!(expected_checksum(0, 1), 0);
        assert_eq!(expected_checksum(0, 4), 6);
        assert_eq!(expected_checksum(10, 3), 33);
        assert_eq!(expected_checksum(u64::MAX, 2), u64::MAX.wrapping_add(u64::MAX).wrapping_add(1));
    }

    #[test]
    fn every_strategy_passes_integrity_checks() {
        let config = config(4, 2, 2_000, 0);
        for strategy in [Strategy::Lock, Strategy::Atomic, Strategy::Combiner] {
            let measurement = run(strategy, &config).unwrap();
            assert_eq!(measurement.strategy, strategy);
            assert_eq!(measurement.operations, 8_000);
            assert_eq!(measurement.final_counter, 8_000);
            assert_eq!(measurement.checksum, expected_checksum(0, 8_000));
            assert_eq!(measurement.combiner.is_some(), strategy == Strategy::Combiner);
        }
    }

    #[test]
    fn start_offset_shifts_the_range() {
        let config = config(4, 4, 500, 1_000_000);
        for strategy in [Strategy::Lock, Strategy::Atomic, Strategy::Combiner] {
            let measurement = run(strategy, &config).unwrap();
            assert_eq!(measurement.final_counter, 1_002_000);
        }
    }

    #[test]
    fn spin_policy_combiner_run() {
        let mut config = config(8, 4, 1_000, 0);
        config.policy = RetryPolicy::Spin { spins: 4 };
        let measurement = run(Strategy::Combiner, &config).unwrap();
        let stats = measurement.combiner.unwrap();
        assert_eq!(stats.requests, 8_000);
        assert_eq!(stats.rounds + stats.served, 8_000);
    }

    /// A lock-based generator whose lock was poisoned by an earlier holder.
    struct PoisonedGenerator;

    impl SequenceGenerator for PoisonedGenerator {
        type Err = seqcomb::Error;

        fn try_next_sequence(&self, _caller: usize) -> seqcomb::Result<u64, Self::Err> {
            Err(seqcomb::Error::LockPoisoned)
        }

        fn try_counter(&self) -> seqcomb::Result<u64, Self::Err> {
            Err(seqcomb::Error::LockPoisoned)
        }
    }

    struct PanickingGenerator;

    impl SequenceGenerator for PanickingGenerator {
        type Err = core::convert::Infallible;

        fn try_next_sequence(&self, caller: usize) -> seqcomb::Result<u64, Self::Err> {
            panic!("caller {caller} gave up");
        }

        fn try_counter(&self) -> seqcomb::Result<u64, Self::Err> {
            Ok(0)
        }
    }

    #[test]
    fn generator_errors_fail_the_run() {
        let config = config(1, 1, 10, 0);
        let err = measure(Strategy::Lock, &PoisonedGenerator, &config).unwrap_err();
        assert!(
            matches!(
                err,
                RunError::Generator {
                    worker: 0,
                    source: seqcomb::Error::LockPoisoned,
                }
            ),
            "{err:?}"
        );
    }

    #[test]
    fn panicking_worker_fails_the_run() {
        let config = config(1, 1, 10, 0);
        let err = measure(Strategy::Atomic, &PanickingGenerator, &config).unwrap_err();
        assert!(matches!(err, RunError::WorkerPanicked { worker: 0 }), "{err:?}");
    }

    #[test]
    fn tampered_measurements_are_rejected() {
        let mut measurement = Measurement {
            strategy: Strategy::Atomic,
            threads: 1,
            operations: 4,
            elapsed: Duration::from_millis(1),
            checksum: 6,
            final_counter: 4,
            combiner: None,
        };
        assert!(verify(&measurement, 0).is_ok());

        measurement.checksum = 7;
        assert!(matches!(
            verify(&measurement, 0),
            Err(RunError::ChecksumMismatch { expected: 6, actual: 7, .. })
        ));

        measurement.final_counter = 5;
        assert!(matches!(
            verify(&measurement, 0),
            Err(RunError::CounterMismatch { expected: 4, actual: 5, .. })
        ));
    }
}
