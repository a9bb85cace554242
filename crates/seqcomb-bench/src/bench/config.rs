use core::fmt;

use anyhow::{anyhow, bail};
use clap::{Parser, ValueEnum};
use seqcomb::RetryPolicy;

/// A sequence generation strategy under test.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One mutex around a plain counter.
    Lock,
    /// One shared fetch-and-add.
    Atomic,
    /// Fixed-size combining groups over one shared counter.
    Combiner,
}

impl Strategy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lock => "Lock",
            Self::Atomic => "Atomic",
            Self::Combiner => "Combiner",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a combiner waits out an empty batch.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// Release the lock and start the round over.
    Relock,
    /// Re-read the pending count while holding the lock.
    Spin,
}

/// Runtime configuration for the `seqcomb-bench` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is honored), with defaults matching a 16-thread machine split
/// into groups of four.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "seqcomb-bench",
    version,
    about = "Compare lock, atomic and combining sequence generators under contention"
)]
pub struct CliArgs {
    /// Number of worker threads, one caller each.
    ///
    /// Environment variable: `NUM_THREADS`
    #[arg(long, env = "NUM_THREADS", default_value_t = 16)]
    pub threads: usize,

    /// Callers per combining group. Must evenly divide `threads`.
    ///
    /// Environment variable: `GROUP_SIZE`
    #[arg(long, env = "GROUP_SIZE", default_value_t = 4)]
    pub group_size: usize,

    /// Sequence numbers each worker requests.
    ///
    /// Environment variable: `COUNT_PER_THREAD`
    #[arg(long, env = "COUNT_PER_THREAD", default_value_t = 1_000_000)]
    pub count: u64,

    /// Strategies to run, in order (comma separated).
    ///
    /// Environment variable: `STRATEGIES`
    #[arg(
        long,
        env = "STRATEGIES",
        value_enum,
        value_delimiter = ',',
        default_values_t = [Strategy::Lock, Strategy::Atomic, Strategy::Combiner]
    )]
    pub strategies: Vec<Strategy>,

    /// What a combiner does when it drains an empty batch.
    ///
    /// Environment variable: `RETRY_POLICY`
    #[arg(long, env = "RETRY_POLICY", value_enum, default_value_t = RetryKind::Relock)]
    pub retry: RetryKind,

    /// Re-reads under the lock before relocking, for `--retry spin`.
    ///
    /// Environment variable: `RETRY_SPINS`
    #[arg(long, env = "RETRY_SPINS", default_value_t = 64)]
    pub spins: u32,

    /// First sequence number handed out by every strategy.
    ///
    /// Environment variable: `START_AT`
    #[arg(long, env = "START_AT", default_value_t = 0)]
    pub start: u64,
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub threads: usize,
    pub group_size: usize,
    pub count: u64,
    pub strategies: Vec<Strategy>,
    pub policy: RetryPolicy,
    pub start: u64,
    pub total_operations: u64,
}

impl TryFrom<CliArgs> for BenchConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.threads == 0 {
            bail!("NUM_THREADS must be greater than 0");
        }

        if args.group_size == 0 {
            bail!("GROUP_SIZE must be greater than 0");
        }

        if args.threads % args.group_size != 0 {
            bail!(
                "GROUP_SIZE ({}) must evenly divide NUM_THREADS ({})",
                args.group_size,
                args.threads
            );
        }

        if args.count == 0 {
            bail!("COUNT_PER_THREAD must be greater than 0");
        }

        let total_operations = u64::try_from(args.threads)
            .ok()
            .and_then(|threads| threads.checked_mul(args.count))
            .ok_or_else(|| anyhow!("Overflow in total operation count"))?;

        let mut strategies = Vec::with_capacity(args.strategies.len());
        for strategy in args.strategies {
            if !strategies.contains(&strategy) {
                strategies.push(strategy);
            }
        }
        if strategies.is_empty() {
            bail!("STRATEGIES must name at least one strategy");
        }

        let policy = match args.retry {
            RetryKind::Relock => RetryPolicy::Relock,
            RetryKind::Spin => RetryPolicy::Spin { spins: args.spins },
        };

        Ok(Self {
            threads: args.threads,
            group_size: args.group_size,
            count: args.count,
            strategies,
            policy,
            start: args.start,
            total_operations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<BenchConfig> {
        let argv = core::iter::once("seqcomb-bench").chain(args.iter().copied());
        let args = CliArgs::try_parse_from(argv)?;
        BenchConfig::try_from(args)
    }

    #[test]
    fn explicit_arguments_are_validated() {
        let config = parse(&[
            "--threads",
            "8",
            "--group-size",
            "2",
            "--count",
            "1000",
            "--strategies",
            "combiner,atomic",
            "--start",
            "5",
        ])
        .unwrap();

        assert_eq!(config.threads, 8);
        assert_eq!(config.group_size, 2);
        assert_eq!(config.count, 1000);
        assert_eq!(config.strategies, vec![Strategy::Combiner, Strategy::Atomic]);
        assert_eq!(config.policy, RetryPolicy::Relock);
        assert_eq!(config.start, 5);
        assert_eq!(config.total_operations, 8000);
    }

    #[test]
    fn spin_policy_carries_its_budget() {
        let config = parse(&["--threads", "4", "--retry", "spin", "--spins", "7"]).unwrap();
        assert_eq!(config.policy, RetryPolicy::Spin { spins: 7 });
    }

    #[test]
    fn duplicate_strategies_run_once() {
        let config = parse(&["--threads", "4", "--strategies", "lock,lock,combiner,lock"]).unwrap();
        assert_eq!(config.strategies, vec![Strategy::Lock, Strategy::Combiner]);
    }

    #[test]
    fn group_size_must_divide_threads() {
        let err = parse(&["--threads", "10", "--group-size", "4"]).unwrap_err();
        assert!(err.to_string().contains("evenly divide"), "{err}");
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(parse(&["--threads", "0"]).is_err());
        assert!(parse(&["--threads", "4", "--group-size", "0"]).is_err());
        assert!(parse(&["--threads", "4", "--count", "0"]).is_err());
    }

    #[test]
    fn total_operations_must_fit() {
        let err = parse(&["--threads", "4", "--count", &u64::MAX.to_string()]).unwrap_err();
        assert!(err.to_string().contains("Overflow"), "{err}");
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        assert!(parse(&["--threads", "4", "--strategies", "mutex"]).is_err());
    }
}
