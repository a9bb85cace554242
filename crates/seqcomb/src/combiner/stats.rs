/// Counters describing how a [`CombinerGroup`] (or a whole [`CombinerPool`])
/// has been serving requests.
///
/// Groups update these under their lock, so a snapshot is consistent for a
/// single group. Pool-wide stats are the merge of per-group snapshots.
///
/// [`CombinerGroup`]: crate::CombinerGroup
/// [`CombinerPool`]: crate::CombinerPool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CombinerStats {
    /// Combining rounds run, i.e. claims on the shared source.
    pub rounds: u64,
    /// Requests completed.
    pub requests: u64,
    /// Requests completed on the happy path (served by a peer).
    pub served: u64,
    /// Drains of the pending count that came back empty.
    pub empty_batches: u64,
    /// Requests that reached [`STALL_THRESHOLD`] consecutive empty batches.
    ///
    /// [`STALL_THRESHOLD`]: crate::STALL_THRESHOLD
    pub stalls: u64,
}

impl CombinerStats {
    /// Average number of requests satisfied per round.
    ///
    /// Returns `0.0` before the first round.
    pub fn mean_batch_size(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.requests as f64 / self.rounds as f64
        }
    }

    /// Adds `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        self.rounds += other.rounds;
        self.requests += other.requests;
        self.served += other.served;
        self.empty_batches += other.empty_batches;
        self.stalls += other.stalls;
    }
}

impl core::iter::Sum for CombinerStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, stats| {
            acc.merge(&stats);
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_batch_size_of_idle_group_is_zero() {
        assert_eq!(CombinerStats::default().mean_batch_size(), 0.0);
    }

    #[test]
    fn sums_per_group_snapshots() {
        let a = CombinerStats {
            rounds: 2,
            requests: 8,
            served: 6,
            empty_batches: 1,
            stalls: 0,
        };
        let b = CombinerStats {
            rounds: 3,
            requests: 4,
            served: 1,
            empty_batches: 0,
            stalls: 1,
        };
        let total: CombinerStats = [a, b].into_iter().sum();
        assert_eq!(total.rounds, 5);
        assert_eq!(total.requests, 12);
        assert_eq!(total.served, 7);
        assert_eq!(total.empty_batches, 1);
        assert_eq!(total.stalls, 1);
        assert!((total.mean_batch_size() - 2.4).abs() < f64::EPSILON);
    }
}
