/// Consecutive empty batches after which a single request is reported as
/// stalled. The request is reported once, on the batch that reaches the
/// threshold.
///
/// Reaching the threshold is a diagnostic signal only: the request keeps
/// retrying.
pub const STALL_THRESHOLD: u32 = 1 << 16;

/// What a would-be combiner does when it drains the pending count and finds
/// it empty.
///
/// An empty drain means an earlier combiner counted this caller's request but
/// served a peer whose interest flag was already up while its count had not
/// landed yet. That peer's increment is in flight, so the condition clears on
/// its own; the policy only decides where to wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RetryPolicy {
    /// Release the lock, yield, and start the round over.
    ///
    /// The happy path gets re-checked on every attempt, so a caller that was
    /// meanwhile served by another combiner returns immediately. Under heavy
    /// lock traffic the retrying caller may lose the lock repeatedly.
    #[default]
    Relock,
    /// Keep the lock and re-read the pending count up to `spins` times before
    /// falling back to [`RetryPolicy::Relock`].
    ///
    /// The in-flight increment happens outside the lock, so spinning makes
    /// progress, but every spin holds the group's lock.
    Spin {
        /// Re-reads attempted while holding the lock.
        spins: u32,
    },
}

impl RetryPolicy {
    /// Spin policy with a default budget.
    pub const fn spin() -> Self {
        Self::Spin { spins: 64 }
    }

    pub(crate) const fn spins(self) -> u32 {
        match self {
            Self::Relock => 0,
            Self::Spin { spins } => spins,
        }
    }
}
