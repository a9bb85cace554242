use std::sync::Arc;

use portable_atomic::{AtomicBool, AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    CombinerStats, Grant, LockError, Result, RetryPolicy, STALL_THRESHOLD, SequenceSource,
    generator::{Mutex, MutexGuard},
    padded::Padded,
};

/// A fixed-size group of callers that batch their claims on a shared
/// [`SequenceSource`].
///
/// Every caller owns one slot in `0..size()` for its whole lifetime. A request
/// raises the slot's interest flag, bumps the group's pending count, and then
/// takes the group lock. Whoever finds its own flag still raised becomes the
/// combiner for the round: it drains the pending count, claims that many
/// numbers in one fetch-and-add, keeps the first and publishes the rest to the
/// other raised slots. Everyone else finds its flag already cleared and reads
/// its number without touching the shared source.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ One shared-counter update per batch instead of per request
/// - ❌ Delivery order is not request order
/// - ❌ Membership is fixed at construction
///
/// ## Guarantees
/// - Numbers of one round form one contiguous claimed range.
/// - Each round's range lies above every earlier range of the same source.
/// - Every claimed number is handed to exactly one request.
///
/// ## Caller contract
/// A slot is used by exactly one thread and never has two requests in
/// flight. Indexing past `size()` panics; sharing a slot between threads is a
/// logic error with unspecified (but memory-safe) results.
///
/// # Example
/// ```
/// use seqcomb::{CombinerGroup, SequenceSource};
/// use std::sync::Arc;
///
/// let group = CombinerGroup::new(4, Arc::new(SequenceSource::new()));
///
/// let numbers: Vec<u64> = std::thread::scope(|s| {
///     let handles: Vec<_> = (0..4)
///         .map(|slot| {
///             let group = &group;
///             s.spawn(move || group.request(slot))
///         })
///         .collect();
///     handles.into_iter().map(|h| h.join().unwrap()).collect()
/// });
///
/// let mut sorted = numbers.clone();
/// sorted.sort_unstable();
/// assert_eq!(sorted, vec![0, 1, 2, 3]);
/// ```
#[derive(Debug)]
pub struct CombinerGroup {
    interested: Box<[Padded<AtomicBool>]>,
    queued: Padded<AtomicU64>,
    ledger: Padded<Mutex<Ledger>>,
    source: Arc<SequenceSource>,
    policy: RetryPolicy,
}

/// Group state that is only touched while holding the lock.
#[derive(Debug)]
struct Ledger {
    results: Box<[u64]>,
    stats: CombinerStats,
}

impl CombinerGroup {
    /// Creates a group of `size` slots drawing from `source`, using the
    /// default [`RetryPolicy`].
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn new(size: usize, source: Arc<SequenceSource>) -> Self {
        Self::with_policy(size, source, RetryPolicy::default())
    }

    /// Creates a group of `size` slots drawing from `source`.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn with_policy(size: usize, source: Arc<SequenceSource>, policy: RetryPolicy) -> Self {
        assert!(size > 0, "a combiner group needs at least 1 slot");
        Self {
            interested: (0..size)
                .map(|_| Padded::new(AtomicBool::new(false)))
                .collect(),
            queued: Padded::new(AtomicU64::new(0)),
            ledger: Padded::new(Mutex::new(Ledger {
                results: vec![0; size].into_boxed_slice(),
                stats: CombinerStats::default(),
            })),
            source,
            policy,
        }
    }

    /// Number of slots in the group.
    pub fn size(&self) -> usize {
        self.interested.len()
    }

    /// The shared source this group claims from.
    pub fn source(&self) -> &Arc<SequenceSource> {
        &self.source
    }

    /// The policy applied when a drain of the pending count comes back empty.
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns the next sequence number for the caller owning `slot`.
    ///
    /// # Panics
    /// Panics if `slot >= self.size()`. Without `parking-lot`, also panics if
    /// the group lock is poisoned; use [`Self::try_request`] to handle that.
    pub fn request(&self, slot: usize) -> u64 {
        match self.try_request(slot) {
            Ok(sequence) => sequence,
            #[cfg(feature = "parking-lot")]
            Err(e) => match e {},
            #[cfg(not(feature = "parking-lot"))]
            Err(e) => panic!("combiner group lock failed: {e}"),
        }
    }

    /// A fallible version of [`Self::request`].
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if a thread panicked while holding
    ///   the group lock (std mutex only).
    ///
    /// # Panics
    /// Panics if `slot >= self.size()`.
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn try_request(&self, slot: usize) -> Result<u64, LockError> {
        self.try_request_grant(slot).map(|grant| grant.sequence())
    }

    /// Like [`Self::try_request`], but also reports whether the caller ran the
    /// round and which range it claimed.
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if a thread panicked while holding
    ///   the group lock (std mutex only).
    ///
    /// # Panics
    /// Panics if `slot >= self.size()`.
    ///
    /// # Example
    /// ```
    /// use seqcomb::{CombinerGroup, Grant, SequenceSource};
    /// use std::sync::Arc;
    ///
    /// let group = CombinerGroup::new(2, Arc::new(SequenceSource::starting_at(7)));
    ///
    /// // Alone in the group: the caller runs a round of one.
    /// let grant = group.try_request_grant(0).unwrap();
    /// assert_eq!(grant, Grant::Combined { sequence: 7, range: 7..8 });
    /// ```
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_request_grant(&self, slot: usize) -> Result<Grant, LockError> {
        self.announce(slot);
        self.resolve(slot)
    }

    /// Snapshot of the group's counters.
    ///
    /// # Errors
    /// - Returns [`Error::LockPoisoned`] if the group lock is poisoned (std
    ///   mutex only).
    ///
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    pub fn stats(&self) -> Result<CombinerStats, LockError> {
        Ok(self.lock()?.stats)
    }

    /// First phase of a request: make it visible to whoever combines next.
    pub(crate) fn announce(&self, slot: usize) {
        self.raise_interest(slot);
        self.enqueue();
    }

    pub(crate) fn raise_interest(&self, slot: usize) {
        self.interested[slot].store(true, Ordering::Relaxed);
    }

    /// Counts one more outstanding request. Release orders the caller's
    /// earlier flag store before the count, so a combiner that drains this
    /// increment also sees the flag.
    pub(crate) fn enqueue(&self) {
        self.queued.fetch_add(1, Ordering::Release);
    }

    /// Second phase of a request: collect a number published by a peer, or
    /// run the round.
    pub(crate) fn resolve(&self, slot: usize) -> Result<Grant, LockError> {
        let mut empty_batches = 0;
        loop {
            let mut ledger = self.lock()?;

            if !self.interested[slot].load(Ordering::Acquire) {
                ledger.stats.requests += 1;
                ledger.stats.served += 1;
                return Ok(Grant::Served {
                    sequence: ledger.results[slot],
                });
            }

            let batch = self.drain(slot, &mut ledger, &mut empty_batches);
            if batch > 0 {
                return Ok(self.combine(slot, batch, &mut ledger));
            }

            drop(ledger);
            std::thread::yield_now();
        }
    }

    /// Takes the pending count, re-reading it while holding the lock as the
    /// policy allows. Returns zero if every attempt came back empty.
    fn drain(&self, slot: usize, ledger: &mut Ledger, empty_batches: &mut u32) -> u64 {
        for _ in 0..=self.policy.spins() {
            let batch = self.queued.swap(0, Ordering::AcqRel);
            if batch > 0 {
                return batch;
            }

            ledger.stats.empty_batches += 1;
            *empty_batches = empty_batches.saturating_add(1);
            if *empty_batches == STALL_THRESHOLD {
                Self::cold_stalled(slot, ledger);
            }
            core::hint::spin_loop();
        }
        0
    }

    /// Claims `batch` numbers, keeps the first, and publishes the rest to the
    /// raised slots in ascending order.
    fn combine(&self, slot: usize, batch: u64, ledger: &mut Ledger) -> Grant {
        let range = self.source.claim_range(batch);
        let sequence = range.start;

        let mut next = sequence.wrapping_add(1);
        for (other, flag) in self.interested.iter().enumerate() {
            if next == range.end {
                break;
            }
            if other != slot && flag.load(Ordering::Acquire) {
                ledger.results[other] = next;
                flag.store(false, Ordering::Release);
                next = next.wrapping_add(1);
            }
        }
        // Every drained increment belongs to a raised slot, or pairs with a
        // raised slot an earlier round counted but did not serve.
        debug_assert_eq!(next, range.end, "claimed numbers left undistributed");

        self.interested[slot].store(false, Ordering::Release);
        ledger.stats.rounds += 1;
        ledger.stats.requests += 1;

        Grant::Combined { sequence, range }
    }

    #[cold]
    #[inline(never)]
    fn cold_stalled(_slot: usize, ledger: &mut Ledger) {
        ledger.stats.stalls += 1;
        #[cfg(feature = "tracing")]
        tracing::warn!(
            slot = _slot,
            empty_batches = STALL_THRESHOLD,
            "combiner request keeps draining empty batches"
        );
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, LockError> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.ledger.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.ledger.lock()?)
        }
    }
}
