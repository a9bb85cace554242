use core::ops::Range;

/// The outcome of one request to a [`CombinerGroup`].
///
/// - [`Grant::Combined`]: the caller ran the round itself. It claimed `range`
///   from the shared source, kept `range.start` and handed the rest to the
///   other outstanding requests of its group.
/// - [`Grant::Served`]: another caller ran the round and published this
///   caller's number. The caller never touched the shared source.
///
/// [`CombinerGroup`]: crate::CombinerGroup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Grant {
    /// This caller was the combiner for the round.
    Combined {
        /// The number assigned to this caller (always `range.start`).
        sequence: u64,
        /// The contiguous range claimed for the whole batch.
        range: Range<u64>,
    },
    /// A peer combined on this caller's behalf.
    Served {
        /// The number assigned to this caller.
        sequence: u64,
    },
}

impl Grant {
    /// The sequence number assigned to the caller.
    pub const fn sequence(&self) -> u64 {
        match self {
            Self::Combined { sequence, .. } | Self::Served { sequence } => *sequence,
        }
    }

    /// The range claimed in this round, if the caller was the combiner.
    pub fn claimed(&self) -> Option<&Range<u64>> {
        match self {
            Self::Combined { range, .. } => Some(range),
            Self::Served { .. } => None,
        }
    }

    /// Returns `true` if the caller ran the round.
    pub const fn is_combined(&self) -> bool {
        matches!(self, Self::Combined { .. })
    }
}
