use core::fmt;

/// A result type that is infallible by default.
///
/// Most `seqcomb` APIs are infallible. Only types guarding state with a std
/// mutex can fail, and only when that mutex was poisoned.
pub type Result<T, E = core::convert::Infallible> = core::result::Result<T, E>;

/// All errors that `seqcomb` can emit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Error {
    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison and
    /// lock-based types report [`LockError`] (= [`Infallible`]) instead.
    ///
    /// [`Infallible`]: core::convert::Infallible
    LockPoisoned,
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl core::error::Error for Error {}

impl From<core::convert::Infallible> for Error {
    fn from(never: core::convert::Infallible) -> Self {
        match never {}
    }
}

/// The error type of everything that takes a lock.
///
/// With `parking-lot` locks cannot poison, so this is
/// [`core::convert::Infallible`] and the infallible convenience methods
/// (e.g. [`SequenceGenerator::next_sequence`]) become available.
///
/// [`SequenceGenerator::next_sequence`]: crate::SequenceGenerator::next_sequence
#[cfg(feature = "parking-lot")]
pub type LockError = core::convert::Infallible;

/// The error type of everything that takes a lock.
///
/// Without `parking-lot` a std mutex is used, which poisons if a holder
/// panics.
#[cfg(not(feature = "parking-lot"))]
pub type LockError = Error;

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
// Convert all poisoned lock errors to a simplified `LockPoisoned`
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
