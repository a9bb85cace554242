//! Batching allocation: groups of callers that share one claim on the
//! [`SequenceSource`] per round.
//!
//! [`SequenceSource`]: crate::SequenceSource

mod grant;
mod group;
mod policy;
mod pool;
mod stats;

pub use grant::*;
pub use group::*;
pub use policy::*;
pub use pool::*;
pub use stats::*;
