//! Globally unique, monotonically increasing 64-bit sequence numbers for many
//! concurrent callers.
//!
//! Three interchangeable strategies implement [`SequenceGenerator`]:
//!
//! - [`LockSequenceGenerator`]: a plain counter behind a mutex.
//! - [`AtomicSequenceGenerator`]: one shared fetch-and-add.
//! - [`CombinerPool`]: callers are partitioned into fixed-size
//!   [`CombinerGroup`]s. Under contention one caller per group claims a
//!   contiguous range for every outstanding request in its group and hands the
//!   numbers out, so only one thread per batch touches the shared counter.
//!
//! All strategies draw from a [`SequenceSource`] (or, for the lock baseline, a
//! counter with the same contract).
//!
//! ## Features
//!
//! - `cache-padded`: pad the shared counter, per-slot flags and locks to a
//!   cache line.
//! - `parking-lot`: use `parking_lot` mutexes. They do not poison, so lock
//!   based types become infallible.
//! - `tracing`: instrument request paths and report retry stalls.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod combiner;
mod error;
mod generator;
mod padded;
mod source;

pub use crate::combiner::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::source::*;
