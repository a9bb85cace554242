//! Optional cache-line padding for state that is hammered by many threads.

#[cfg(feature = "cache-padded")]
pub(crate) use crossbeam_utils::CachePadded as Padded;

/// Stand-in for [`crossbeam_utils::CachePadded`] when the `cache-padded`
/// feature is off: same constructor and deref, no padding.
#[cfg(not(feature = "cache-padded"))]
#[derive(Debug, Default)]
#[repr(transparent)]
pub(crate) struct Padded<T>(T);

#[cfg(not(feature = "cache-padded"))]
impl<T> Padded<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self(value)
    }
}

#[cfg(not(feature = "cache-padded"))]
impl<T> core::ops::Deref for Padded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}
