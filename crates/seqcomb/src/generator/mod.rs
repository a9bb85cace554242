mod atomic;
mod interface;
mod lock;
mod mutex;
#[cfg(test)]
mod tests;

pub use atomic::*;
pub use interface::*;
pub use lock::*;
pub use mutex::*;
