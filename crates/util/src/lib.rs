//! mockbase-util - Utility functions for mockbase
//!
//! Key ordering shared by paths and snapshots, and the seedable generator
//! behind random endpoint names and push ids.

pub mod ids;
pub mod key_cmp;

// Re-exports for convenience
pub use ids::{IdGenerator, PUSH_CHARS};
pub use key_cmp::{as_int_key, key_cmp};
