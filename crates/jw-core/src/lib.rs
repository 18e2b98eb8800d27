//! jewel-orders/crates/jw-core/src/lib.rs
//!
//! The order lifecycle logic and interface definitions for jewel-orders.

pub mod engine;
pub mod error;
pub mod models;
pub mod query;
pub mod rules;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exporting for easier access in other crates
pub use engine::*;
pub use error::*;
pub use models::*;
pub use query::*;
pub use traits::*;
