//! Domain types for the commerce API.
//!
//! These mirror the JSON the commerce backend returns. Records stay close to
//! the wire shape so that column formatters can read them by property name.

pub mod common;
pub mod customer;
pub mod order;
pub mod page;
pub mod report;

// Re-export all types for convenience
pub use common::*;
pub use customer::*;
pub use order::*;
pub use page::*;
pub use report::*;
