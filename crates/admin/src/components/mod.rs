//! Table definitions shared by the list screens.

pub mod data_table;

pub use data_table::*;
