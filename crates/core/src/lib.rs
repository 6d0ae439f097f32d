//! Commerce Admin Core - Shared types library.
//!
//! This crate provides common types used across the commerce admin components:
//! - `admin` - Commerce API client and the record list controller
//! - `cli` - Operator command line built on the controller
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for record IDs, money and order states

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
