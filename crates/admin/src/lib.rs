//! Commerce Admin library.
//!
//! Talks to the commerce backend's REST API and drives the admin's record
//! list screens: filtered, sorted, paginated order and customer lists with
//! row selection, persisted column visibility and full-dataset CSV export.
//!
//! # Security
//!
//! This crate holds an admin access token for the commerce backend. Tokens
//! are kept in `secrecy::SecretString` and never logged.
//!
//! # Modules
//!
//! - [`commerce`] - REST client, the [`commerce::CommerceApi`] seam and record types
//! - [`listing`] - The list controller and everything it is built from
//! - [`components`] - Table and column definitions
//! - [`preferences`] - Key/value preference stores
//! - [`identity`] - Login and token refresh against the identity service
//! - [`orders`] - Order detail and edit helpers
//! - [`reports`] - Sales and product report aggregation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod components;
pub mod config;
pub mod error;
pub mod identity;
pub mod listing;
pub mod orders;
pub mod preferences;
pub mod reports;

#[cfg(test)]
mod testing;
