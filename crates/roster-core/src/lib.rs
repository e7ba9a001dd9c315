//! Core types and operations for the Roster student ledger.
//!
//! Everything lives in one [`record::Record`]; the domain operations are
//! methods on it, and [`store::RecordStore`] persists it. This crate is
//! deliberately free of HTTP and database dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod allocator;
pub mod attendance;
pub mod backup;
pub mod error;
pub mod ledger;
mod lenient;
pub mod migrate;
pub mod month;
pub mod payment;
pub mod phone;
pub mod receipt;
pub mod record;
pub mod report;
pub mod store;
pub mod student;

pub use error::{Error, Result};
