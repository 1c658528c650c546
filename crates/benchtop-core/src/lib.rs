//! Core types and trait definitions for the Benchtop configuration store.
//!
//! This crate has no file-system, database or HTTP dependencies. Storage
//! backends implement [`store::ConfigStore`]; the API and CLI depend only on
//! that trait.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod error;
pub mod history;
pub mod record;
pub mod store;
pub mod table;
pub mod typed;

pub use error::{Error, Result};
