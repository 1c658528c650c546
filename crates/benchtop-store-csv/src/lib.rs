//! CSV-file backend for the Benchtop configuration store.
//!
//! The file is the source of truth: every read parses it from disk and every
//! write rewrites it whole. History is mined from git commits that touched
//! the file, or from dated snapshots in a sibling `backups/` directory.

mod backups;
mod encode;
mod git;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::CsvStore;
