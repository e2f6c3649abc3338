//! Core types for the cardport contact importer.
//!
//! This crate holds the normalized contact model produced by the vCard mapper
//! and the [`commit::CommitAdapter`] boundary that storage backends implement.
//! It carries no parsing code and performs no I/O.

pub mod base64_bytes;
pub mod commit;
pub mod contact;
pub mod error;

pub use error::{Error, Result};
