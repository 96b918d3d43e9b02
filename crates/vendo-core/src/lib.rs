//! Filtering and sync orchestration for the vendo engine.
//!
//! `config_sync::sync` drives the whole pipeline: per directory, each
//! content source is staged in isolation, filtered, merged into a
//! composite staging tree, and the live directory is replaced atomically.
//! The returned lock document pins every non-deterministic input so a
//! locked re-run reproduces the same bytes.

mod error;

pub mod config_sync;
pub mod dir_sync;
pub mod filter;
pub mod glob_match;
pub mod legal;

pub use config_sync::{sync, write_lock_file, SyncOptions};
pub use error::{Error, Result};
