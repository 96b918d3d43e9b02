//! Filesystem primitives for the vendo sync engine.
//!
//! Everything here is deliberately small and synchronous: scoped temp
//! directories, scoped path joins, SHA-256 checksums, recursive copies that
//! preserve modes and symlinks, and the two atomic promotion helpers
//! (file write and whole-directory replacement) the engine builds on.

mod error;

pub mod checksum;
pub mod copy;
pub mod io;
pub mod path;
pub mod replace;
pub mod temp;

pub use error::{Error, Result};
pub use temp::TempArea;
