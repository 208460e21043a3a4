//! Workspace placeholder crate.
//!
//! This crate exists so host applications can depend on `bpc-workspace` and
//! reach the individual workspace crates (`core-catalog`, `core-metadata`,
//! `core-refresh`, `core-runtime`) without wiring each one individually.

pub use core_catalog as catalog;
pub use core_metadata as metadata;
pub use core_refresh as refresh;
pub use core_runtime as runtime;
