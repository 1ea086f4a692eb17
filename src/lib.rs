//! vfs-shell - A shell emulator over an in-memory filesystem
//!
//! The filesystem is a tree of directories and files loaded from a CSV
//! file. Nothing touches the host disk after loading; every command works
//! on the in-memory tree.
//!
//! - `vfs`: node arena, CSV loader, path resolution and the operations
//! - `shell`: parser, built-in commands and the executor
//! - `config`: command-line flags

pub mod config;
pub mod shell;
pub mod vfs;
