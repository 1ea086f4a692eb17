//! Virtual File System
//!
//! An in-memory tree rebuilt wholesale from a CSV description. Nodes live in
//! a slab arena, an ordered path index is the authority for lookup, and a
//! cursor tracks the current directory.
//!
//! Load flow: [`loader`] parses rows into unlinked nodes, [`tree`] links
//! them under their parents, and [`VirtualFileSystem`] swaps the finished
//! tree in. Paths typed by the user go through [`path::resolve`] first.

pub mod loader;
pub mod memory;
pub mod node;
pub mod path;
pub mod tree;
pub mod usage;

pub use loader::{LoadError, LoadReport, DECODE_ERROR_PLACEHOLDER};
pub use memory::VirtualFileSystem;
pub use node::{Encoding, Node, NodeId, NodeKind};
pub use usage::format_size;

use thiserror::Error;

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Everything a VFS operation can fail with
#[derive(Debug, Error)]
pub enum VfsError {
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("'{0}' is not a directory")]
    NotADirectory(String),
    #[error("'{0}' is not a file")]
    NotAFile(String),
    #[error("invalid permissions '{0}' (expected 3 octal digits or 9 of r, w, x, -)")]
    InvalidFormat(String),
    #[error("already at root directory")]
    AlreadyAtRoot,
    #[error("{0} is not supported")]
    Unsupported(String),
    #[error("load failed: {0}")]
    Load(#[from] LoadError),
}
