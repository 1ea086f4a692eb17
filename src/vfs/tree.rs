//! Tree building
//!
//! Loading happens in two phases: every row is inserted into the arena and
//! the path index first, then [`link`] attaches each node to its parent.
//! Nodes whose parent is missing or is a file stay in the index but are
//! never attached; their paths are returned so callers can report them.

use super::node::{Node, NodeId};
use super::path::parent_path;
use indexmap::IndexMap;
use slab::Slab;
use tracing::warn;

/// Link every non-root node under its parent directory.
///
/// Children are appended in index order, so the tree keeps the order the
/// rows were supplied in. Returns the orphaned paths, also in index order.
pub fn link(arena: &mut Slab<Node>, index: &IndexMap<String, NodeId>) -> Vec<String> {
    let mut orphans = Vec::new();

    for (path, &id) in index {
        let Some(parent) = parent_path(path) else {
            continue; // root
        };

        match index.get(&parent) {
            Some(&pid) if arena[pid].is_dir() => {
                arena[pid].children.push(id);
                arena[id].parent = Some(pid);
            }
            Some(_) => {
                warn!(path = %path, parent = %parent, "parent is a file, node left unlinked");
                orphans.push(path.clone());
            }
            None => {
                warn!(path = %path, parent = %parent, "parent missing, node left unlinked");
                orphans.push(path.clone());
            }
        }
    }

    orphans
}
