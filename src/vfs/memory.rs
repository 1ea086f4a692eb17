//! In-memory filesystem engine
//!
//! Owns the node arena, the path index and the current directory. Every
//! mutation goes through here; callers only ever see `&Node`.
//!
//! The VFS starts out unloaded (no root). While unloaded every lookup
//! reports `NotFound`. A load builds a complete tree on the side and only
//! replaces the current state once it succeeded, so a failed load leaves
//! the previous tree untouched.

use super::loader::{self, LoadReport, LoadedTree};
use super::node::{Encoding, Node, NodeId, NodeKind};
use super::path;
use super::usage::{DIR_OVERHEAD, FILE_OVERHEAD};
use super::{VfsError, VfsResult};
use indexmap::IndexMap;
use slab::Slab;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// An owned, detached copy of a subtree, used by `copy`
struct Template {
    kind: NodeKind,
    content: String,
    encoding: Encoding,
    permissions: String,
    children: Vec<(String, Template)>,
}

/// The virtual filesystem
pub struct VirtualFileSystem {
    /// All nodes, including orphans
    arena: Slab<Node>,
    /// Absolute path to node, in row order
    index: IndexMap<String, NodeId>,
    /// The node at `/`; `None` until the first successful load
    root: Option<NodeId>,
    /// Current directory
    cursor: String,
    /// Display name only, never used for access checks
    current_user: String,
    /// Outcome of the last successful load
    last_report: Option<LoadReport>,
}

impl VirtualFileSystem {
    pub fn new(current_user: impl Into<String>) -> Self {
        Self {
            arena: Slab::new(),
            index: IndexMap::new(),
            root: None,
            cursor: "/".to_string(),
            current_user: current_user.into(),
            last_report: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.root.is_some()
    }

    /// Current directory
    pub fn cwd(&self) -> &str {
        &self.cursor
    }

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    /// Number of paths in the index, orphans included
    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    pub fn last_report(&self) -> Option<&LoadReport> {
        self.last_report.as_ref()
    }

    /// Resolve a user-supplied path against the current directory
    pub fn resolve(&self, raw: &str) -> String {
        path::resolve(raw, &self.cursor)
    }

    // ============ Loading ============

    /// Replace the whole tree with the contents of a CSV file
    pub fn load(&mut self, source: impl AsRef<Path>) -> VfsResult<&LoadReport> {
        let source = source.as_ref();
        info!(source = %source.display(), "loading VFS");
        let tree = loader::load_path(source)?;
        Ok(self.install(tree))
    }

    /// Replace the whole tree with CSV read from `reader`
    pub fn load_reader<R: io::Read>(&mut self, reader: R, source: &str) -> VfsResult<&LoadReport> {
        info!(source, "loading VFS");
        let tree = loader::load_reader(reader, source)?;
        Ok(self.install(tree))
    }

    fn install(&mut self, tree: LoadedTree) -> &LoadReport {
        self.arena = tree.arena;
        self.index = tree.index;
        self.root = Some(tree.root);
        self.cursor = "/".to_string();
        info!(
            nodes = tree.report.nodes,
            orphans = tree.report.orphans.len(),
            "VFS loaded"
        );
        self.last_report.insert(tree.report)
    }

    // ============ Lookup ============

    /// Find the node at a (possibly relative) path
    pub fn lookup(&self, raw: &str) -> VfsResult<&Node> {
        let resolved = self.resolve(raw);
        self.get(&resolved)
    }

    /// Find the node at an already absolute path
    fn get(&self, abs: &str) -> VfsResult<&Node> {
        self.index
            .get(abs)
            .map(|&id| &self.arena[id])
            .ok_or_else(|| VfsError::NotFound(abs.to_string()))
    }

    fn get_dir(&self, abs: &str) -> VfsResult<&Node> {
        let node = self.get(abs)?;
        if node.is_dir() {
            Ok(node)
        } else {
            Err(VfsError::NotADirectory(abs.to_string()))
        }
    }

    fn is_dir_at(&self, abs: &str) -> bool {
        self.get(abs).is_ok_and(Node::is_dir)
    }

    /// Node behind an id handed out by `children()`
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Paths present in the index but unreachable from the root
    pub fn orphans(&self) -> Vec<&str> {
        self.index
            .iter()
            .filter(|&(_, &id)| Some(id) != self.root && self.arena[id].parent.is_none())
            .map(|(p, _)| p.as_str())
            .collect()
    }

    // ============ Navigation ============

    /// Change the current directory and return the new one.
    ///
    /// `..` goes up one level, `~` (or no argument) goes home, `-` is
    /// rejected. Anything else is resolved like any other path.
    pub fn change_directory(&mut self, target: Option<&str>) -> VfsResult<&str> {
        if !self.is_loaded() {
            return Err(VfsError::NotFound(target.unwrap_or("~").to_string()));
        }

        let next = match target {
            Some("..") => {
                let parent = path::parent_path(&self.cursor).ok_or(VfsError::AlreadyAtRoot)?;
                if !self.is_dir_at(&parent) {
                    return Err(VfsError::NotFound(parent));
                }
                parent
            }
            None | Some("~") => match self.home_dir() {
                Some(home) => home,
                None => {
                    debug!(cwd = %self.cursor, "no home directory, staying put");
                    return Ok(&self.cursor);
                }
            },
            Some("-") => return Err(VfsError::Unsupported("`cd -`".into())),
            Some(raw) => {
                let resolved = self.resolve(raw);
                self.get_dir(&resolved)?;
                resolved
            }
        };

        debug!(from = %self.cursor, to = %next, "cd");
        self.cursor = next;
        Ok(&self.cursor)
    }

    /// `/home/<user>` if it exists, else `/home`
    fn home_dir(&self) -> Option<String> {
        let user_home = path::join("/home", &self.current_user);
        [user_home, "/home".to_string()]
            .into_iter()
            .find(|p| self.is_dir_at(p))
    }

    /// Names of the immediate children of a directory, in row order
    pub fn list_directory(&self, raw: Option<&str>) -> VfsResult<Vec<String>> {
        let resolved = match raw {
            Some(raw) => self.resolve(raw),
            None => self.cursor.clone(),
        };
        let dir = self.get_dir(&resolved)?;
        Ok(dir
            .children
            .iter()
            .map(|&id| self.arena[id].name.clone())
            .collect())
    }

    /// Content of a file
    pub fn read_file(&self, raw: &str) -> VfsResult<&str> {
        let resolved = self.resolve(raw);
        let node = self.get(&resolved)?;
        if node.is_file() {
            Ok(node.content())
        } else {
            Err(VfsError::NotAFile(resolved))
        }
    }

    fn id_of(&self, abs: &str) -> VfsResult<NodeId> {
        self.index
            .get(abs)
            .copied()
            .ok_or_else(|| VfsError::NotFound(abs.to_string()))
    }

    // ============ Sizes ============

    /// Total size of a node: content length in characters plus a fixed
    /// overhead per entry
    pub fn calculate_size(&self, raw: &str) -> VfsResult<u64> {
        let resolved = self.resolve(raw);
        let id = self.id_of(&resolved)?;
        Ok(self.size_of(id))
    }

    fn size_of(&self, id: NodeId) -> u64 {
        let node = &self.arena[id];
        match node.kind {
            NodeKind::File => node.content.chars().count() as u64 + FILE_OVERHEAD,
            NodeKind::Directory => {
                DIR_OVERHEAD + node.children.iter().map(|&c| self.size_of(c)).sum::<u64>()
            }
        }
    }

    // ============ Permissions ============

    /// Overwrite a node's permission string. Children are not touched.
    pub fn change_permissions(&mut self, raw: &str, permissions: &str) -> VfsResult<()> {
        if !is_valid_permissions(permissions) {
            return Err(VfsError::InvalidFormat(permissions.to_string()));
        }
        let resolved = self.resolve(raw);
        let id = self.id_of(&resolved)?;
        debug!(path = %resolved, permissions, "chmod");
        self.arena[id].permissions = permissions.to_string();
        Ok(())
    }

    // ============ Copy ============

    /// Copy a file or directory tree to `dest`.
    ///
    /// A `dest` ending in `/` names a directory to copy into, keeping the
    /// source's name. An existing node at the target is replaced in place:
    /// the copy takes its slot among the parent's children. The source is
    /// snapshotted before anything is removed, so copying a directory into
    /// itself is fine.
    pub fn copy(&mut self, source: &str, dest: &str) -> VfsResult<()> {
        let src_path = self.resolve(source);
        let src_id = self.id_of(&src_path)?;

        let dest_path = match self.resolve(dest) {
            dir if dest.ends_with('/') && dir != "/" => {
                let name = path::file_name(&src_path);
                if name.is_empty() {
                    return Err(VfsError::Unsupported("copying the root directory".into()));
                }
                path::join(&dir, name)
            }
            resolved => resolved,
        };

        let parent_path = path::parent_path(&dest_path)
            .ok_or_else(|| VfsError::Unsupported("overwriting the root directory".into()))?;
        let parent_id = self.id_of(&parent_path)?;
        if !self.arena[parent_id].is_dir() {
            return Err(VfsError::NotADirectory(parent_path));
        }

        let template = self.snapshot(src_id);

        let slot = match self.index.get(&dest_path).copied() {
            Some(old) => {
                let pos = self.arena[parent_id].children.iter().position(|&c| c == old);
                self.remove_subtree(old);
                pos
            }
            None => None,
        };

        let new_id = self.instantiate(template, &dest_path, parent_id);
        let siblings = &mut self.arena[parent_id].children;
        match slot {
            Some(pos) => siblings.insert(pos, new_id),
            None => siblings.push(new_id),
        }

        debug!(from = %src_path, to = %dest_path, "cp");
        self.fix_cursor();
        Ok(())
    }

    fn snapshot(&self, id: NodeId) -> Template {
        let node = &self.arena[id];
        Template {
            kind: node.kind,
            content: node.content.clone(),
            encoding: node.encoding,
            permissions: node.permissions.clone(),
            children: node
                .children
                .iter()
                .map(|&c| (self.arena[c].name.clone(), self.snapshot(c)))
                .collect(),
        }
    }

    /// Create nodes for `template` at `abs`, linked under `parent`.
    /// The caller is responsible for adding the returned id to the
    /// parent's children.
    fn instantiate(&mut self, template: Template, abs: &str, parent: NodeId) -> NodeId {
        // Only an orphan can already sit at a path under a fresh node
        if let Some(old) = self.index.get(abs).copied() {
            self.remove_subtree(old);
        }

        let mut node = Node::new(
            template.kind,
            abs,
            path::file_name(abs),
            template.content,
            template.encoding,
            template.permissions,
        );
        node.parent = Some(parent);
        let id = self.arena.insert(node);
        self.index.insert(abs.to_string(), id);

        for (name, child) in template.children {
            let child_path = path::join(abs, &name);
            let child_id = self.instantiate(child, &child_path, id);
            self.arena[id].children.push(child_id);
        }
        id
    }

    /// Drop a node and everything below it from the arena and the index
    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(parent) = self.arena[id].parent {
            self.arena[parent].children.retain(|&c| c != id);
        }

        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = self.arena.remove(id);
            self.index.shift_remove(&node.path);
            stack.extend(node.children);
        }
    }

    /// Move the cursor up until it names a directory again
    fn fix_cursor(&mut self) {
        while !self.is_dir_at(&self.cursor) {
            match path::parent_path(&self.cursor) {
                Some(parent) => {
                    debug!(from = %self.cursor, to = %parent, "cwd no longer a directory");
                    self.cursor = parent;
                }
                None => break,
            }
        }
    }

    // ============ Rendering ============

    /// Indented listing of a subtree using each node's display label
    pub fn tree(&self, raw: Option<&str>) -> VfsResult<String> {
        let resolved = match raw {
            Some(raw) => self.resolve(raw),
            None => self.cursor.clone(),
        };
        let id = self.id_of(&resolved)?;
        let mut out = String::new();
        self.render(id, 0, &mut out);
        Ok(out.trim_end().to_string())
    }

    fn render(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.arena[id];
        let label = if Some(id) == self.root {
            "/".to_string()
        } else {
            node.display_label()
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&label);
        out.push('\n');
        for &child in &node.children {
            self.render(child, depth + 1, out);
        }
    }
}

/// Three octal digits, or nine characters from `rwx-`
pub fn is_valid_permissions(s: &str) -> bool {
    let b = s.as_bytes();
    match b.len() {
        3 => b.iter().all(|c| (b'0'..=b'7').contains(c)),
        9 => b.iter().all(|c| matches!(c, b'r' | b'w' | b'x' | b'-')),
        _ => false,
    }
}
