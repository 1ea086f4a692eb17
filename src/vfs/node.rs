//! Filesystem entries
//!
//! A node is a file or a directory. Nodes live in the engine's arena and
//! point at each other by [`NodeId`], so the tree never holds shared
//! mutable references.

use std::fmt;

/// Arena key for a node
pub type NodeId = usize;

/// What kind of entry a node is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    /// Parse the `type` column
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "file" => Some(Self::File),
            "directory" => Some(Self::Directory),
            _ => None,
        }
    }
}

/// How a file's content was encoded in the source row
///
/// Content is always stored decoded; this only remembers the hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Text,
    Base64,
}

impl Encoding {
    /// Parse the `encoding` column. An empty value means text.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "" | "text" => Some(Self::Text),
            "base64" => Some(Self::Base64),
            _ => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// A stored file or directory
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) path: String,
    pub(crate) name: String,
    pub(crate) content: String,
    pub(crate) encoding: Encoding,
    pub(crate) permissions: String,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    pub fn new(
        kind: NodeKind,
        path: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        encoding: Encoding,
        permissions: impl Into<String>,
    ) -> Self {
        // Directory content is never meaningful
        let content = match kind {
            NodeKind::File => content.into(),
            NodeKind::Directory => String::new(),
        };
        Self {
            kind,
            path: path.into(),
            name: name.into(),
            content,
            encoding,
            permissions: permissions.into(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn permissions(&self) -> &str {
        &self.permissions
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Short label: `name/` for directories, `name` for files, with an
    /// encoding suffix when the file did not come in as plain text.
    pub fn display_label(&self) -> String {
        match self.kind {
            NodeKind::Directory => format!("{}/", self.name),
            NodeKind::File if self.encoding != Encoding::Text => {
                format!("{} [{}]", self.name, self.encoding)
            }
            NodeKind::File => self.name.clone(),
        }
    }
}
