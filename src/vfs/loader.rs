//! CSV loading
//!
//! Each row describes one entry: `type,path,name,content,encoding,permissions`.
//! The `encoding` column may be missing entirely, in which case every row is
//! plain text. A load either produces a complete, linked tree or an error;
//! the engine only swaps the result in on success.

use super::node::{Encoding, Node, NodeId, NodeKind};
use super::path::{file_name, resolve};
use super::tree;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use indexmap::IndexMap;
use serde::Deserialize;
use slab::Slab;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Stored in place of base64 content that could not be decoded
pub const DECODE_ERROR_PLACEHOLDER: &str = "[Base64 decoding error]";

/// Why a load failed
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },
    #[error("root directory not found in source")]
    MissingRoot,
}

/// What a successful load produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Where the rows came from
    pub source: String,
    /// Number of distinct paths loaded
    pub nodes: usize,
    /// Paths present in the index but not reachable from the root
    pub orphans: Vec<String>,
    /// Non-fatal problems, one message each
    pub warnings: Vec<String>,
}

/// A fully linked tree, ready to replace the engine's state
pub(crate) struct LoadedTree {
    pub arena: Slab<Node>,
    pub index: IndexMap<String, NodeId>,
    pub root: NodeId,
    pub report: LoadReport,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
    #[serde(default)]
    permissions: String,
}

/// Build a tree from a CSV file on the host
pub(crate) fn load_path(path: &Path) -> Result<LoadedTree, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_reader(file, &path.display().to_string())
}

/// Build a tree from any CSV source
pub(crate) fn load_reader<R: io::Read>(reader: R, source: &str) -> Result<LoadedTree, LoadError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut arena = Slab::new();
    let mut index: IndexMap<String, NodeId> = IndexMap::new();
    let mut warnings = Vec::new();
    let mut root_line = 0;

    // Phase one: create every node, unlinked
    let mut record = csv::StringRecord::new();
    while rdr.read_record(&mut record)? {
        let line = record.position().map_or(0, |p| p.line());
        let row: Row = record.deserialize(Some(&headers))?;
        let node = node_from_row(row, line, &mut warnings)?;
        if node.path == "/" {
            root_line = line;
        }

        match index.get(&node.path) {
            Some(&id) => {
                // Later rows win, but the path keeps its first position
                warn!(path = %node.path, line, "duplicate path, replacing earlier row");
                warnings.push(format!("{}: duplicate row on line {} replaces earlier one", node.path, line));
                arena[id] = node;
            }
            None => {
                let path = node.path.clone();
                let id = arena.insert(node);
                index.insert(path, id);
            }
        }
    }

    let root = match index.get("/") {
        Some(&id) if arena[id].is_dir() => id,
        Some(_) => {
            return Err(LoadError::MalformedRow {
                line: root_line,
                reason: "root '/' must be a directory".into(),
            });
        }
        None => return Err(LoadError::MissingRoot),
    };

    // Phase two: attach children to parents
    let orphans = tree::link(&mut arena, &index);

    debug!(source, nodes = index.len(), orphans = orphans.len(), "tree built");

    let report = LoadReport {
        source: source.to_string(),
        nodes: index.len(),
        orphans,
        warnings,
    };

    Ok(LoadedTree {
        arena,
        index,
        root,
        report,
    })
}

fn node_from_row(row: Row, line: u64, warnings: &mut Vec<String>) -> Result<Node, LoadError> {
    let malformed = |reason: String| LoadError::MalformedRow { line, reason };

    let kind = NodeKind::parse(&row.kind)
        .ok_or_else(|| malformed(format!("unknown type '{}'", row.kind)))?;
    let encoding = Encoding::parse(&row.encoding)
        .ok_or_else(|| malformed(format!("unknown encoding '{}'", row.encoding)))?;

    if !row.path.starts_with('/') {
        return Err(malformed(format!("path '{}' is not absolute", row.path)));
    }
    // Keys must match what user paths resolve to
    let path = resolve(&row.path, "/");

    let name = if path == "/" {
        if row.name.is_empty() { "/".to_string() } else { row.name }
    } else {
        let expected = file_name(&path);
        if !row.name.is_empty() && row.name != expected {
            warn!(path = %path, name = %row.name, "name column disagrees with path");
            warnings.push(format!("{}: name '{}' replaced by '{}'", path, row.name, expected));
        }
        expected.to_string()
    };

    let content = match (kind, encoding) {
        (NodeKind::File, Encoding::Base64) if !row.content.is_empty() => {
            match decode_base64(&row.content) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to decode base64 content");
                    warnings.push(format!("{}: failed to decode base64: {}", path, e));
                    DECODE_ERROR_PLACEHOLDER.to_string()
                }
            }
        }
        _ => row.content,
    };

    Ok(Node::new(kind, path, name, content, encoding, row.permissions))
}

fn decode_base64(content: &str) -> Result<String, String> {
    let bytes = BASE64.decode(content.trim()).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "type,path,name,content,encoding,permissions\n";

    fn load(body: &str) -> Result<LoadedTree, LoadError> {
        let csv = format!("{}{}", HEADER, body);
        load_reader(csv.as_bytes(), "test")
    }

    #[test]
    fn test_load_minimal() {
        let tree = load("directory,/,root,,text,rwxr-xr-x\n").unwrap();
        assert_eq!(tree.index.len(), 1);
        assert_eq!(tree.arena[tree.root].path(), "/");
        assert_eq!(tree.report.nodes, 1);
    }

    #[test]
    fn test_missing_root() {
        let result = load("directory,/home,home,,text,755\n");
        assert!(matches!(result, Err(LoadError::MissingRoot)));
    }

    #[test]
    fn test_root_must_be_directory() {
        let result = load("directory,/etc,etc,,text,755\nfile,/,root,oops,text,644\n");
        match result {
            Err(LoadError::MalformedRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("directory"));
            }
            other => panic!("expected MalformedRow, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_paths_normalized() {
        let tree = load(
            "directory,/,root,,text,755\n\
             directory,/tmp/,tmp,,text,777\n\
             file,/tmp//a.txt,a.txt,x,text,644\n",
        )
        .unwrap();
        assert!(tree.index.contains_key("/tmp"));
        assert!(tree.index.contains_key("/tmp/a.txt"));
        assert!(tree.report.orphans.is_empty());
        assert_eq!(tree.arena[tree.index["/tmp"]].name(), "tmp");
    }

    #[test]
    fn test_unknown_type_is_malformed() {
        let result = load("directory,/,root,,text,755\nsymlink,/x,x,,text,777\n");
        match result {
            Err(LoadError::MalformedRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("symlink"));
            }
            other => panic!("expected MalformedRow, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_relative_path_is_malformed() {
        let result = load("directory,/,root,,text,755\nfile,notes.txt,notes.txt,hi,text,644\n");
        assert!(matches!(result, Err(LoadError::MalformedRow { .. })));
    }

    #[test]
    fn test_base64_decoded() {
        // "hello" in base64
        let tree = load("directory,/,root,,text,755\nfile,/h.txt,h.txt,aGVsbG8=,base64,644\n").unwrap();
        let id = tree.index["/h.txt"];
        assert_eq!(tree.arena[id].content(), "hello");
        assert_eq!(tree.arena[id].encoding(), Encoding::Base64);
    }

    #[test]
    fn test_bad_base64_uses_placeholder() {
        let tree = load("directory,/,root,,text,755\nfile,/bad,bad,@@not-base64@@,base64,644\n").unwrap();
        let id = tree.index["/bad"];
        assert_eq!(tree.arena[id].content(), DECODE_ERROR_PLACEHOLDER);
        assert_eq!(tree.report.warnings.len(), 1);
        assert!(tree.report.warnings[0].starts_with("/bad"));
    }

    #[test]
    fn test_missing_encoding_column_defaults_to_text() {
        let csv = "type,path,name,content,permissions\n\
                   directory,/,root,,755\n\
                   file,/a.txt,a.txt,aGVsbG8=,644\n";
        let tree = load_reader(csv.as_bytes(), "test").unwrap();
        let id = tree.index["/a.txt"];
        assert_eq!(tree.arena[id].content(), "aGVsbG8=");
        assert_eq!(tree.arena[id].encoding(), Encoding::Text);
    }

    #[test]
    fn test_quoted_multiline_content() {
        let tree = load("directory,/,root,,text,755\nfile,/m.txt,m.txt,\"line one\nline two\",text,644\n").unwrap();
        let id = tree.index["/m.txt"];
        assert_eq!(tree.arena[id].content(), "line one\nline two");
    }

    #[test]
    fn test_name_follows_path() {
        let tree = load("directory,/,root,,text,755\nfile,/real.txt,fake.txt,,text,644\n").unwrap();
        let id = tree.index["/real.txt"];
        assert_eq!(tree.arena[id].name(), "real.txt");
        assert_eq!(tree.report.warnings.len(), 1);
    }

    #[test]
    fn test_duplicate_path_replaces_in_place() {
        let tree = load(
            "directory,/,root,,text,755\n\
             file,/a,a,first,text,644\n\
             file,/b,b,,text,644\n\
             file,/a,a,second,text,600\n",
        )
        .unwrap();
        assert_eq!(tree.index.len(), 3);
        let names: Vec<&str> = tree.arena[tree.root]
            .children()
            .iter()
            .map(|&id| tree.arena[id].name())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        let a = tree.index["/a"];
        assert_eq!(tree.arena[a].content(), "second");
        assert_eq!(tree.arena[a].permissions(), "600");
    }

    #[test]
    fn test_orphans_reported() {
        let tree = load("directory,/,root,,text,755\nfile,/ghost/x.txt,x.txt,,text,644\n").unwrap();
        assert_eq!(tree.report.orphans, vec!["/ghost/x.txt"]);
        assert!(tree.index.contains_key("/ghost/x.txt"));
    }

    #[test]
    fn test_missing_file() {
        let result = load_path(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
