//! Startup scripts
//!
//! A script is one command per line. Blank lines and `#` comments are
//! skipped; everything else is replayed exactly like typed input.

use std::fs;
use std::io;
use std::path::Path;

/// Read a script file and return its command lines
pub fn read_script(path: &Path) -> io::Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(script_lines(&text))
}

/// Trimmed, non-blank, non-comment lines
pub fn script_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
