//! Path resolution
//!
//! Turns user-supplied paths into absolute index keys. Only slash joining,
//! collapsing and trailing-slash removal happen here; `.` and `..`
//! segments are left alone, and the `..`/`~` shortcuts belong to `cd`.

/// Resolve `raw` against the current directory.
///
/// Never fails. Whether the result exists is the caller's business.
pub fn resolve(raw: &str, cwd: &str) -> String {
    let joined = if raw.starts_with('/') {
        raw.to_string()
    } else if cwd == "/" {
        format!("/{}", raw)
    } else {
        format!("{}/{}", cwd, raw)
    };
    let mut out = collapse_slashes(&joined);
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Replace every run of `/` with a single `/`
fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Get parent directory of a path
///
/// Strips the final `/segment`; an empty remainder is the root.
/// The root itself has no parent.
pub fn parent_path(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    let idx = path.rfind('/')?;
    if idx == 0 {
        Some("/".to_string())
    } else {
        Some(path[..idx].to_string())
    }
}

/// Final segment of a path (empty for the root)
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a directory path and an entry name
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}
