//! Path helpers: `dirname`, `basename` and directory decomposition
//!
//! Paths are treated as plain `/`-separated strings. Records carry paths from
//! many sources, so nothing here touches the filesystem.

use serde_json::{Map, Value};

/// Directory part of a path.
///
/// Trailing slashes are ignored, a path without a slash yields `"."` and a path
/// directly under the root yields `"/"`.
pub fn dirname(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        None => ".".to_string(),
        Some(idx) => {
            let dir = trimmed[..idx].trim_end_matches('/');
            if dir.is_empty() {
                "/".to_string()
            } else {
                dir.to_string()
            }
        }
    }
}

/// Last segment of a path, ignoring trailing slashes.
pub fn basename(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        None => trimmed.to_string(),
        Some(idx) => trimmed[idx + 1..].to_string(),
    }
}

/// Split a directory into its segments.
///
/// Empty and `.` segments are dropped.
pub fn dir_segments(dir: &str) -> Vec<String> {
    dir.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(str::to_string)
        .collect()
}

/// Decompose a directory into `dirsplit` plus one numbered `dirN` field per segment.
///
/// ```rust
/// use prairie_toolkit::paths::decompose;
/// use serde_json::json;
///
/// let fields = decompose("one/folder/two");
/// assert_eq!(fields["dirsplit"], json!(["one", "folder", "two"]));
/// assert_eq!(fields["dir1"], json!("one"));
/// assert_eq!(fields["dir3"], json!("two"));
/// ```
pub fn decompose(dir: &str) -> Map<String, Value> {
    let segments = dir_segments(dir);
    let mut fields = Map::new();
    fields.insert(
        "dirsplit".to_string(),
        Value::Array(segments.iter().cloned().map(Value::String).collect()),
    );
    for (i, segment) in segments.into_iter().enumerate() {
        fields.insert(format!("dir{}", i + 1), Value::String(segment));
    }
    fields
}
