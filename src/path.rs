//! Path manipulation utilities for gam
//!
//! Workspace, manifest and git paths are plain strings relative to the
//! workspace root. They are compared only after [`normalize`] has rewritten
//! them to a single canonical form.

/// Normalize a relative path string.
///
/// Backslashes become `/`, empty and `.` segments are dropped, and `..`
/// pops the previous segment where there is one. An empty result is `.`.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join two relative path strings and normalize the result.
pub fn join(base: &str, path: &str) -> String {
    if base.is_empty() {
        return normalize(path);
    }
    normalize(&format!("{}/{}", base, path))
}

/// The last segment of a path, or the whole path when it has none.
pub fn file_name(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => normalized,
    }
}

/// Whether `path` is `parent` itself or lies beneath it.
///
/// Matching is done on whole segments, so `app` contains `app/main.go` but
/// not `application/main.go`. The root `.` contains every relative path.
pub fn contains(parent: &str, path: &str) -> bool {
    let parent = normalize(parent);
    let path = normalize(path);

    if parent == "." {
        return !path.starts_with("../") && path != ".." && !path.starts_with('/');
    }

    match path.strip_prefix(parent.as_str()) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || parent.ends_with('/'),
        None => false,
    }
}
