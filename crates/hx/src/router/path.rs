//! Route path helpers.

/// Joins two path segments with exactly one slash between them.
///
/// Nothing else is normalized, `join_path("/api", "users/")` is `/api/users/`.
pub fn join_path(a: &str, b: &str) -> String {
    match (a.ends_with('/'), b.starts_with('/')) {
        (true, true) => format!("{a}{}", &b[1..]),
        (false, false) => format!("{a}/{b}"),
        _ => format!("{a}{b}"),
    }
}

/// Lexically cleans a slash separated path.
///
/// Repeated slashes collapse, `.` segments are dropped and `..` removes the segment before it. A
/// rooted path never climbs above `/`. The empty path cleans to `.`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_owned(),
        (false, false) => joined,
    }
}

/// The base path of a group mounted at `prefix` below `base`
pub(crate) fn group_path(base: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return clean_path(base);
    }
    clean_path(&format!("{base}/{prefix}"))
}

/// The full path of a route registered as `path` in a scope based at `base`
pub(crate) fn route_path(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        join_path(base, path)
    } else {
        join_path(base, &format!("/{path}"))
    }
}
