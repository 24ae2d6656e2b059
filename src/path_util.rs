//! Path utilities used to scope mount specifications and the locations
//! inside them.
//!
//! All functions here are purely lexical: they never touch a file system and
//! never resolve symlinks. Paths use `/` as the only separator.
//!
//! - [`path_has_prefix`] decides whether a path falls under a mount prefix
//! - [`canonicalize_path`] normalizes `.`/`..` segments and duplicate separators
//! - [`match_prefix`] strips a parent path from a descendant path

/// Path separator
pub const SEPARATOR: char = '/';

/// Checks whether `path` lies inside the subtree rooted at `prefix`
///
/// The match is boundary exact: `/foo` is a prefix of `/foo` and `/foo/bar`
/// but not of `/foobar`. A prefix that already ends with a separator matches
/// anything below it, and also the directory it names, so `/foo/` matches
/// `/foo`. The empty path only matches an empty prefix.
///
/// # Arguments
///
/// * `path` - The path being routed
/// * `prefix` - The mount prefix; `None` or an empty prefix matches every path
///
/// # Returns
///
/// `true` if `path` is `prefix` itself or a descendant of it
pub fn path_has_prefix(path: &str, prefix: Option<&str>) -> bool {
    let Some(prefix) = prefix else {
        return true;
    };
    if prefix.is_empty() {
        return true;
    }

    match path.strip_prefix(prefix) {
        Some(rest) => {
            prefix.ends_with(SEPARATOR) || rest.is_empty() || rest.starts_with(SEPARATOR)
        }
        None => prefix
            .strip_suffix(SEPARATOR)
            .is_some_and(|directory| !path.is_empty() && directory == path),
    }
}

/// Normalizes a path into canonical absolute form
///
/// A leading `/` is added when missing. `.` segments are dropped, `..`
/// removes the preceding segment (and is a no-op at the root), runs of
/// separators collapse into one and a trailing separator is removed unless
/// the result is the root itself.
///
/// # Arguments
///
/// * `path` - Absolute or relative path
///
/// # Returns
///
/// A new canonical absolute path
pub fn canonicalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }

    let mut canon = String::with_capacity(path.len() + 1);
    for segment in &segments {
        canon.push(SEPARATOR);
        canon.push_str(segment);
    }
    if canon.is_empty() {
        canon.push(SEPARATOR);
    }
    canon
}

/// Strips `prefix` from the start of `path`
///
/// When the prefix ends with a separator (the root, typically) that
/// separator is left at the start of the remainder, so callers can always
/// test the remainder for a leading `/` to tell a descendant from a sibling
/// such as `/foobar` under `/foo`.
///
/// # Returns
///
/// The remainder of `path`, or `None` if `path` does not start with `prefix`
pub fn match_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if !path.starts_with(prefix) {
        return None;
    }
    let mut prefix_len = prefix.len();
    if prefix.ends_with(SEPARATOR) {
        prefix_len -= 1;
    }
    Some(&path[prefix_len..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_boundaries() {
        assert!(path_has_prefix("/foo/bar", Some("/foo")));
        assert!(path_has_prefix("/foo", Some("/foo")));
        assert!(!path_has_prefix("/foobar", Some("/foo")));
        assert!(path_has_prefix("/foo", Some("/foo/")));
        assert!(path_has_prefix("/foo/bar", Some("/foo/")));
        assert!(!path_has_prefix("/bar", Some("/foo")));
        assert!(!path_has_prefix("/fo", Some("/foo/")));
    }

    #[test]
    fn empty_and_missing_prefix_match_everything() {
        assert!(path_has_prefix("/anything", Some("")));
        assert!(path_has_prefix("", Some("")));
        assert!(path_has_prefix("/anything", None));
        assert!(path_has_prefix("relative", None));
    }

    #[test]
    fn root_prefix_matches_absolute_paths() {
        assert!(path_has_prefix("/", Some("/")));
        assert!(path_has_prefix("/home/alice", Some("/")));
        assert!(!path_has_prefix("home", Some("/")));
        assert!(!path_has_prefix("", Some("/")));
    }

    #[test]
    fn canonicalize_examples() {
        assert_eq!(canonicalize_path("a/./b/../c"), "/a/c");
        assert_eq!(canonicalize_path("/a//b///c/"), "/a/b/c");
        assert_eq!(canonicalize_path("../../x"), "/x");
    }

    #[test]
    fn canonicalize_root_forms() {
        assert_eq!(canonicalize_path(""), "/");
        assert_eq!(canonicalize_path("/"), "/");
        assert_eq!(canonicalize_path("//"), "/");
        assert_eq!(canonicalize_path("/.."), "/");
        assert_eq!(canonicalize_path("./"), "/");
        assert_eq!(canonicalize_path("a/.."), "/");
    }

    #[test]
    fn canonicalize_keeps_dotted_names() {
        assert_eq!(canonicalize_path("/.hidden/..."), "/.hidden/...");
        assert_eq!(canonicalize_path("/a/..b/c."), "/a/..b/c.");
    }

    #[test]
    fn match_prefix_keeps_separator() {
        assert_eq!(match_prefix("/foo/bar", "/foo"), Some("/bar"));
        assert_eq!(match_prefix("/foo/bar", "/"), Some("/foo/bar"));
        assert_eq!(match_prefix("/foobar", "/foo"), Some("bar"));
        assert_eq!(match_prefix("/foo", "/foo"), Some(""));
        assert_eq!(match_prefix("/bar", "/foo"), None);
    }
}
