//! Content path helpers.

/// Parent of `content_path`, used as the redirect target when a path no
/// longer exists.
///
/// Drops the last segment: `/a/b/c` becomes `/a/b`, `/a` becomes `/`,
/// and a single relative segment becomes the empty path.
pub fn not_found_redirect_path(content_path: &str) -> String {
    let trimmed = content_path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
        None if content_path.starts_with('/') => "/".to_string(),
        None => String::new(),
    }
}

/// Replace the namespace segment of a content path.
///
/// The segment following the first `namespace` segment is swapped for
/// `namespace`. Paths without one, and empty namespaces, are returned as is.
pub fn update_namespace_in_content_path(content_path: &str, namespace: &str) -> String {
    if namespace.is_empty() {
        return content_path.to_string();
    }

    let mut parts: Vec<&str> = content_path.split('/').collect();
    if let Some(idx) = parts.iter().position(|part| *part == "namespace") {
        if idx + 1 < parts.len() {
            parts[idx + 1] = namespace;
        }
    }
    parts.join("/")
}

/// First segment of a content path, ignoring a leading slash.
pub(crate) fn first_segment(content_path: &str) -> &str {
    content_path
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
}
