//! Backend URL and path joining

/// Join path segments with single slashes, ignoring empty segments
///
/// Leading and trailing slashes on every segment are dropped, so
/// `api_path(["count/", "/boot"])` is `"count/boot"`.
#[must_use]
pub fn api_path<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    segments
        .into_iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Append `path` to `base_url`, keeping any path prefix the base already has
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
