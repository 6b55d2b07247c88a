use url::Url;

/// Extracts the lowercase host from a URL string
///
/// Returns `None` when the string is not an absolute URL with a host.
///
/// # Examples
///
/// ```
/// use ripple_update::url::extract_host;
///
/// assert_eq!(extract_host("https://EXAMPLE.com/path"), Some("example.com".to_string()));
/// assert_eq!(extract_host("not a url"), None);
/// ```
pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

/// Returns true if both URLs parse and share the same host
pub fn same_host(a: &str, b: &str) -> bool {
    match (extract_host(a), extract_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
