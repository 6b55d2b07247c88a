use crate::{UrlError, UrlResult};
use url::Url;

/// Converts a URL into its reversed-domain storage key
///
/// The host labels are reversed so records of the same site sort together,
/// followed by the scheme, an explicit port if any, and the path with query.
///
/// # Examples
///
/// ```
/// use ripple_update::url::reverse_url;
///
/// let key = reverse_url("http://www.example.com/path?q=1").unwrap();
/// assert_eq!(key, "com.example.www:http/path?q=1");
///
/// let key = reverse_url("https://news.example.org:8443/").unwrap();
/// assert_eq!(key, "org.example.news:https:8443/");
/// ```
pub fn reverse_url(url_str: &str) -> UrlResult<String> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(url_str.to_string()))?;

    let mut buf = String::with_capacity(url_str.len() + 4);
    buf.push_str(&reverse_host(host));
    buf.push(':');
    buf.push_str(url.scheme());

    if let Some(port) = url.port() {
        buf.push(':');
        buf.push_str(&port.to_string());
    }

    buf.push_str(url.path());

    if let Some(query) = url.query() {
        buf.push('?');
        buf.push_str(query);
    }

    if let Some(fragment) = url.fragment() {
        buf.push('#');
        buf.push_str(fragment);
    }

    Ok(buf)
}

/// Converts a reversed-domain storage key back into a URL string
///
/// # Examples
///
/// ```
/// use ripple_update::url::unreverse_url;
///
/// let url = unreverse_url("com.example.www:http/path").unwrap();
/// assert_eq!(url, "http://www.example.com/path");
/// ```
pub fn unreverse_url(reversed: &str) -> UrlResult<String> {
    let (reversed_host, rest) = reversed
        .split_once(':')
        .ok_or_else(|| UrlError::MalformedReversed(reversed.to_string()))?;

    if reversed_host.is_empty() {
        return Err(UrlError::MalformedReversed(reversed.to_string()));
    }

    let path_begin = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (scheme_and_port, path) = rest.split_at(path_begin);

    let (scheme, port) = match scheme_and_port.split_once(':') {
        Some((scheme, port)) => (scheme, Some(port)),
        None => (scheme_and_port, None),
    };

    if scheme.is_empty() {
        return Err(UrlError::MalformedReversed(reversed.to_string()));
    }

    let mut buf = String::with_capacity(reversed.len() + 3);
    buf.push_str(scheme);
    buf.push_str("://");
    buf.push_str(&reverse_host(reversed_host));

    if let Some(port) = port {
        buf.push(':');
        buf.push_str(port);
    }

    buf.push_str(path);

    Ok(buf)
}

fn reverse_host(host: &str) -> String {
    host.split('.').rev().collect::<Vec<_>>().join(".")
}
