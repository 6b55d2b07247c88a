use crate::state::PageCategory;
use url::Url;

const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "ico", "mp3", "mp4", "avi", "mov", "webm",
    "flv", "pdf", "zip", "gz",
];

const SEARCH_PARAMS: &[&str] = &["q", "query", "keyword", "keywords", "search", "wd", "kw"];

const DETAIL_SEGMENTS: &[&str] = &["item", "items", "detail", "details", "article", "product", "p"];

const INDEX_SEGMENTS: &[&str] = &[
    "index", "list", "lists", "category", "categories", "tag", "tags", "channel", "archive",
];

/// Guesses what kind of page a URL points at from its shape alone
///
/// The checks run from most to least specific: media files, search result
/// pages, single-item detail pages, then listing/index pages.
///
/// # Examples
///
/// ```
/// use ripple_update::state::PageCategory;
/// use ripple_update::url::sniff_page_category;
///
/// assert_eq!(sniff_page_category("http://item.yhd.com/item/12342134134.html"), PageCategory::Detail);
/// assert_eq!(sniff_page_category("http://example.com/"), PageCategory::Index);
/// assert_eq!(sniff_page_category("http://example.com/search?q=rust"), PageCategory::Search);
/// ```
pub fn sniff_page_category(url: &str) -> PageCategory {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return PageCategory::Unknown,
    };

    let path = parsed.path().to_lowercase();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let last = segments.last().copied().unwrap_or("");
    let (stem, extension) = match last.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext),
        None => (last, ""),
    };

    if MEDIA_EXTENSIONS.contains(&extension) {
        return PageCategory::Media;
    }

    let is_search_path = segments.iter().any(|s| s.starts_with("search"));
    let has_search_param = parsed
        .query_pairs()
        .any(|(k, _)| SEARCH_PARAMS.contains(&k.as_ref()));
    if is_search_path || has_search_param {
        return PageCategory::Search;
    }

    if is_detail_path(&segments, stem, extension) {
        return PageCategory::Detail;
    }

    if segments.is_empty()
        || path.ends_with('/')
        || INDEX_SEGMENTS.contains(&stem)
        || segments.iter().any(|s| INDEX_SEGMENTS.contains(s))
    {
        return PageCategory::Index;
    }

    PageCategory::Unknown
}

fn is_detail_path(segments: &[&str], stem: &str, extension: &str) -> bool {
    let is_document = matches!(extension, "html" | "htm" | "shtml" | "xhtml" | "");

    // A long digit run in the final segment is almost always an item id
    if is_document && !segments.is_empty() && longest_digit_run(stem) >= 6 {
        return true;
    }

    // "/item/123", "/article/2024-01-some-title"
    segments.windows(2).any(|pair| {
        DETAIL_SEGMENTS.contains(&pair[0]) && pair[1].chars().any(|c| c.is_ascii_digit())
    })
}

fn longest_digit_run(s: &str) -> usize {
    let mut best = 0;
    let mut current = 0;
    for c in s.chars() {
        if c.is_ascii_digit() {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}
