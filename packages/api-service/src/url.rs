//! URL joining and query string encoding.
use serde::Serialize;

use crate::Error;

/// Join `path` onto `base` with exactly one `/` between them.
///
/// A path starting with `?` or `#` is attached directly. An empty path
/// leaves `base` alone.
pub fn join(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_owned();
    }

    if base.is_empty() {
        return path.to_owned();
    }

    if path.starts_with(['?', '#']) {
        return format!("{}{path}", trim_trailing_slashes(base));
    }

    format!(
        "{}/{}",
        trim_trailing_slashes(base),
        path.trim_start_matches('/')
    )
}

/// Join several segments onto `base`, in order.
pub fn join_all<I, S>(base: &str, segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .fold(base.to_owned(), |url, segment| join(&url, segment.as_ref()))
}

/// Append an already encoded query string, before any `#fragment`.
pub fn with_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_owned();
    }

    let (url, fragment) = url.split_at(url.find('#').unwrap_or(url.len()));
    let separator = if url.contains('?') { '&' } else { '?' };

    format!("{url}{separator}{query}{fragment}")
}

/// Form-urlencode `params`.
///
/// `()` and `None` fields encode to nothing.
pub fn encode_query<P>(params: &P) -> Result<String, Error>
where
    P: Serialize + ?Sized,
{
    serde_urlencoded::to_string(params).map_err(Error::encode_params)
}

fn trim_trailing_slashes(url: &str) -> &str {
    url.trim_end_matches('/')
}
