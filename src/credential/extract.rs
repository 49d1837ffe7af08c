//! Locating the presented key on a request.

use axum::http::HeaderMap;

/// Find the presented key: the `key_name` header first, then a query
/// parameter of the same name. Empty values count as absent.
pub fn extract_key(headers: &HeaderMap, query: Option<&str>, key_name: &str) -> Option<String> {
    let from_header = headers
        .get(key_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(key) = from_header {
        return Some(key.to_string());
    }

    query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(name, value)| name == key_name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Authorization", HeaderValue::from_static("from-header"));

        let key = extract_key(&headers, Some("X-Authorization=from-query"), "X-Authorization");
        assert_eq!(key.as_deref(), Some("from-header"));
    }

    #[test]
    fn test_query_fallback() {
        let headers = HeaderMap::new();
        let key = extract_key(&headers, Some("page=2&api_key=abc%20123"), "api_key");
        assert_eq!(key.as_deref(), Some("abc 123"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("api_key", HeaderValue::from_static("  "));

        assert_eq!(extract_key(&headers, Some("api_key="), "api_key"), None);
        assert_eq!(extract_key(&headers, None, "api_key"), None);
    }
}
