use std::collections::HashMap;

use url::form_urlencoded;

/// Parsed form of an incoming request. Routing only needs the request line;
/// headers and bodies are drained and ignored.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
}

impl HttpRequest {
    /// Parses a `METHOD target HTTP/x.y` request line. Anything else is None.
    pub fn parse(request_line: &str) -> Option<Self> {
        let mut parts = request_line.split_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?;
        parts.next()?;

        let (path, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        let query = form_urlencoded::parse(raw_query.as_bytes())
            .into_owned()
            .collect();

        Some(Self {
            method,
            path: path.to_string(),
            query,
        })
    }

    /// Query parameter, trimmed. None when absent or blank.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_path_and_query() {
        let request = HttpRequest::parse("GET /scrape?name=Jane%20Roe HTTP/1.1").unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/scrape");
        assert_eq!(request.param("name"), Some("Jane Roe"));
    }

    #[test]
    fn test_decodes_plus_as_space() {
        let request = HttpRequest::parse("GET /scrape-all?name=Jane+Roe&province=bc HTTP/1.1")
            .unwrap();
        assert_eq!(request.param("name"), Some("Jane Roe"));
        assert_eq!(request.param("province"), Some("bc"));
    }

    #[test]
    fn test_path_without_query_has_no_params() {
        let request = HttpRequest::parse("GET /stats HTTP/1.1").unwrap();
        assert_eq!(request.path, "/stats");
        assert!(request.query.is_empty());
        assert_eq!(request.param("name"), None);
    }

    #[test]
    fn test_blank_params_count_as_missing() {
        let request = HttpRequest::parse("GET /scrape?name=+++ HTTP/1.1").unwrap();
        assert_eq!(request.param("name"), None);
    }

    #[test]
    fn test_rejects_malformed_request_lines() {
        assert!(HttpRequest::parse("").is_none());
        assert!(HttpRequest::parse("GET").is_none());
        assert!(HttpRequest::parse("GET /scrape").is_none());
    }
}
