//! Browser-facing authorization URL

use crate::types::{ClientCredential, OAuthConfig};

/// Build the authorization URL the host opens in a browser.
///
/// The URL carries `client_id`, `scope`, `response_type=code`, `duration`
/// and `redirect_uri`, each percent-encoded. No I/O is performed.
///
/// ```
/// use uploader_oauth::{ClientCredential, OAuthConfig, build_authorization_url};
///
/// let credential = ClientCredential::new("abc", "secret", "https://localhost/callback");
/// let url = build_authorization_url(&credential, &OAuthConfig::default());
/// assert!(url.starts_with("https://www.reddit.com/api/v1/authorize?client_id=abc&"));
/// assert!(url.contains("redirect_uri=https%3A%2F%2Flocalhost%2Fcallback"));
/// ```
#[must_use]
pub fn build_authorization_url(credential: &ClientCredential, config: &OAuthConfig) -> String {
    let params = [
        ("client_id", credential.client_id()),
        ("scope", config.scope.as_str()),
        ("response_type", "code"),
        ("duration", config.duration.as_str()),
        ("redirect_uri", credential.redirect_uri()),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding(v)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if config.auth_url.contains('?') { '&' } else { '?' };
    format!("{}{separator}{query}", config.auth_url)
}

/// URL encode a string for OAuth parameters.
/// Preserves unreserved characters per RFC 3986.
pub(crate) fn urlencoding(s: &str) -> String {
    use std::fmt::Write;
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                // Writing into a String cannot fail
                let _ = write!(result, "%{byte:02X}");
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenDuration;
    use std::collections::HashMap;

    fn query_map(url: &str) -> HashMap<String, String> {
        let parsed = reqwest::Url::parse(url).unwrap();
        parsed.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_urlencoding() {
        assert_eq!(urlencoding("hello"), "hello");
        assert_eq!(urlencoding("hello world"), "hello%20world");
        assert_eq!(urlencoding("a+b"), "a%2Bb");
        assert_eq!(urlencoding("submit identity"), "submit%20identity");
        assert_eq!(
            urlencoding("https://example.com"),
            "https%3A%2F%2Fexample.com"
        );
        assert_eq!(urlencoding("ü"), "%C3%BC");
    }

    #[test]
    fn test_contains_all_parameters() {
        let credential = ClientCredential::new("client-1", "secret", "https://localhost/cb");
        let url = build_authorization_url(&credential, &OAuthConfig::default());
        let query = query_map(&url);

        assert_eq!(query.len(), 5);
        assert_eq!(query["client_id"], "client-1");
        assert_eq!(query["scope"], "submit");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["duration"], "permanent");
        assert_eq!(query["redirect_uri"], "https://localhost/cb");
    }

    #[test]
    fn test_reserved_characters_round_trip() {
        let credential = ClientCredential::new(
            "id&scope=evil",
            "secret",
            "http://127.0.0.1:8400/cb?x=1&y=two words",
        );
        let config = OAuthConfig::builder()
            .scope("submit read+write #all")
            .duration(TokenDuration::Temporary)
            .build();
        let url = build_authorization_url(&credential, &config);

        assert!(!url.contains(' '));
        let query = query_map(&url);
        assert_eq!(query.len(), 5);
        assert_eq!(query["client_id"], "id&scope=evil");
        assert_eq!(query["scope"], "submit read+write #all");
        assert_eq!(query["duration"], "temporary");
        assert_eq!(
            query["redirect_uri"],
            "http://127.0.0.1:8400/cb?x=1&y=two words"
        );
    }

    #[test]
    fn test_endpoint_with_existing_query() {
        let credential = ClientCredential::new("id", "secret", "https://localhost/cb");
        let config = OAuthConfig::builder()
            .auth_url("https://auth.example.com/authorize?compact=true")
            .build();
        let url = build_authorization_url(&credential, &config);

        assert!(url.starts_with("https://auth.example.com/authorize?compact=true&client_id=id"));
        assert_eq!(query_map(&url)["compact"], "true");
    }

    #[test]
    fn test_is_deterministic() {
        let credential = ClientCredential::new("id", "secret", "https://localhost/cb");
        let config = OAuthConfig::default();
        assert_eq!(
            build_authorization_url(&credential, &config),
            build_authorization_url(&credential, &config)
        );
    }
}
