//! Request identity keys.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the bucket key for a request: method plus URL without fragment.
pub fn request_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let a = request_key("GET", &url("http://localhost:8080/app.js"));
        let b = request_key("get", &url("http://localhost:8080/app.js"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = request_key("GET", &url("http://localhost:8080/index.html#day-2"));
        let b = request_key("GET", &url("http://localhost:8080/index.html"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_keeps_query() {
        let a = request_key("GET", &url("http://localhost:8080/data.js?v=1"));
        let b = request_key("GET", &url("http://localhost:8080/data.js?v=2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_depends_on_method() {
        let a = request_key("GET", &url("http://localhost:8080/"));
        let b = request_key("HEAD", &url("http://localhost:8080/"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = request_key("GET", &url("http://localhost:8080/"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
