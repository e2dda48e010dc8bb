use std::mem;
use std::str::FromStr;

use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, Method, Uri};

use crate::{Error, Result};

/// Signing context for request.
///
/// Built from [`http::request::Parts`] without consuming them, so a signer
/// can compute a signature over a request it does not own. Mutations made
/// here (headers added, query rewritten) only reach the request when
/// [`SigningRequest::apply`] writes them back.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, percent-encoded as it appeared on the request.
    pub path: String,
    /// HTTP query parameters, percent-decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from [`http::request::Parts`].
    pub fn build(parts: &http::request::Parts) -> Result<Self> {
        let uri = parts.uri.clone().into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),
            headers: parts.headers.clone(),
        })
    }

    /// Apply the signing context back to [`http::request::Parts`].
    pub fn apply(self, parts: &mut http::request::Parts) -> Result<()> {
        let query_size = self.query_size();

        parts.method = self.method;
        parts.headers = self.headers;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let paq = if query_size == 0 {
                    self.path
                } else {
                    let mut s = self.path;
                    s.reserve(query_size + 1);

                    s.push('?');
                    for (i, (k, v)) in self.query.iter().enumerate() {
                        if i > 0 {
                            s.push('&');
                        }

                        s.push_str(k);
                        if !v.is_empty() {
                            s.push('=');
                            s.push_str(v);
                        }
                    }

                    s
                };

                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Get query size.
    #[inline]
    pub fn query_size(&self) -> usize {
        self.query
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;
    use http::Request;

    fn parts_of(uri: &str) -> http::request::Parts {
        let mut req = Request::new(());
        *req.uri_mut() = uri.parse().expect("uri must be valid");
        req.into_parts().0
    }

    #[test]
    fn test_build() {
        let parts = parts_of("https://example.com:8080/path/to%20file?b=2&a=1&flag");

        let req = SigningRequest::build(&parts).expect("build must succeed");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.scheme, Scheme::HTTPS);
        assert_eq!(req.authority.as_str(), "example.com:8080");
        assert_eq!(req.path, "/path/to%20file");
        assert_eq!(
            req.query,
            vec![
                ("b".to_string(), "2".to_string()),
                ("a".to_string(), "1".to_string()),
                ("flag".to_string(), "".to_string()),
            ]
        );
    }

    #[test]
    fn test_build_without_authority() {
        let parts = parts_of("/relative/only");

        assert!(SigningRequest::build(&parts).is_err());
    }

    #[test]
    fn test_build_does_not_touch_parts() {
        let parts = parts_of("https://example.com/hello?a=1");

        let _ = SigningRequest::build(&parts).expect("build must succeed");
        assert_eq!(parts.uri.to_string(), "https://example.com/hello?a=1");
    }

    #[test]
    fn test_apply_writes_back() {
        let mut parts = parts_of("https://example.com/hello?a=1");

        let mut req = SigningRequest::build(&parts).expect("build must succeed");
        req.headers
            .insert("x-test", HeaderValue::from_static("value"));
        req.query.push(("b".to_string(), "2".to_string()));
        req.apply(&mut parts).expect("apply must succeed");

        assert_eq!(parts.uri.to_string(), "https://example.com/hello?a=1&b=2");
        assert_eq!(parts.headers.get("x-test").unwrap(), "value");
    }
}
