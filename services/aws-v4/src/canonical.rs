//! Canonicalization of the request pieces covered by the signature.
//!
//! The byte layout produced here is a contract shared with the remote
//! verifier: field order, separators, encoding and sorting must match it
//! exactly or the signature is rejected.

use std::fmt::Write;

use http::uri::{Authority, Scheme};
use http::HeaderMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode};

use cloudsig_core::{Error, Result, SigningRequest};

use crate::constants::{AWS_QUERY_ENCODE_SET, AWS_URI_ENCODE_SET};

/// Header counts up to this use insertion sort; anything larger falls back
/// to the stdlib sort. Requests rarely carry more.
const HEADER_SORT_INLINE_MAX: usize = 16;

/// Percent-encode the request path.
///
/// `/` stays literal; every other byte outside the unreserved set
/// (`A-Z a-z 0-9 - _ . ~`) is escaped as uppercase hex. The incoming path
/// is decoded first so pre-encoded input is not double-encoded. An empty
/// path canonicalizes to `/`.
pub(crate) fn canonical_uri(path: &str) -> Result<String> {
    if path.is_empty() {
        return Ok("/".to_string());
    }

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|e| Error::request_invalid(format!("request path is not valid utf-8: {e}")))?;
    Ok(utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string())
}

/// Encode and sort query parameters.
///
/// Every pair is encoded first; ordering is byte-wise over the encoded
/// name and, between identical names, the encoded value.
pub(crate) fn canonical_query(query: &[(String, String)]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
    pairs.sort();

    pairs
}

/// Join encoded pairs into the canonical query line.
///
/// Parameters without a value still carry their `=`. No parameters yields
/// an empty string; the canonical request keeps the empty line.
pub(crate) fn query_to_string(pairs: &[(String, String)]) -> String {
    let mut s = String::with_capacity(pairs.iter().map(|(k, v)| k.len() + v.len() + 2).sum());

    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            s.push('&');
        }
        s.push_str(k);
        s.push('=');
        s.push_str(v);
    }

    s
}

/// Host header value: the authority host, keeping the port only when it is
/// not the default for the scheme.
pub(crate) fn host_header(scheme: &Scheme, authority: &Authority) -> String {
    match authority.port_u16() {
        Some(port) if !is_default_port(scheme, port) => {
            format!("{}:{}", authority.host(), port)
        }
        _ => authority.host().to_string(),
    }
}

fn is_default_port(scheme: &Scheme, port: u16) -> bool {
    (*scheme == Scheme::HTTP && port == 80) || (*scheme == Scheme::HTTPS && port == 443)
}

/// Collect the signed header set from the header map.
///
/// Names stay in the lowercase form `http` already stores and come back
/// sorted. Each value is trimmed with inner space/tab runs collapsed to a
/// single space; multiple values join with a bare comma.
pub(crate) fn signed_headers(headers: &HeaderMap) -> Result<Vec<(&str, String)>> {
    let mut entries = Vec::with_capacity(headers.keys_len());

    for name in headers.keys() {
        let mut value = String::new();
        for (i, v) in headers.get_all(name).iter().enumerate() {
            if i > 0 {
                value.push(',');
            }
            append_normalized(&mut value, v.to_str()?);
        }
        entries.push((name.as_str(), value));
    }
    sort_by_name(&mut entries);

    Ok(entries)
}

/// Append `value` with surrounding whitespace trimmed and internal runs of
/// space/tab collapsed to a single space.
fn append_normalized(out: &mut String, value: &str) {
    let mut in_run = false;
    for c in value.trim_matches(|c| c == ' ' || c == '\t').chars() {
        if c == ' ' || c == '\t' {
            in_run = true;
            continue;
        }
        if in_run {
            out.push(' ');
            in_run = false;
        }
        out.push(c);
    }
}

/// Byte-wise sort over header names. Small sets skip the stdlib sort
/// machinery entirely.
fn sort_by_name(entries: &mut [(&str, String)]) {
    if entries.len() <= HEADER_SORT_INLINE_MAX {
        for i in 1..entries.len() {
            let mut j = i;
            while j > 0 && entries[j - 1].0 > entries[j].0 {
                entries.swap(j - 1, j);
                j -= 1;
            }
        }
    } else {
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    }
}

/// Lowercase header names joined with `;`, in signed order.
pub(crate) fn signed_header_list(headers: &[(&str, String)]) -> String {
    headers
        .iter()
        .map(|(k, _)| *k)
        .collect::<Vec<_>>()
        .join(";")
}

/// Assemble the canonical request text.
///
/// In order, separated by `\n`: method, canonical URI, canonical query,
/// one `name:value` line per signed header, a blank line, the
/// signed-header list, and the payload hash. Only the SHA-256 of this
/// block leaves the signer.
pub(crate) fn canonical_request(
    req: &SigningRequest,
    headers: &[(&str, String)],
    payload_hash: &str,
) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    writeln!(f, "{}", req.method)?;
    writeln!(f, "{}", canonical_uri(&req.path)?)?;
    writeln!(f, "{}", query_to_string(&req.query))?;
    for (name, value) in headers {
        writeln!(f, "{name}:{value}")?;
    }
    writeln!(f)?;
    writeln!(f, "{}", signed_header_list(headers))?;
    write!(f, "{payload_hash}")?;

    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::HeaderValue;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("", "/"; "empty path")]
    #[test_case("/", "/"; "root")]
    #[test_case("/hello/world", "/hello/world"; "plain segments")]
    #[test_case("/path/to file", "/path/to%20file"; "space")]
    #[test_case("/path/to%20file", "/path/to%20file"; "already encoded")]
    #[test_case("/a~b_c-d.e", "/a~b_c-d.e"; "unreserved passthrough")]
    #[test_case("/caf\u{e9}", "/caf%C3%A9"; "utf8 escape")]
    fn test_canonical_uri(input: &str, expected: &str) {
        assert_eq!(canonical_uri(input).expect("must encode"), expected);
    }

    #[test]
    fn test_canonical_query_sorts_by_name_then_value() {
        let query = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];

        let pairs = canonical_query(&query);
        assert_eq!(query_to_string(&pairs), "a=1&a=2&b=2");
    }

    #[test]
    fn test_canonical_query_encodes_both_sides() {
        let query = vec![("key with space".to_string(), "a/b&c".to_string())];

        let pairs = canonical_query(&query);
        assert_eq!(query_to_string(&pairs), "key%20with%20space=a%2Fb%26c");
    }

    #[test]
    fn test_canonical_query_empty_value_keeps_equals() {
        let query = vec![("flag".to_string(), "".to_string())];

        assert_eq!(query_to_string(&canonical_query(&query)), "flag=");
    }

    #[test]
    fn test_query_to_string_empty() {
        assert_eq!(query_to_string(&[]), "");
    }

    #[test_case("https", "example.com", "example.com"; "no port")]
    #[test_case("https", "example.com:443", "example.com"; "default https port")]
    #[test_case("http", "example.com:80", "example.com"; "default http port")]
    #[test_case("https", "example.com:8443", "example.com:8443"; "custom https port")]
    #[test_case("http", "127.0.0.1:9000", "127.0.0.1:9000"; "custom http port")]
    fn test_host_header(scheme: &str, authority: &str, expected: &str) {
        let scheme: Scheme = scheme.parse().expect("scheme must be valid");
        let authority: Authority = authority.parse().expect("authority must be valid");

        assert_eq!(host_header(&scheme, &authority), expected);
    }

    #[test]
    fn test_signed_headers_normalizes_values() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-custom",
            HeaderValue::from_static("  spaced \t\t out  value  "),
        );

        let entries = signed_headers(&headers).expect("must collect");
        assert_eq!(entries, vec![("x-custom", "spaced out value".to_string())]);
    }

    #[test]
    fn test_signed_headers_joins_multi_values() {
        let mut headers = HeaderMap::new();
        headers.append("x-multi", HeaderValue::from_static(" one "));
        headers.append("x-multi", HeaderValue::from_static("two"));

        let entries = signed_headers(&headers).expect("must collect");
        assert_eq!(entries, vec![("x-multi", "one,two".to_string())]);
    }

    #[test]
    fn test_signed_headers_sorted_case_insensitively() {
        let mut headers = HeaderMap::new();
        // HeaderMap lowercases names on insert.
        headers.insert("Zebra", HeaderValue::from_static("z"));
        headers.insert("alpha", HeaderValue::from_static("a"));
        headers.insert("Host", HeaderValue::from_static("example.com"));

        let names: Vec<&str> = signed_headers(&headers)
            .expect("must collect")
            .iter()
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(names, vec!["alpha", "host", "zebra"]);
    }

    #[test]
    fn test_signed_headers_dedup_case_insensitive_names() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Custom", HeaderValue::from_static("first"));
        headers.insert("x-custom", HeaderValue::from_static("second"));

        let entries = signed_headers(&headers).expect("must collect");
        assert_eq!(entries, vec![("x-custom", "second".to_string())]);
    }

    #[test]
    fn test_sort_by_name_large_set_matches_insertion_sort() {
        let mut headers = HeaderMap::new();
        // Push past the insertion-sort threshold.
        for i in 0..24 {
            let name: http::header::HeaderName =
                format!("x-header-{:02}", 23 - i).parse().expect("valid");
            headers.insert(name, HeaderValue::from_static("v"));
        }

        let entries = signed_headers(&headers).expect("must collect");
        let mut expected: Vec<String> = (0..24).map(|i| format!("x-header-{i:02}")).collect();
        expected.sort();
        let got: Vec<&str> = entries.iter().map(|(k, _)| *k).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_canonical_request_layout() {
        let parts = {
            let mut req = http::Request::new(());
            *req.uri_mut() = "https://example.com/hello?b=2&a=1"
                .parse()
                .expect("uri must be valid");
            req.into_parts().0
        };
        let mut sreq = SigningRequest::build(&parts).expect("must build");
        sreq.headers
            .insert("host", HeaderValue::from_static("example.com"));
        sreq.query = canonical_query(&sreq.query);

        let headers = signed_headers(&sreq.headers).expect("must collect");
        let creq =
            canonical_request(&sreq, &headers, "UNUSED-HASH-PLACEHOLDER").expect("must build");

        assert_eq!(
            creq,
            "GET\n\
             /hello\n\
             a=1&b=2\n\
             host:example.com\n\
             \n\
             host\n\
             UNUSED-HASH-PLACEHOLDER"
        );
    }
}
