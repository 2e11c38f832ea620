//! Query-string encoding.
//!
//! Two encode sets are used on the wire. Signed query parameters escape
//! everything outside the URI-component unreserved set, while query strings
//! appended to request paths keep the reserved URI delimiters intact.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped when encoding a single URI component.
/// Unreserved: ALPHA / DIGIT / "-" / "_" / "." / "!" / "~" / "*" / "'" / "(" / ")"
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Characters escaped when encoding a whole URI. Reserved delimiters pass through.
const URI_ENCODE_SET: &AsciiSet = &COMPONENT_ENCODE_SET
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

/// Percent-encode a single URI component.
pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT_ENCODE_SET).to_string()
}

/// Percent-encode a URI, leaving reserved delimiters untouched.
pub fn encode_uri(value: &str) -> String {
    utf8_percent_encode(value, URI_ENCODE_SET).to_string()
}

/// Serialize parameters as `name=value&name=value`, component-encoded, in
/// the order given.
pub fn encode_params<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                encode_uri_component(name.as_ref()),
                encode_uri_component(value.as_ref())
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Build a `?name=value&...` suffix for a request path.
///
/// Returns an empty string when there are no parameters.
///
/// ```rust
/// use etvas_sdk::signing::query_string;
///
/// assert_eq!(query_string(&[("foo", "bar"), ("valid", "1")]), "?foo=bar&valid=1");
/// assert_eq!(query_string::<&str, &str>(&[]), "");
/// ```
pub fn query_string<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return String::new();
    }

    let joined = params
        .iter()
        .map(|(name, value)| format!("{}={}", encode_uri(name.as_ref()), encode_uri(value.as_ref())))
        .collect::<Vec<_>>()
        .join("&");
    format!("?{}", joined)
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
