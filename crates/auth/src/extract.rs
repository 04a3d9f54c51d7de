//! Credential extraction from request headers.

use http::HeaderMap;
use http::header::HeaderName;

/// Normalize a configured header name into HTTP form.
///
/// One rule: a CGI-style name (`HTTP_AUTHORIZATION`) loses its `HTTP_`
/// prefix and maps `_` to `-`. Names already in HTTP form pass through
/// unchanged; matching against the header map is case-insensitive either
/// way.
pub(crate) fn normalize_header_name(configured: &str) -> String {
    match configured.strip_prefix("HTTP_") {
        Some(stripped) => stripped.replace('_', "-"),
        None => configured.to_string(),
    }
}

/// Pull the bearer token out of a header map.
///
/// The header value must consist of exactly two whitespace-separated
/// fields, the first matching the configured scheme prefix
/// case-insensitively (RFC 7235). Anything else - missing header, wrong
/// scheme, no token, trailing fields, non-UTF-8 bytes - is absence, never
/// an error: a malformed scheme is indistinguishable from "no credential
/// supplied" at this layer.
pub(crate) fn extract_credential<'h>(
    headers: &'h HeaderMap,
    header_name: &HeaderName,
    prefix: &str,
) -> Option<&'h str> {
    let value = headers.get(header_name)?.to_str().ok()?;

    let mut fields = value.split_whitespace();
    let scheme = fields.next()?;
    let token = fields.next()?;

    if fields.next().is_some() {
        return None;
    }

    if !scheme.eq_ignore_ascii_case(prefix) {
        return None;
    }

    Some(token)
}
