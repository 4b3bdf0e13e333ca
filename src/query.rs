//! `application/x-www-form-urlencoded` parsing into ordered pairs.
//!
//! Used for both the query string and the form body. Order and duplicates
//! are kept; a key without `=` (such as `noParams`) maps to an empty value.

/// Split `input` into decoded `(key, value)` pairs.
pub fn parse_pairs(input: &str) -> Vec<(String, String)> {
    let input = input.strip_prefix('?').unwrap_or(input);
    input
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(part), String::new()),
        })
        .collect()
}

/// Percent-decode one component, treating `+` as a space. Bytes that do not
/// form valid UTF-8 become U+FFFD.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Encode a value for use inside a query string.
pub fn encode_component(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
