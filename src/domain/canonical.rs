//! Canonical encoding of a [`ParameterSet`]: the exact byte input of signing
//! and verification.
//!
//! Names are sorted by byte value and form-urlencoded; values are written
//! verbatim, including any `&` or `=` they contain. Name escaping follows
//! `application/x-www-form-urlencoded` (`*` kept, `~` escaped); gateway field
//! names use neither character.

use super::params::ParameterSet;
use url::form_urlencoded;

/// Encode every field of `params`.
#[must_use]
pub fn canonicalize(params: &ParameterSet) -> String {
    canonicalize_excluding(params, &[])
}

/// Encode every field of `params` except those named in `ignore`.
#[must_use]
pub fn canonicalize_excluding(params: &ParameterSet, ignore: &[&str]) -> String {
    let mut out = String::new();
    for (name, values) in params.iter() {
        if ignore.contains(&name) {
            continue;
        }
        let escaped: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
        for value in values {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(&escaped);
            out.push('=');
            out.push_str(value);
        }
    }
    out
}
