//! Multi-valued string parameter set exchanged with the gateway.
//!
//! Keys are kept in a `BTreeMap`, so iteration is already in ascending byte
//! order of the field name. Values of one key keep their insertion order.

use crate::infra::error::{GatewayError, GatewayResult};
use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

/// Field name → one or more string values.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    fields: BTreeMap<String, Vec<String>>,
}

impl ParameterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(key.into(), vec![value.into()]);
        self
    }

    /// Append `value` to the values of `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.entry(key.into()).or_default().push(value.into());
        self
    }

    /// First value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.fields.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of distinct field names
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in ascending byte order of their names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Flatten into `(name, value)` pairs for a form-encoding transport.
    #[must_use]
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.clone(), v.clone())))
            .collect()
    }

    /// Parse a gateway back-channel response body.
    ///
    /// Keys are form-unescaped; values are kept exactly as received, because
    /// the gateway signs the raw value text. A segment containing `;` or a
    /// field name with a malformed escape is an encoding error.
    pub fn parse_response(body: &str) -> GatewayResult<Self> {
        let mut params = Self::new();
        let mut first_error: Option<GatewayError> = None;

        for segment in body.split('&') {
            if segment.contains(';') {
                first_error.get_or_insert_with(|| {
                    GatewayError::Encoding("invalid semicolon separator in response".to_string())
                });
                continue;
            }
            if segment.is_empty() {
                continue;
            }
            let (raw_key, value) = segment.split_once('=').unwrap_or((segment, ""));
            match unescape_key(raw_key) {
                Ok(key) => {
                    params.add(key, value);
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(params),
        }
    }

    /// Parse a response body received as raw bytes; non UTF-8 input is an
    /// encoding error.
    pub fn parse_response_bytes(body: &[u8]) -> GatewayResult<Self> {
        let text = std::str::from_utf8(body)
            .map_err(|e| GatewayError::Encoding(format!("response is not valid UTF-8: {e}")))?;
        Self::parse_response(text)
    }

    /// Parse an `application/x-www-form-urlencoded` notification body.
    /// Both keys and values are unescaped.
    #[must_use]
    pub fn from_form_body(body: &str) -> Self {
        form_urlencoded::parse(body.as_bytes())
            .filter(|(key, _)| !key.is_empty())
            .fold(Self::new(), |mut params, (key, value)| {
                params.add(key.into_owned(), value.into_owned());
                params
            })
    }
}

/// Strict form-unescape of a field name: `+` is a space, every `%` must be
/// followed by two hex digits, and the result must be UTF-8.
fn unescape_key(raw_key: &str) -> GatewayResult<String> {
    let bytes = raw_key.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let escape = bytes.get(i + 1..i + 3).ok_or_else(|| invalid_escape(raw_key))?;
                let mut decoded = [0u8; 1];
                hex::decode_to_slice(escape, &mut decoded)
                    .map_err(|_| invalid_escape(raw_key))?;
                out.push(decoded[0]);
                i += 2;
            }
            byte => out.push(byte),
        }
        i += 1;
    }
    String::from_utf8(out).map_err(|_| {
        GatewayError::Encoding(format!("field name '{raw_key}' is not UTF-8 once unescaped"))
    })
}

fn invalid_escape(raw_key: &str) -> GatewayError {
    GatewayError::Encoding(format!("invalid URL escape in field name '{raw_key}'"))
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.add(key, value);
        }
        params
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ParameterSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}

// Values may carry cardholder data; only names are printed.
impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.fields.keys()).finish()
    }
}
