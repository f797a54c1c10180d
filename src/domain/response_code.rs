//! Gateway `respCode` values.

use std::fmt;

/// Response code returned in `respCode`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseCode(String);

impl ResponseCode {
    pub const SUCCESS: &'static str = "00";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.0 == Self::SUCCESS
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
