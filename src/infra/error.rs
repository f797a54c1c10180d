//! Error types for gateway signing, verification and field protection.

use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error taxonomy for the gateway core.
///
/// Trust failures ([`ChainValidation`](Self::ChainValidation),
/// [`UntrustedIssuer`](Self::UntrustedIssuer)) and
/// [`SignatureMismatch`](Self::SignatureMismatch) are terminal for the message
/// they belong to. Nothing in this crate retries on any variant.
#[derive(Error, Debug, miette::Diagnostic)]
pub enum GatewayError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Certificate parse error: {0}")]
    CertificateParse(String),

    #[error("Certificate chain validation failed: {0}")]
    ChainValidation(String),

    #[error("Untrusted certificate issuer: {0}")]
    #[diagnostic(help("the leaf common name must carry the card network operator in its third '@' segment"))]
    UntrustedIssuer(String),

    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Key container error: {0}")]
    KeyContainer(String),

    #[error("Cryptographic error: {0}")]
    Cryptographic(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway rejected request: {code} - {message}")]
    Gateway { code: String, message: String },
}

impl GatewayError {
    /// True for chain validation and issuer identity failures.
    #[must_use]
    pub fn is_trust_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::ChainValidation(_) | GatewayError::UntrustedIssuer(_)
        )
    }

    /// True when an operation was invoked before its required setup.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, GatewayError::Configuration(_))
    }
}

impl From<openssl::error::ErrorStack> for GatewayError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        GatewayError::Cryptographic(error.to_string())
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(error: std::io::Error) -> Self {
        GatewayError::Io(error.to_string())
    }
}

impl From<base64::DecodeError> for GatewayError {
    fn from(error: base64::DecodeError) -> Self {
        GatewayError::Encoding(format!("invalid base64: {error}"))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        GatewayError::Network(error.to_string())
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(error: toml::de::Error) -> Self {
        GatewayError::Configuration(format!("Failed to parse config file: {error}"))
    }
}

impl From<toml::ser::Error> for GatewayError {
    fn from(error: toml::ser::Error) -> Self {
        GatewayError::Configuration(format!("Failed to serialize config: {error}"))
    }
}
