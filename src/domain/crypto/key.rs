//! Merchant key material and the gateway encryption certificate.

use super::cert;
use crate::infra::error::{GatewayError, GatewayResult};
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{Id, PKey, Private, Public};
use openssl::x509::X509Ref;
use std::fmt;
use std::path::Path;

/// Merchant RSA private key and the serial of its certificate.
///
/// Loaded once from the PKCS#12 container issued by the gateway. The key is
/// only reachable inside the crate.
pub struct MerchantKey {
    private_key: PKey<Private>,
    cert_id: String,
}

impl MerchantKey {
    /// Decode a PKCS#12 container.
    pub fn from_pkcs12(der: &[u8], password: &str) -> GatewayResult<Self> {
        let parsed = Pkcs12::from_der(der)
            .and_then(|p12| p12.parse2(password))
            .map_err(|e| GatewayError::KeyContainer(format!("Failed to open PKCS#12: {e}")))?;

        let private_key = parsed
            .pkey
            .ok_or_else(|| GatewayError::KeyContainer("container holds no private key".into()))?;
        if private_key.id() != Id::RSA {
            return Err(GatewayError::KeyContainer(
                "key is not an RSA private key".to_string(),
            ));
        }
        let certificate = parsed
            .cert
            .ok_or_else(|| GatewayError::KeyContainer("container holds no certificate".into()))?;

        let cert_id = cert::serial_decimal(&certificate)?;
        log::info!("Loaded merchant signing key, certId={cert_id}");
        Ok(Self {
            private_key,
            cert_id,
        })
    }

    /// Read and decode a PKCS#12 file.
    pub fn from_pkcs12_file<P: AsRef<Path>>(path: P, password: &str) -> GatewayResult<Self> {
        let data = std::fs::read(path.as_ref()).map_err(|e| {
            GatewayError::Io(format!(
                "Failed to read key container {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_pkcs12(&data, password)
    }

    /// Serial number of the merchant certificate (the `certId` field).
    #[must_use]
    pub fn cert_id(&self) -> &str {
        &self.cert_id
    }

    pub(crate) fn private_key(&self) -> &PKey<Private> {
        &self.private_key
    }
}

impl fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MerchantKey(cert_id={}, key=[REDACTED])", self.cert_id)
    }
}

/// Gateway public encryption key plus its certificate serial.
///
/// Immutable once built; a reload publishes a whole new value.
#[derive(Clone)]
pub struct EncryptionCertificate {
    public_key: PKey<Public>,
    cert_id: String,
}

impl EncryptionCertificate {
    pub fn from_x509(certificate: &X509Ref) -> GatewayResult<Self> {
        let public_key = certificate.public_key()?;
        if public_key.id() != Id::RSA {
            return Err(GatewayError::CertificateParse(
                "encryption certificate does not carry an RSA key".to_string(),
            ));
        }
        Ok(Self {
            public_key,
            cert_id: cert::serial_decimal(certificate)?,
        })
    }

    /// Decode from PEM text or DER bytes.
    pub fn from_bytes(data: &[u8]) -> GatewayResult<Self> {
        let certificate = cert::decode_certificate(data)?;
        Self::from_x509(&certificate)
    }

    #[must_use]
    pub fn cert_id(&self) -> &str {
        &self.cert_id
    }

    pub(crate) fn public_key(&self) -> &PKey<Public> {
        &self.public_key
    }
}

impl fmt::Debug for EncryptionCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionCertificate(cert_id={})", self.cert_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_container_is_rejected() {
        let err = MerchantKey::from_pkcs12(b"not pkcs12", "000000").unwrap_err();
        assert!(matches!(err, GatewayError::KeyContainer(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = MerchantKey::from_pkcs12_file("/nonexistent/acp_sign.pfx", "000000").unwrap_err();
        assert!(matches!(err, GatewayError::Io(_)));
    }
}
