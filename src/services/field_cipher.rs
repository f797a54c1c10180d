//! Sensitive cardholder field protection.
//!
//! Outbound values are encrypted with the gateway's encryption certificate;
//! inbound ciphertext is decrypted with the merchant private key. The
//! encryption certificate is published as an immutable snapshot and replaced
//! wholesale on every load, so a concurrent reload never exposes a key from
//! one certificate paired with the serial of another.

use crate::domain::canonical::canonicalize;
use crate::domain::constants::{
    FIELD_CERTIF_ID, FIELD_CERTIF_TP, FIELD_CUSTOMER_NM, FIELD_CVN2, FIELD_ENCRYPTED_INFO,
    FIELD_EXPIRED, FIELD_PHONE_NO, FIELD_PIN, FIELD_SMS_CODE,
};
use crate::domain::crypto::{rsa_blocks, EncryptionCertificate, MerchantKey};
use crate::domain::customer::{present, CustomerInfo};
use crate::domain::params::ParameterSet;
use crate::domain::pin_block::PinBlock;
use crate::infra::error::{GatewayError, GatewayResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

pub struct SensitiveFieldCipher {
    merchant: Arc<MerchantKey>,
    encryption: RwLock<Option<Arc<EncryptionCertificate>>>,
}

impl SensitiveFieldCipher {
    /// Cipher with no encryption certificate loaded yet.
    #[must_use]
    pub fn new(merchant: Arc<MerchantKey>) -> Self {
        Self {
            merchant,
            encryption: RwLock::new(None),
        }
    }

    /// Publish a new encryption certificate, replacing any previous one.
    pub fn install(&self, certificate: EncryptionCertificate) {
        log::info!(
            "Installed sensitive-information encryption certificate, encryptCertId={}",
            certificate.cert_id()
        );
        *self
            .encryption
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(certificate));
    }

    /// Load the encryption certificate from PEM text.
    pub fn load_certificate(&self, text: &str) -> GatewayResult<()> {
        self.install(EncryptionCertificate::from_bytes(text.as_bytes())?);
        Ok(())
    }

    /// Load the encryption certificate from a PEM or DER file.
    pub fn load_certificate_from_file<P: AsRef<Path>>(&self, path: P) -> GatewayResult<()> {
        let data = std::fs::read(path.as_ref()).map_err(|e| {
            GatewayError::Io(format!(
                "Failed to read encryption certificate {}: {e}",
                path.as_ref().display()
            ))
        })?;
        self.install(EncryptionCertificate::from_bytes(&data)?);
        Ok(())
    }

    /// Current certificate snapshot.
    #[must_use]
    pub fn certificate(&self) -> Option<Arc<EncryptionCertificate>> {
        self.encryption
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Serial of the loaded certificate, for the `encryptCertId` field.
    #[must_use]
    pub fn encryption_cert_id(&self) -> Option<String> {
        self.certificate().map(|cert| cert.cert_id().to_string())
    }

    fn require_certificate(&self) -> GatewayResult<Arc<EncryptionCertificate>> {
        self.certificate().ok_or_else(|| {
            GatewayError::Configuration(
                "encryption certificate not loaded; load it from the gateway or a file first"
                    .to_string(),
            )
        })
    }

    /// Encrypt a single field value (for example `accNo`) as base64.
    pub fn encrypt(&self, plaintext: &str) -> GatewayResult<String> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> GatewayResult<String> {
        let certificate = self.require_certificate()?;
        Self::encrypt_with(&certificate, plaintext)
    }

    /// Build and encrypt the PIN block for `pan`, as base64.
    pub fn encrypt_pin(&self, pan: &str, pin: &str) -> GatewayResult<String> {
        let certificate = self.require_certificate()?;
        let block = PinBlock::build(pan, pin)?;
        Self::encrypt_with(&certificate, block.as_bytes())
    }

    fn encrypt_with(certificate: &EncryptionCertificate, plaintext: &[u8]) -> GatewayResult<String> {
        let ciphertext = rsa_blocks::encrypt(certificate.public_key(), plaintext)?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Encode `customer` for the `customerInfo` field.
    ///
    /// The PIN travels as an encrypted PIN block in `pin`; CVN2, expiry and
    /// phone number are encrypted together into `encryptedInfo`; the rest
    /// stays in clear text. The result is `base64("{" + canonical + "}")`, or
    /// the empty string when `customer` carries nothing.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] if no encryption certificate is loaded
    /// and `customer` is not empty; [`GatewayError::InvalidInput`] for a PIN
    /// with an unusable account number.
    pub fn protect(&self, customer: &CustomerInfo, account_number: &str) -> GatewayResult<String> {
        if customer.is_empty() {
            return Ok(String::new());
        }
        let certificate = self.require_certificate()?;

        let mut plain = ParameterSet::new();
        for (name, field) in [
            (FIELD_CERTIF_TP, &customer.cert_type),
            (FIELD_CERTIF_ID, &customer.cert_id),
            (FIELD_CUSTOMER_NM, &customer.name),
            (FIELD_SMS_CODE, &customer.sms_code),
        ] {
            if let Some(value) = present(field) {
                plain.set(name, value);
            }
        }

        if let Some(pin) = present(&customer.pin) {
            let block = PinBlock::build(account_number, pin)?;
            plain.set(FIELD_PIN, Self::encrypt_with(&certificate, block.as_bytes())?);
        }

        let mut protected = ParameterSet::new();
        for (name, field) in [
            (FIELD_CVN2, &customer.cvn2),
            (FIELD_EXPIRED, &customer.expired),
            (FIELD_PHONE_NO, &customer.phone_no),
        ] {
            if let Some(value) = present(field) {
                protected.set(name, value);
            }
        }

        let protected_encoding = canonicalize(&protected);
        if !protected_encoding.is_empty() {
            plain.set(
                FIELD_ENCRYPTED_INFO,
                Self::encrypt_with(&certificate, protected_encoding.as_bytes())?,
            );
        }

        log::debug!(
            "Protected customer info: {} clear fields, {} encrypted fields",
            plain.len(),
            protected.len()
        );

        let encoded = canonicalize(&plain);
        Ok(STANDARD.encode(format!("{{{encoded}}}")))
    }

    /// Decrypt a base64 value returned by the gateway with the merchant key.
    pub fn decrypt(&self, ciphertext_b64: &str) -> GatewayResult<String> {
        let ciphertext = STANDARD.decode(ciphertext_b64.trim())?;
        let plaintext = rsa_blocks::decrypt(self.merchant.private_key(), &ciphertext)?;
        String::from_utf8(plaintext)
            .map_err(|e| GatewayError::Encoding(format!("decrypted value is not UTF-8: {e}")))
    }
}

impl std::fmt::Debug for SensitiveFieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveFieldCipher")
            .field("merchant", &self.merchant)
            .field("encryption", &self.certificate())
            .finish()
    }
}
