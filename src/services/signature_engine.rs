//! Double-hash RSA signatures.
//!
//! `SHA-256(data)` is rendered as lowercase hex, that ASCII text is hashed
//! again with SHA-256, and the second digest is signed with RSA PKCS#1 v1.5
//! (SHA-256 `DigestInfo`). Signing the hex text through an OpenSSL SHA-256
//! signer performs the second hash and the padding in one step.

use crate::infra::error::{GatewayError, GatewayResult};
use openssl::hash::MessageDigest;
use openssl::pkey::{Id, PKey, Private, Public};
use openssl::rsa::Padding;
use openssl::sign::{Signer, Verifier};
use openssl::x509::X509Ref;
use sha2::{Digest, Sha256};
use std::fmt;

enum EngineKey {
    Signing(PKey<Private>),
    Verifying(PKey<Public>),
}

/// Signs or verifies canonical byte strings with one RSA key.
pub struct SignatureEngine {
    key: EngineKey,
}

impl SignatureEngine {
    /// Engine able to sign and verify.
    pub fn signing(private_key: PKey<Private>) -> GatewayResult<Self> {
        Self::require_rsa(private_key.id())?;
        Ok(Self {
            key: EngineKey::Signing(private_key),
        })
    }

    /// Verify-only engine.
    pub fn verifying(public_key: PKey<Public>) -> GatewayResult<Self> {
        Self::require_rsa(public_key.id())?;
        Ok(Self {
            key: EngineKey::Verifying(public_key),
        })
    }

    /// Verify-only engine bound to a certificate's public key.
    pub fn for_certificate(certificate: &X509Ref) -> GatewayResult<Self> {
        Self::verifying(certificate.public_key()?)
    }

    fn require_rsa(id: Id) -> GatewayResult<()> {
        if id == Id::RSA {
            Ok(())
        } else {
            Err(GatewayError::Cryptographic(format!(
                "signature engine requires an RSA key, got {id:?}"
            )))
        }
    }

    #[must_use]
    pub fn can_sign(&self) -> bool {
        matches!(self.key, EngineKey::Signing(_))
    }

    /// Lowercase hex of `SHA-256(data)`: the message the RSA step signs.
    #[must_use]
    pub fn first_digest_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Sign `data`.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] on a verify-only engine.
    pub fn sign(&self, data: &[u8]) -> GatewayResult<Vec<u8>> {
        let EngineKey::Signing(private_key) = &self.key else {
            return Err(GatewayError::Configuration(
                "signing requires a private key".to_string(),
            ));
        };

        let digest_hex = Self::first_digest_hex(data);
        let mut signer = Signer::new(MessageDigest::sha256(), private_key)?;
        signer.set_rsa_padding(Padding::PKCS1)?;
        signer.update(digest_hex.as_bytes())?;
        Ok(signer.sign_to_vec()?)
    }

    /// Check `signature` over `data`.
    ///
    /// A mismatch, including a malformed signature value, is `Ok(false)`.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> GatewayResult<bool> {
        let digest_hex = Self::first_digest_hex(data);
        let mut verifier = match &self.key {
            EngineKey::Signing(key) => Verifier::new(MessageDigest::sha256(), key)?,
            EngineKey::Verifying(key) => Verifier::new(MessageDigest::sha256(), key)?,
        };
        verifier.set_rsa_padding(Padding::PKCS1)?;
        verifier.update(digest_hex.as_bytes())?;

        match verifier.verify(signature) {
            Ok(valid) => Ok(valid),
            Err(e) => {
                log::debug!("signature rejected by RSA verification: {e}");
                Ok(false)
            }
        }
    }
}

impl fmt::Debug for SignatureEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.can_sign() { "signing" } else { "verifying" };
        write!(f, "SignatureEngine({mode})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::rsa::Rsa;

    fn key_pair() -> (PKey<Private>, PKey<Public>) {
        let rsa = Rsa::generate(2048).unwrap();
        let private_key = PKey::from_rsa(rsa).unwrap();
        let public_der = private_key.public_key_to_der().unwrap();
        let public_key = PKey::public_key_from_der(&public_der).unwrap();
        (private_key, public_key)
    }

    #[test]
    fn first_digest_is_lowercase_hex_sha256() {
        assert_eq!(
            SignatureEngine::first_digest_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sign_then_verify_round_trip() {
        let (private_key, public_key) = key_pair();
        let signer = SignatureEngine::signing(private_key).unwrap();
        let verifier = SignatureEngine::verifying(public_key).unwrap();

        let signature = signer.sign(b"a=1&b=2").unwrap();
        assert_eq!(signature.len(), 256);
        assert!(verifier.verify(b"a=1&b=2", &signature).unwrap());
        assert!(signer.verify(b"a=1&b=2", &signature).unwrap());
    }

    #[test]
    fn tampered_data_fails_verification() {
        let (private_key, public_key) = key_pair();
        let signer = SignatureEngine::signing(private_key).unwrap();
        let verifier = SignatureEngine::verifying(public_key).unwrap();

        let signature = signer.sign(b"a=1&b=2").unwrap();
        assert!(!verifier.verify(b"a=1&b=3", &signature).unwrap());
    }

    #[test]
    fn malformed_signature_is_a_mismatch() {
        let (_, public_key) = key_pair();
        let verifier = SignatureEngine::verifying(public_key).unwrap();
        assert!(!verifier.verify(b"a=1", b"short").unwrap());
    }

    #[test]
    fn single_hash_signature_is_rejected() {
        let (private_key, public_key) = key_pair();
        let mut plain = Signer::new(MessageDigest::sha256(), &private_key).unwrap();
        plain.update(b"a=1&b=2").unwrap();
        let single_hash = plain.sign_to_vec().unwrap();

        let verifier = SignatureEngine::verifying(public_key).unwrap();
        assert!(!verifier.verify(b"a=1&b=2", &single_hash).unwrap());
    }

    #[test]
    fn verify_only_engine_cannot_sign() {
        let (_, public_key) = key_pair();
        let verifier = SignatureEngine::verifying(public_key).unwrap();
        assert!(!verifier.can_sign());
        let err = verifier.sign(b"data").unwrap_err();
        assert!(err.is_configuration());
    }
}
