//! Block-wise RSA PKCS#1 v1.5 encryption.
//!
//! Plaintext longer than `modulus_len - 11` bytes is cut into blocks of that
//! size; each block is encrypted on its own and the ciphertexts concatenated.

use crate::infra::error::{GatewayError, GatewayResult};
use openssl::pkey::{HasPrivate, HasPublic, PKeyRef};
use openssl::rsa::Padding;

const PKCS1_OVERHEAD: usize = 11;

pub fn encrypt<T: HasPublic>(key: &PKeyRef<T>, plaintext: &[u8]) -> GatewayResult<Vec<u8>> {
    let rsa = key.rsa()?;
    let modulus_len = rsa.size() as usize;
    let block_len = modulus_len - PKCS1_OVERHEAD;

    let mut out = Vec::with_capacity(plaintext.len().div_ceil(block_len) * modulus_len);
    let mut buf = vec![0u8; modulus_len];
    for block in plaintext.chunks(block_len) {
        let written = rsa.public_encrypt(block, &mut buf, Padding::PKCS1)?;
        out.extend_from_slice(&buf[..written]);
    }
    Ok(out)
}

pub fn decrypt<T: HasPrivate>(key: &PKeyRef<T>, ciphertext: &[u8]) -> GatewayResult<Vec<u8>> {
    let rsa = key.rsa()?;
    let modulus_len = rsa.size() as usize;
    if ciphertext.is_empty() || ciphertext.len() % modulus_len != 0 {
        return Err(GatewayError::Cryptographic(format!(
            "ciphertext length {} is not a multiple of the {modulus_len}-byte modulus",
            ciphertext.len()
        )));
    }

    let mut out = Vec::with_capacity(ciphertext.len());
    let mut buf = vec![0u8; modulus_len];
    for block in ciphertext.chunks(modulus_len) {
        let written = rsa
            .private_decrypt(block, &mut buf, Padding::PKCS1)
            .map_err(|e| GatewayError::Cryptographic(format!("RSA decryption failed: {e}")))?;
        out.extend_from_slice(&buf[..written]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::pkey::PKey;
    use openssl::rsa::Rsa;

    #[test]
    fn long_plaintext_spans_several_blocks() {
        let key = PKey::from_rsa(Rsa::generate(1024).unwrap()).unwrap();
        let plaintext = vec![b'x'; 300];

        let ciphertext = encrypt(&key, &plaintext).unwrap();
        // 1024-bit key: 117-byte blocks, so 300 bytes need three.
        assert_eq!(ciphertext.len(), 3 * 128);
        assert_eq!(decrypt(&key, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let key = PKey::from_rsa(Rsa::generate(1024).unwrap()).unwrap();
        let ciphertext = encrypt(&key, b"cvn2=123").unwrap();
        assert!(decrypt(&key, &ciphertext[..100]).is_err());
        assert!(decrypt(&key, &[]).is_err());
    }
}
