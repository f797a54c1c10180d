//! Cryptographic material: certificates, merchant and gateway keys, and
//! block-wise RSA encryption.

pub mod cert;
mod key;
pub mod rsa_blocks;

pub use cert::{common_name, decode_certificate, decode_certificate_text, serial_decimal};
pub use key::{EncryptionCertificate, MerchantKey};
