//! Service layer module root.
//! Signing, trust validation, verifier caching and field protection.

pub mod field_cipher;
pub mod gateway_client;
pub mod request_signer;
pub mod signature_engine;
pub mod trust_store;
pub mod verifier_cache;

pub use field_cipher::SensitiveFieldCipher;
pub use gateway_client::GatewayClient;
pub use request_signer::RequestSigner;
pub use signature_engine::SignatureEngine;
pub use trust_store::{LeafValidator, TrustStore};
pub use verifier_cache::VerifierCache;
