//! UnionPay gateway trust and field-protection core.
//!
//! Builds the canonical encoding of request parameters, signs it with the
//! merchant's RSA key, authenticates gateway responses and notifications
//! against pinned root and intermediate certificates, and protects sensitive
//! cardholder fields with the gateway's encryption certificate.
//!
//! ```no_run
//! use std::sync::Arc;
//! use unionpay_gateway::{GatewayConfig, MerchantKey, ParameterSet, RequestSigner, TrustStore};
//!
//! # fn main() -> unionpay_gateway::GatewayResult<()> {
//! let merchant = Arc::new(MerchantKey::from_pkcs12_file("acp_sign.pfx", "000000")?);
//! let mut trust = TrustStore::new();
//! trust.load_root_from_file("acp_root.cer")?;
//! trust.load_intermediate_from_file("acp_middle.cer")?;
//!
//! let signer = RequestSigner::new(GatewayConfig::sandbox("777290058165621"), merchant, trust)?;
//! let mut params = ParameterSet::new();
//! params.set("txnType", "01").set("txnAmt", "100");
//! let signed = signer.finalize(params)?;
//! assert!(signed.contains("signature"));
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

pub use adapters::gateway_http_client::{GatewayTransport, HttpTransport, HttpTransportConfig};
pub use domain::canonical::{canonicalize, canonicalize_excluding};
pub use domain::crypto::{EncryptionCertificate, MerchantKey};
pub use domain::customer::CustomerInfo;
pub use domain::params::ParameterSet;
pub use domain::pin_block::PinBlock;
pub use domain::response_code::ResponseCode;
pub use infra::config::{ConfigManager, CredentialPaths, Environment, GatewayConfig};
pub use infra::error::{GatewayError, GatewayResult};
pub use services::{
    GatewayClient, LeafValidator, RequestSigner, SensitiveFieldCipher, SignatureEngine,
    TrustStore, VerifierCache,
};
