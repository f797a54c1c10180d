//! Outbound finalization and inbound authentication of parameter sets.

use crate::domain::canonical::{canonicalize, canonicalize_excluding};
use crate::domain::constants::{
    FIELD_CERT_ID, FIELD_ENCODING, FIELD_MER_ID, FIELD_SIGNATURE, FIELD_SIGN_METHOD,
    FIELD_SIGN_PUB_KEY_CERT, FIELD_VERSION,
};
use crate::domain::crypto::MerchantKey;
use crate::domain::params::ParameterSet;
use crate::infra::config::GatewayConfig;
use crate::infra::error::{GatewayError, GatewayResult};
use crate::services::signature_engine::SignatureEngine;
use crate::services::trust_store::TrustStore;
use crate::services::verifier_cache::VerifierCache;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;

/// Signs requests with the merchant key and authenticates gateway messages
/// against the pinned trust anchors.
pub struct RequestSigner {
    config: GatewayConfig,
    merchant: Arc<MerchantKey>,
    engine: SignatureEngine,
    trust: TrustStore,
    verifiers: VerifierCache,
}

impl RequestSigner {
    pub fn new(
        config: GatewayConfig,
        merchant: Arc<MerchantKey>,
        trust: TrustStore,
    ) -> GatewayResult<Self> {
        config.validate()?;
        if !trust.is_ready() {
            log::warn!("Trust anchors not loaded; inbound verification will fail until they are");
        }
        let engine = SignatureEngine::signing(merchant.private_key().clone())?;
        Ok(Self {
            config,
            merchant,
            engine,
            trust,
            verifiers: VerifierCache::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn trust_store(&self) -> &TrustStore {
        &self.trust
    }

    #[must_use]
    pub fn verifier_cache(&self) -> &VerifierCache {
        &self.verifiers
    }

    /// Serial of the merchant signing certificate.
    #[must_use]
    pub fn merchant_cert_id(&self) -> &str {
        self.merchant.cert_id()
    }

    /// Add the identity fields and the signature to an outbound request.
    pub fn finalize(&self, mut params: ParameterSet) -> GatewayResult<ParameterSet> {
        params
            .set(FIELD_VERSION, self.config.version.as_str())
            .set(FIELD_ENCODING, self.config.encoding.as_str())
            .set(FIELD_MER_ID, self.config.merchant_id.as_str())
            .set(FIELD_CERT_ID, self.merchant.cert_id())
            .set(FIELD_SIGN_METHOD, self.config.sign_method.as_str());
        params.remove(FIELD_SIGNATURE);

        let signature = self.sign(&params)?;
        params.set(FIELD_SIGNATURE, signature);
        Ok(params)
    }

    /// Base64 signature over the canonical encoding of `params`.
    pub fn sign(&self, params: &ParameterSet) -> GatewayResult<String> {
        let canonical = canonicalize(params);
        let signature = self.engine.sign(canonical.as_bytes())?;
        Ok(STANDARD.encode(signature))
    }

    /// Authenticate a message from the gateway.
    ///
    /// The embedded `signPubKeyCert` must chain to the trust anchors and name
    /// the card network operator; `signature` must verify over every other
    /// field.
    ///
    /// # Errors
    ///
    /// Trust failures from [`TrustStore::verify`], or
    /// [`GatewayError::SignatureMismatch`] when the message is not authentic.
    pub fn verify(&self, params: &ParameterSet) -> GatewayResult<()> {
        let certificate = params.get(FIELD_SIGN_PUB_KEY_CERT).ok_or_else(|| {
            GatewayError::SignatureMismatch(format!("message carries no {FIELD_SIGN_PUB_KEY_CERT}"))
        })?;
        let signature = params.get(FIELD_SIGNATURE).ok_or_else(|| {
            GatewayError::SignatureMismatch(format!("message carries no {FIELD_SIGNATURE}"))
        })?;

        let verifier = self.verifiers.get(certificate, &self.trust)?;
        let signature = STANDARD.decode(signature.trim()).map_err(|e| {
            GatewayError::SignatureMismatch(format!("signature is not valid base64: {e}"))
        })?;

        let canonical = canonicalize_excluding(params, &[FIELD_SIGNATURE]);
        if verifier.verify(canonical.as_bytes(), &signature)? {
            Ok(())
        } else {
            log::warn!("Rejected gateway message with invalid signature");
            Err(GatewayError::SignatureMismatch(
                "signature does not match message content".to_string(),
            ))
        }
    }

    /// Parse a form-encoded notification body and authenticate it.
    pub fn verify_notification(&self, body: &str) -> GatewayResult<ParameterSet> {
        let params = ParameterSet::from_form_body(body);
        self.verify(&params)?;
        Ok(params)
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("merchant_id", &self.config.merchant_id)
            .field("merchant", &self.merchant)
            .field("trust", &self.trust)
            .field("verifiers", &self.verifiers)
            .finish()
    }
}
