//! Gateway trust anchors and leaf certificate validation.
//!
//! The root is the only trusted certificate; the intermediate and the root are
//! offered as untrusted chain material. A leaf that chains successfully must
//! also name the card network operator in the third `@` segment of its
//! subject common name.

use crate::domain::constants::UNIONPAY_ISSUER_NAME;
use crate::domain::crypto::cert;
use crate::infra::error::{GatewayError, GatewayResult};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509Ref, X509StoreContext};
use std::path::Path;

/// Validation seam used by the verifier cache.
pub trait LeafValidator: Send + Sync {
    /// Accept or reject a leaf signing certificate.
    fn validate(&self, leaf: &X509Ref) -> GatewayResult<()>;
}

/// Root and intermediate certificates pinned at client initialization.
#[derive(Default, Clone)]
pub struct TrustStore {
    root: Option<X509>,
    intermediate: Option<X509>,
}

impl TrustStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchors given as PEM text (or DER in a string-safe form).
    pub fn from_anchors(root: &str, intermediate: &str) -> GatewayResult<Self> {
        let mut store = Self::new();
        store.load_root(root)?;
        store.load_intermediate(intermediate)?;
        Ok(store)
    }

    pub fn load_root(&mut self, text: &str) -> GatewayResult<()> {
        self.root = Some(Self::decode_anchor("root", text.as_bytes())?);
        Ok(())
    }

    pub fn load_root_from_file<P: AsRef<Path>>(&mut self, path: P) -> GatewayResult<()> {
        let data = read_anchor_file(path.as_ref())?;
        self.root = Some(Self::decode_anchor("root", &data)?);
        Ok(())
    }

    pub fn load_intermediate(&mut self, text: &str) -> GatewayResult<()> {
        self.intermediate = Some(Self::decode_anchor("intermediate", text.as_bytes())?);
        Ok(())
    }

    pub fn load_intermediate_from_file<P: AsRef<Path>>(&mut self, path: P) -> GatewayResult<()> {
        let data = read_anchor_file(path.as_ref())?;
        self.intermediate = Some(Self::decode_anchor("intermediate", &data)?);
        Ok(())
    }

    fn decode_anchor(kind: &str, data: &[u8]) -> GatewayResult<X509> {
        let anchor = cert::decode_certificate(data)?;
        log::info!(
            "Loaded {kind} trust anchor: {}",
            cert::common_name(&anchor).unwrap_or_else(|| "<no CN>".to_string())
        );
        Ok(anchor)
    }

    /// Both anchors are present.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.root.is_some() && self.intermediate.is_some()
    }

    /// Validate `leaf` against the anchors, then check its issuer identity.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Configuration`] if either anchor is missing
    /// - [`GatewayError::ChainValidation`] if the chain does not verify
    /// - [`GatewayError::UntrustedIssuer`] if the common name check fails
    pub fn verify(&self, leaf: &X509Ref) -> GatewayResult<()> {
        let (Some(root), Some(intermediate)) = (&self.root, &self.intermediate) else {
            return Err(GatewayError::Configuration(
                "root and intermediate certificates must be loaded before verification"
                    .to_string(),
            ));
        };

        Self::verify_chain(root, intermediate, leaf)?;
        Self::verify_issuer_identity(leaf)
    }

    /// Decode a leaf from text and verify it.
    pub fn verify_text(&self, leaf_text: &str) -> GatewayResult<X509> {
        let leaf = cert::decode_certificate_text(leaf_text)?;
        self.verify(&leaf)?;
        Ok(leaf)
    }

    fn verify_chain(root: &X509, intermediate: &X509, leaf: &X509Ref) -> GatewayResult<()> {
        let mut trusted = X509StoreBuilder::new()?;
        trusted.add_cert(root.clone())?;
        let trusted = trusted.build();

        let mut untrusted = Stack::new()?;
        untrusted.push(intermediate.clone())?;
        untrusted.push(root.clone())?;

        let mut context = X509StoreContext::new()?;
        let failure = context.init(&trusted, leaf, &untrusted, |ctx| {
            if ctx.verify_cert()? {
                Ok(None)
            } else {
                Ok(Some(ctx.error()))
            }
        })?;

        match failure {
            None => Ok(()),
            Some(result) => {
                log::warn!("Leaf certificate chain rejected: {}", result.error_string());
                Err(GatewayError::ChainValidation(
                    result.error_string().to_string(),
                ))
            }
        }
    }

    fn verify_issuer_identity(leaf: &X509Ref) -> GatewayResult<()> {
        let common_name = cert::common_name(leaf).ok_or_else(|| {
            GatewayError::UntrustedIssuer(
                "leaf certificate has no UTF-8 common name".to_string(),
            )
        })?;
        if common_name.contains('\0') {
            log::warn!("Leaf certificate common name contains a NUL byte");
            return Err(GatewayError::UntrustedIssuer(
                "common name contains a NUL byte".to_string(),
            ));
        }

        match common_name.split('@').nth(2) {
            Some(segment) if segment == UNIONPAY_ISSUER_NAME => Ok(()),
            Some(segment) => {
                log::warn!("Leaf certificate issued to unexpected organization: {segment}");
                Err(GatewayError::UntrustedIssuer(format!(
                    "unexpected organization segment '{segment}'"
                )))
            }
            None => Err(GatewayError::UntrustedIssuer(format!(
                "common name '{common_name}' has fewer than three '@' segments"
            ))),
        }
    }
}

impl LeafValidator for TrustStore {
    fn validate(&self, leaf: &X509Ref) -> GatewayResult<()> {
        self.verify(leaf)
    }
}

impl std::fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TrustStore(root={}, intermediate={})",
            self.root.is_some(),
            self.intermediate.is_some()
        )
    }
}

fn read_anchor_file(path: &Path) -> GatewayResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        GatewayError::Io(format!(
            "Failed to read certificate {}: {e}",
            path.display()
        ))
    })
}
