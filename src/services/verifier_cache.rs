//! Per-certificate verifier memoization.
//!
//! Keyed by the raw leaf certificate text as received. Entries are never
//! evicted implicitly; the gateway presents a small, bounded set of signing
//! certificates. Population runs under a dedicated lock so concurrent misses
//! for one certificate validate it once, while lookups of cached entries only
//! take the map's read lock, which is never held across validation.

use crate::domain::crypto::cert;
use crate::infra::error::GatewayResult;
use crate::services::signature_engine::SignatureEngine;
use crate::services::trust_store::LeafValidator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

#[derive(Default)]
pub struct VerifierCache {
    entries: RwLock<HashMap<String, Arc<SignatureEngine>>>,
    populate: Mutex<()>,
}

impl VerifierCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifier for `leaf_text`, validating and caching it on first use.
    pub fn get<V>(&self, leaf_text: &str, validator: &V) -> GatewayResult<Arc<SignatureEngine>>
    where
        V: LeafValidator + ?Sized,
    {
        if let Some(engine) = self.lookup(leaf_text) {
            return Ok(engine);
        }

        let _populating = self.populate.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = self.lookup(leaf_text) {
            return Ok(engine);
        }

        let leaf = cert::decode_certificate_text(leaf_text)?;
        validator.validate(&leaf)?;
        let engine = Arc::new(SignatureEngine::for_certificate(&leaf)?);

        log::info!(
            "Trusted new gateway signing certificate, serial={}",
            cert::serial_decimal(&leaf).unwrap_or_default()
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(leaf_text.to_owned(), Arc::clone(&engine));
        Ok(engine)
    }

    fn lookup(&self, leaf_text: &str) -> Option<Arc<SignatureEngine>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(leaf_text)
            .cloned()
    }

    /// Drop the entry for one certificate; the next lookup re-validates it.
    pub fn invalidate(&self, leaf_text: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(leaf_text)
            .is_some()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for VerifierCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VerifierCache(entries={})", self.len())
    }
}
