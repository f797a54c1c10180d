//! Gateway client: signed back-channel calls plus encryption key retrieval.

use crate::adapters::gateway_http_client::{GatewayTransport, HttpTransport, HttpTransportConfig};
use crate::domain::constants::{
    BACK_TRANS_PATH, CERT_TYPE_SENSITIVE_ENCRYPTION, FIELD_ENCRYPT_PUB_KEY_CERT, FIELD_RESP_CODE,
    FIELD_RESP_MSG, TXN_TIME_FORMAT, TXN_TYPE_ENCRYPT_KEY_QUERY,
};
use crate::domain::crypto::MerchantKey;
use crate::domain::params::ParameterSet;
use crate::domain::response_code::ResponseCode;
use crate::infra::config::GatewayConfig;
use crate::infra::error::{GatewayError, GatewayResult};
use crate::services::field_cipher::SensitiveFieldCipher;
use crate::services::request_signer::RequestSigner;
use crate::services::trust_store::TrustStore;
use std::sync::Arc;

/// Signs requests, posts them through a transport and authenticates the
/// responses.
#[derive(Debug)]
pub struct GatewayClient<T: GatewayTransport> {
    signer: RequestSigner,
    cipher: SensitiveFieldCipher,
    transport: T,
}

impl GatewayClient<HttpTransport> {
    /// Build a client from the credential files named in `config`.
    ///
    /// The merchant container and both trust anchors are required; the
    /// encryption certificate is loaded when a path is configured, otherwise
    /// it must be fetched with [`GatewayClient::load_encryption_certificate`].
    pub fn from_config(config: GatewayConfig, pfx_password: &str) -> GatewayResult<Self> {
        config.validate()?;
        let credentials = &config.credentials;

        let pfx = credentials.signing_pfx.as_ref().ok_or_else(|| {
            GatewayError::Configuration("credentials.signing_pfx is not set".to_string())
        })?;
        let root = credentials.root_cert.as_ref().ok_or_else(|| {
            GatewayError::Configuration("credentials.root_cert is not set".to_string())
        })?;
        let intermediate = credentials.intermediate_cert.as_ref().ok_or_else(|| {
            GatewayError::Configuration("credentials.intermediate_cert is not set".to_string())
        })?;

        let merchant = Arc::new(MerchantKey::from_pkcs12_file(pfx, pfx_password)?);
        let mut trust = TrustStore::new();
        trust.load_root_from_file(root)?;
        trust.load_intermediate_from_file(intermediate)?;

        let encryption_cert = credentials.encryption_cert.clone();
        let transport = HttpTransport::new(&HttpTransportConfig::from(&config))?;
        let client = Self::new(config, merchant, trust, transport)?;
        if let Some(path) = encryption_cert {
            client.cipher.load_certificate_from_file(path)?;
        }
        Ok(client)
    }
}

impl<T: GatewayTransport> GatewayClient<T> {
    pub fn new(
        config: GatewayConfig,
        merchant: Arc<MerchantKey>,
        trust: TrustStore,
        transport: T,
    ) -> GatewayResult<Self> {
        let cipher = SensitiveFieldCipher::new(Arc::clone(&merchant));
        let signer = RequestSigner::new(config, merchant, trust)?;
        Ok(Self {
            signer,
            cipher,
            transport,
        })
    }

    #[must_use]
    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    #[must_use]
    pub fn cipher(&self) -> &SensitiveFieldCipher {
        &self.cipher
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sign `params`, post them to `api` on the configured host and return
    /// the authenticated response.
    ///
    /// A response that fails authentication is rejected whatever its
    /// `respCode`; the code itself is left for the caller to interpret.
    pub async fn request(&self, api: &str, params: ParameterSet) -> GatewayResult<ParameterSet> {
        let url = format!("{}{api}", self.signer.config().host());
        let signed = self.signer.finalize(params)?;

        let body = self
            .transport
            .post_form(&url, &signed.to_form_pairs())
            .await?;
        let response = ParameterSet::parse_response(&body)?;
        self.signer.verify(&response)?;

        if let Some(code) = response.get(FIELD_RESP_CODE) {
            log::debug!("gateway {api} answered respCode={code}");
        }
        Ok(response)
    }

    /// Fetch the current sensitive-information encryption certificate from
    /// the gateway and install it.
    pub async fn load_encryption_certificate(&self) -> GatewayResult<()> {
        let now = chrono::Local::now().format(TXN_TIME_FORMAT).to_string();
        let mut params = ParameterSet::new();
        params
            .set("txnType", TXN_TYPE_ENCRYPT_KEY_QUERY)
            .set("txnSubType", "00")
            .set("bizType", "000000")
            .set("certType", CERT_TYPE_SENSITIVE_ENCRYPTION)
            .set("accessType", "0")
            .set("channelType", "07")
            .set("orderId", now.as_str())
            .set("txnTime", now.as_str());

        let response = self.request(BACK_TRANS_PATH, params).await?;
        let code = ResponseCode::new(response.get(FIELD_RESP_CODE).unwrap_or_default());
        if !code.is_success() {
            return Err(GatewayError::Gateway {
                code: code.as_str().to_string(),
                message: response.get(FIELD_RESP_MSG).unwrap_or_default().to_string(),
            });
        }

        let certificate = response.get(FIELD_ENCRYPT_PUB_KEY_CERT).ok_or_else(|| {
            GatewayError::Encoding(format!("response carries no {FIELD_ENCRYPT_PUB_KEY_CERT}"))
        })?;
        self.cipher.load_certificate(&certificate.replace('\r', "\n"))
    }
}
