//! Gateway protocol constants.
//! Field names, endpoint paths and fixed literals shared across services.

/// Third `@` segment of every gateway signing certificate's common name.
pub const UNIONPAY_ISSUER_NAME: &str = "中国银联股份有限公司";

// === Endpoint paths ===

pub const FRONT_TRANS_PATH: &str = "/gateway/api/frontTransReq.do";
pub const BACK_TRANS_PATH: &str = "/gateway/api/backTransReq.do";
pub const QUERY_TRANS_PATH: &str = "/gateway/api/queryTrans.do";
pub const APP_TRANS_PATH: &str = "/gateway/api/appTransReq.do";

// === Identity and signature fields ===

pub const FIELD_VERSION: &str = "version";
pub const FIELD_ENCODING: &str = "encoding";
pub const FIELD_MER_ID: &str = "merId";
pub const FIELD_CERT_ID: &str = "certId";
pub const FIELD_SIGN_METHOD: &str = "signMethod";
pub const FIELD_SIGNATURE: &str = "signature";
pub const FIELD_SIGN_PUB_KEY_CERT: &str = "signPubKeyCert";

// === Response fields ===

pub const FIELD_RESP_CODE: &str = "respCode";
pub const FIELD_RESP_MSG: &str = "respMsg";
pub const FIELD_ENCRYPT_PUB_KEY_CERT: &str = "encryptPubKeyCert";

// === Customer information fields ===

pub const FIELD_CERTIF_TP: &str = "certifTp";
pub const FIELD_CERTIF_ID: &str = "certifId";
pub const FIELD_CUSTOMER_NM: &str = "customerNm";
pub const FIELD_SMS_CODE: &str = "smsCode";
pub const FIELD_PIN: &str = "pin";
pub const FIELD_CVN2: &str = "cvn2";
pub const FIELD_EXPIRED: &str = "expired";
pub const FIELD_PHONE_NO: &str = "phoneNo";
pub const FIELD_ENCRYPTED_INFO: &str = "encryptedInfo";

// === Encryption key update query (txnType 95) ===

pub const TXN_TYPE_ENCRYPT_KEY_QUERY: &str = "95";
pub const CERT_TYPE_SENSITIVE_ENCRYPTION: &str = "01";

/// Layout of `orderId` and `txnTime`.
pub const TXN_TIME_FORMAT: &str = "%Y%m%d%H%M%S";
