//! Cardholder information carried in the `customerInfo` field.

use std::fmt;

/// Cardholder fields submitted with card-present style transactions.
///
/// `pin`, `cvn2`, `expired` and `phone_no` never appear in clear text on the
/// wire; see `SensitiveFieldCipher::protect`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CustomerInfo {
    /// Identity document type: 01 ID card, 02 officer card, 03 passport, ...
    pub cert_type: Option<String>,
    /// Identity document number
    pub cert_id: Option<String>,
    pub name: Option<String>,
    pub sms_code: Option<String>,
    pub pin: Option<String>,
    pub cvn2: Option<String>,
    /// Card expiry, `YYMM`
    pub expired: Option<String>,
    pub phone_no: Option<String>,
}

impl CustomerInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cert(mut self, cert_type: impl Into<String>, cert_id: impl Into<String>) -> Self {
        self.cert_type = Some(cert_type.into());
        self.cert_id = Some(cert_id.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_sms_code(mut self, code: impl Into<String>) -> Self {
        self.sms_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    #[must_use]
    pub fn with_cvn2(mut self, cvn2: impl Into<String>) -> Self {
        self.cvn2 = Some(cvn2.into());
        self
    }

    #[must_use]
    pub fn with_expired(mut self, expired: impl Into<String>) -> Self {
        self.expired = Some(expired.into());
        self
    }

    #[must_use]
    pub fn with_phone_no(mut self, phone_no: impl Into<String>) -> Self {
        self.phone_no = Some(phone_no.into());
        self
    }

    /// True when no field carries a non-empty value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.cert_type,
            &self.cert_id,
            &self.name,
            &self.sms_code,
            &self.pin,
            &self.cvn2,
            &self.expired,
            &self.phone_no,
        ]
        .iter()
        .all(|field| present(field).is_none())
    }
}

/// A field counts as present only when it holds a non-empty string.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

impl fmt::Debug for CustomerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |field: &Option<String>| present(field).map(|_| "[SET]");
        f.debug_struct("CustomerInfo")
            .field("cert_type", &self.cert_type)
            .field("cert_id", &mark(&self.cert_id))
            .field("name", &mark(&self.name))
            .field("sms_code", &mark(&self.sms_code))
            .field("pin", &mark(&self.pin))
            .field("cvn2", &mark(&self.cvn2))
            .field("expired", &mark(&self.expired))
            .field("phone_no", &mark(&self.phone_no))
            .finish()
    }
}
