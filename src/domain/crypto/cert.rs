//! X.509 certificate decoding and field extraction.

use crate::infra::error::{GatewayError, GatewayResult};
use openssl::nid::Nid;
use openssl::x509::{X509, X509Ref};

const PEM_MARKER: &[u8] = b"-----BEGIN";

/// Decode a certificate given as PEM text or raw DER.
///
/// PEM text with bare `\r` line breaks, as returned in some gateway fields, is
/// normalized before parsing.
pub fn decode_certificate(data: &[u8]) -> GatewayResult<X509> {
    let is_pem = data
        .windows(PEM_MARKER.len())
        .any(|window| window == PEM_MARKER);

    let parsed = if is_pem {
        X509::from_pem(&normalize_line_breaks(data))
    } else {
        X509::from_der(data)
    };
    parsed.map_err(|e| GatewayError::CertificateParse(e.to_string()))
}

/// Decode a certificate held in a text field.
pub fn decode_certificate_text(text: &str) -> GatewayResult<X509> {
    if text.trim().is_empty() {
        return Err(GatewayError::CertificateParse(
            "certificate text is empty".to_string(),
        ));
    }
    decode_certificate(text.as_bytes())
}

fn normalize_line_breaks(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();
    while let Some(&byte) = iter.next() {
        if byte == b'\r' {
            if iter.peek() == Some(&&b'\n') {
                iter.next();
            }
            out.push(b'\n');
        } else {
            out.push(byte);
        }
    }
    out
}

/// Certificate serial number as a decimal string, the form used for
/// `certId` and `encryptCertId`.
pub fn serial_decimal(cert: &X509Ref) -> GatewayResult<String> {
    let serial = cert.serial_number().to_bn()?;
    Ok(serial.to_dec_str()?.to_string())
}

/// First subject common name, if any.
///
/// The raw string bytes are decoded whole, so an embedded NUL is kept in the
/// result rather than ending it. Bytes that are not UTF-8 yield `None`.
#[must_use]
pub fn common_name(cert: &X509Ref) -> Option<String> {
    cert.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| std::str::from_utf8(entry.data().as_slice()).ok())
        .map(str::to_owned)
}
