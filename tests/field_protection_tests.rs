//! Sensitive field encryption and customer information encoding.

mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use common::{fixture, ENCRYPTION_CERT_ID, PFX_PASSWORD};
use openssl::pkey::{PKey, Private};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;
use unionpay_gateway::domain::crypto::rsa_blocks;
use unionpay_gateway::{
    CustomerInfo, EncryptionCertificate, GatewayError, MerchantKey, ParameterSet, PinBlock,
    SensitiveFieldCipher,
};

const PAN: &str = "6222021234567890123";

fn cipher_without_certificate() -> SensitiveFieldCipher {
    let merchant = MerchantKey::from_pkcs12(&fixture().merchant_pfx, PFX_PASSWORD).unwrap();
    SensitiveFieldCipher::new(Arc::new(merchant))
}

fn cipher() -> SensitiveFieldCipher {
    let cipher = cipher_without_certificate();
    cipher.load_certificate(&fixture().encryption.pem()).unwrap();
    cipher
}

fn gateway_decrypt(key: &PKey<Private>, b64: &str) -> Vec<u8> {
    rsa_blocks::decrypt(key, &STANDARD.decode(b64).unwrap()).unwrap()
}

/// Decode `base64("{k=v&...}")` into its fields. Values here never contain
/// `&`, `=` or braces apart from base64 padding, so split on the first `=`.
fn unwrap_customer_info(encoded: &str) -> ParameterSet {
    let text = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    let inner = text
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .expect("braced encoding");
    ParameterSet::parse_response(inner).unwrap()
}

#[test]
fn encryption_certificate_serial_is_exposed() {
    let cipher = cipher_without_certificate();
    assert_eq!(cipher.encryption_cert_id(), None);
    cipher.load_certificate(&fixture().encryption.pem()).unwrap();
    assert_eq!(cipher.encryption_cert_id().as_deref(), Some(ENCRYPTION_CERT_ID));
}

#[test]
fn encrypt_round_trips_with_gateway_key() {
    let fx = fixture();
    let ciphertext = cipher().encrypt(PAN).unwrap();
    assert_eq!(gateway_decrypt(&fx.encryption.key, &ciphertext), PAN.as_bytes());
}

#[test]
fn long_values_are_encrypted_block_wise() {
    let fx = fixture();
    let plaintext = "x".repeat(600);
    let ciphertext = STANDARD.decode(cipher().encrypt(&plaintext).unwrap()).unwrap();
    assert_eq!(ciphertext.len(), 3 * 256);
    assert_eq!(
        rsa_blocks::decrypt(&fx.encryption.key, &ciphertext).unwrap(),
        plaintext.as_bytes()
    );
}

#[test]
fn encrypt_before_certificate_is_configuration_error() {
    let cipher = cipher_without_certificate();
    assert!(cipher.encrypt(PAN).unwrap_err().is_configuration());
    assert!(cipher.encrypt_pin(PAN, "123456").unwrap_err().is_configuration());
}

#[test]
fn encrypted_pin_decrypts_to_pin_block() {
    let fx = fixture();
    let ciphertext = cipher().encrypt_pin(PAN, "123456").unwrap();
    let block = gateway_decrypt(&fx.encryption.key, &ciphertext);
    assert_eq!(hex::encode_upper(&block), "06122662A9876FED");
    assert_eq!(block, PinBlock::build(PAN, "123456").unwrap().as_bytes());
}

#[test]
fn decrypt_uses_merchant_key() {
    let fx = fixture();
    let merchant_public = EncryptionCertificate::from_x509(&fx.merchant.cert).unwrap();
    let installed = SensitiveFieldCipher::new(Arc::new(
        MerchantKey::from_pkcs12(&fx.merchant_pfx, PFX_PASSWORD).unwrap(),
    ));
    installed.install(merchant_public);

    let ciphertext = installed.encrypt("6216261000000000018").unwrap();
    assert_eq!(installed.decrypt(&ciphertext).unwrap(), "6216261000000000018");
}

#[test]
fn decrypt_rejects_malformed_input() {
    let cipher = cipher();
    assert!(matches!(
        cipher.decrypt("***").unwrap_err(),
        GatewayError::Encoding(_)
    ));
    assert!(matches!(
        cipher.decrypt(&STANDARD.encode([1u8; 10])).unwrap_err(),
        GatewayError::Cryptographic(_)
    ));
}

#[test]
fn empty_customer_info_is_empty_string() {
    assert_eq!(cipher().protect(&CustomerInfo::new(), PAN).unwrap(), "");
    // No certificate needed when there is nothing to encode.
    assert_eq!(
        cipher_without_certificate()
            .protect(&CustomerInfo::new().with_name(""), PAN)
            .unwrap(),
        ""
    );
}

#[test]
fn protect_without_certificate_is_configuration_error() {
    let customer = CustomerInfo::new().with_name("互联网");
    let err = cipher_without_certificate()
        .protect(&customer, PAN)
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn clear_fields_only() {
    let customer = CustomerInfo::new()
        .with_cert("01", "341126197709218366")
        .with_name("互联网")
        .with_sms_code("111111");
    let encoded = cipher().protect(&customer, PAN).unwrap();

    let text = String::from_utf8(STANDARD.decode(&encoded).unwrap()).unwrap();
    assert_eq!(
        text,
        "{certifId=341126197709218366&certifTp=01&customerNm=互联网&smsCode=111111}"
    );
}

#[test]
fn protected_fields_are_encrypted_together() {
    let fx = fixture();
    let customer = CustomerInfo::new()
        .with_name("互联网")
        .with_cvn2("123")
        .with_expired("2311")
        .with_phone_no("13552535506");
    let fields = unwrap_customer_info(&cipher().protect(&customer, PAN).unwrap());

    assert_eq!(fields.get("customerNm"), Some("互联网"));
    assert!(!fields.contains("cvn2"));
    assert!(!fields.contains("expired"));
    assert!(!fields.contains("phoneNo"));
    assert!(!fields.contains("pin"));

    let protected = gateway_decrypt(&fx.encryption.key, fields.get("encryptedInfo").unwrap());
    assert_eq!(
        String::from_utf8(protected).unwrap(),
        "cvn2=123&expired=2311&phoneNo=13552535506"
    );
}

#[test]
fn pin_is_carried_as_encrypted_block() {
    let fx = fixture();
    let customer = CustomerInfo::new().with_pin("1234").with_phone_no("13552535506");
    let fields = unwrap_customer_info(&cipher().protect(&customer, PAN).unwrap());

    let block = gateway_decrypt(&fx.encryption.key, fields.get("pin").unwrap());
    assert_eq!(hex::encode_upper(block), "041226CBA9876FED");

    let protected = gateway_decrypt(&fx.encryption.key, fields.get("encryptedInfo").unwrap());
    assert_eq!(protected, b"phoneNo=13552535506");
}

#[test]
fn pin_with_short_account_number_is_invalid_input() {
    let customer = CustomerInfo::new().with_pin("123456");
    let err = cipher().protect(&customer, "622202").unwrap_err();
    assert!(matches!(err, GatewayError::InvalidInput(_)));
}

#[test]
fn reload_replaces_certificate_atomically() {
    let fx = fixture();
    let cipher = cipher();
    let before = cipher.certificate().unwrap();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&fx.gateway.cert.to_der().unwrap()).unwrap();
    cipher.load_certificate_from_file(file.path()).unwrap();

    let after = cipher.certificate().unwrap();
    assert_eq!(before.cert_id(), ENCRYPTION_CERT_ID);
    assert_eq!(after.cert_id(), "3");
    assert!(!Arc::ptr_eq(&before, &after));

    let ciphertext = cipher.encrypt("42").unwrap();
    assert_eq!(gateway_decrypt(&fx.gateway.key, &ciphertext), b"42");
}

#[test]
fn concurrent_reload_never_mixes_certificates() {
    let fx = fixture();
    let cipher = Arc::new(cipher());
    let done = Arc::new(AtomicBool::new(false));

    let reloader = {
        let cipher = Arc::clone(&cipher);
        let done = Arc::clone(&done);
        let encryption = fx.encryption.pem();
        let gateway = fx.gateway.pem();
        thread::spawn(move || {
            for round in 0..40 {
                let pem = if round % 2 == 0 { &gateway } else { &encryption };
                cipher.load_certificate(pem).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let cipher = Arc::clone(&cipher);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let customer = CustomerInfo::new().with_cvn2("123").with_expired("2311");
                let mut samples = Vec::new();
                loop {
                    let finished = done.load(Ordering::SeqCst);
                    samples.push((
                        cipher.encrypt("42").unwrap(),
                        cipher.protect(&customer, PAN).unwrap(),
                    ));
                    if finished {
                        return samples;
                    }
                }
            })
        })
        .collect();

    reloader.join().unwrap();
    let keys: [&PKey<Private>; 2] = [&fx.encryption.key, &fx.gateway.key];
    let decrypts_with_one_key = |b64: &str, expected: &[u8]| {
        let ciphertext = STANDARD.decode(b64).unwrap();
        keys.iter()
            .filter(|key| {
                rsa_blocks::decrypt(**key, &ciphertext).is_ok_and(|plain| plain == expected)
            })
            .count()
            == 1
    };

    for worker in workers {
        for (value, info) in worker.join().unwrap() {
            assert!(decrypts_with_one_key(&value, b"42"));
            let fields = unwrap_customer_info(&info);
            assert!(decrypts_with_one_key(
                fields.get("encryptedInfo").unwrap(),
                b"cvn2=123&expired=2311"
            ));
        }
    }
}
