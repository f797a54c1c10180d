//! Shared fixtures for the integration tests.
//!
//! Builds a throwaway three-level PKI once per test binary: a gateway root,
//! an intermediate, and leaves signed by the intermediate, plus a merchant
//! PKCS#12 container and an encryption certificate.

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Builder, X509NameBuilder, X509Ref, X509};
use std::sync::OnceLock;
use unionpay_gateway::{canonicalize, ParameterSet, SignatureEngine, TrustStore};

pub const MERCHANT_ID: &str = "777290058165621";
pub const MERCHANT_CERT_ID: &str = "69026276696";
pub const ENCRYPTION_CERT_ID: &str = "68759529225";
pub const PFX_PASSWORD: &str = "000000";
pub const GATEWAY_CN: &str = "041@Z12@中国银联股份有限公司@00000001";
pub const FOREIGN_CN: &str = "041@Z12@Some Other Acquirer Ltd@00000001";

pub struct KeyedCert {
    pub cert: X509,
    pub key: PKey<Private>,
}

impl KeyedCert {
    pub fn pem(&self) -> String {
        pem_text(&self.cert)
    }
}

pub struct Fixture {
    pub root: KeyedCert,
    pub intermediate: KeyedCert,
    /// Gateway signing leaf with the expected organization segment
    pub gateway: KeyedCert,
    /// Chains correctly but names another organization
    pub foreign: KeyedCert,
    /// Correct common name, issued by an unrelated root
    pub rogue: KeyedCert,
    pub merchant: KeyedCert,
    pub merchant_pfx: Vec<u8>,
    pub encryption: KeyedCert,
}

impl Fixture {
    pub fn trust_store(&self) -> TrustStore {
        TrustStore::from_anchors(&self.root.pem(), &self.intermediate.pem())
            .expect("fixture anchors load")
    }
}

/// Lazily built fixture shared by every test in the binary.
pub fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(build_fixture)
}

fn build_fixture() -> Fixture {
    let root = issue("UnionPay Test Root", 1, None, true);
    let intermediate = issue("UnionPay Test Intermediate", 2, Some(&root), true);
    let gateway = issue(GATEWAY_CN, 3, Some(&intermediate), false);
    let foreign = issue(FOREIGN_CN, 4, Some(&intermediate), false);

    let other_root = issue("Unrelated Root", 5, None, true);
    let rogue = issue(GATEWAY_CN, 6, Some(&other_root), false);

    let merchant = issue_with_serial("merchant signing", MERCHANT_CERT_ID, Some(&root), false);
    let merchant_pfx = Pkcs12::builder()
        .name("merchant")
        .pkey(&merchant.key)
        .cert(&merchant.cert)
        .build2(PFX_PASSWORD)
        .expect("build PKCS#12")
        .to_der()
        .expect("encode PKCS#12");

    let encryption =
        issue_with_serial("sensitive info encryption", ENCRYPTION_CERT_ID, Some(&root), false);

    Fixture {
        root,
        intermediate,
        gateway,
        foreign,
        rogue,
        merchant,
        merchant_pfx,
        encryption,
    }
}

/// Leaf issued by the fixture intermediate under an arbitrary common name.
pub fn issue_gateway_leaf(common_name: &str, serial: u32) -> KeyedCert {
    issue(common_name, serial, Some(&fixture().intermediate), false)
}

fn issue(common_name: &str, serial: u32, issuer: Option<&KeyedCert>, ca: bool) -> KeyedCert {
    issue_with_serial(common_name, &serial.to_string(), issuer, ca)
}

fn issue_with_serial(
    common_name: &str,
    serial: &str,
    issuer: Option<&KeyedCert>,
    ca: bool,
) -> KeyedCert {
    let rsa = Rsa::generate(2048).expect("Should generate RSA key");
    let key = PKey::from_rsa(rsa).expect("Should create PKey");

    let mut name = X509NameBuilder::new().expect("Should create name builder");
    name.append_entry_by_text("C", "CN").expect("Should add C");
    name.append_entry_by_text("CN", common_name)
        .expect("Should add CN");
    let name = name.build();

    let mut builder = X509Builder::new().expect("Should create X509 builder");
    builder.set_version(2).expect("Should set version");
    let serial = BigNum::from_dec_str(serial)
        .expect("Should create serial")
        .to_asn1_integer()
        .expect("Should convert serial");
    builder
        .set_serial_number(&serial)
        .expect("Should set serial");
    builder.set_subject_name(&name).expect("Should set subject");
    match issuer {
        Some(issuer) => builder
            .set_issuer_name(issuer.cert.subject_name())
            .expect("Should set issuer"),
        None => builder.set_issuer_name(&name).expect("Should set issuer"),
    }

    let not_before = Asn1Time::days_from_now(0).expect("Should create not_before");
    let not_after = Asn1Time::days_from_now(365).expect("Should create not_after");
    builder
        .set_not_before(&not_before)
        .expect("Should set not_before");
    builder
        .set_not_after(&not_after)
        .expect("Should set not_after");
    builder.set_pubkey(&key).expect("Should set pubkey");

    if ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    } else {
        builder
            .append_extension(BasicConstraints::new().build().unwrap())
            .unwrap();
        builder
            .append_extension(
                KeyUsage::new()
                    .digital_signature()
                    .key_encipherment()
                    .build()
                    .unwrap(),
            )
            .unwrap();
    }

    let signing_key = issuer.map_or(&key, |issuer| &issuer.key);
    builder
        .sign(signing_key, MessageDigest::sha256())
        .expect("Should sign");

    KeyedCert {
        cert: builder.build(),
        key,
    }
}

pub fn pem_text(cert: &X509Ref) -> String {
    String::from_utf8(cert.to_pem().expect("PEM encode")).expect("PEM is ASCII")
}

/// Add `signPubKeyCert` and a signature made with `signer`, the way the
/// gateway signs its responses and notifications.
pub fn gateway_sign(params: &mut ParameterSet, signer: &KeyedCert) {
    params.set("signPubKeyCert", signer.pem());
    params.remove("signature");
    let engine = SignatureEngine::signing(signer.key.clone()).expect("RSA key");
    let signature = engine
        .sign(canonicalize(params).as_bytes())
        .expect("sign");
    params.set("signature", STANDARD.encode(signature));
}

/// Raw `k=v&...` body with values written as-is.
pub fn raw_body(params: &ParameterSet) -> String {
    params
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |value| format!("{key}={value}")))
        .collect::<Vec<_>>()
        .join("&")
}
