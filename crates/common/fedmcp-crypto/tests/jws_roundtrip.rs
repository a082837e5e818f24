use assert_matches::assert_matches;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{SigningKey, VerifyingKey};
use fedmcp_crypto::{sign_detached_jws, verify_detached_jws, Algorithm, DetachedJws, JwsError};
use rand::rngs::OsRng;

const KID: &str = "a1b2c3d4e5f60718";

#[test]
fn test_jws_sign_verify_roundtrip() {
    let mut csprng = OsRng;
    let signing_key: SigningKey = SigningKey::generate(&mut csprng);
    let public_key: VerifyingKey = VerifyingKey::from(&signing_key);

    let payload = br#"{"body":{"rule":"deny-all"},"type":"policy"}"#;

    let detached_jws = sign_detached_jws(payload, &signing_key, KID).expect("Failed to sign payload");

    let result = verify_detached_jws(payload, &detached_jws, &public_key);
    assert_matches!(result, Ok(()));

    // header..signature
    let parts: Vec<&str> = detached_jws.split('.').collect();
    assert_eq!(parts.len(), 3);
    assert!(!parts[0].is_empty(), "Header part should not be empty");
    assert!(parts[1].is_empty(), "Middle part should be empty in detached JWS");
    assert!(!parts[2].is_empty(), "Signature part should not be empty");

    let parsed = DetachedJws::parse(&detached_jws).unwrap();
    assert_eq!(parsed.header.alg, Algorithm::EdDSA);
    assert_eq!(parsed.header.kid.as_deref(), Some(KID));
    assert_eq!(parsed.signature_bytes().len(), 64);

    let tampered_payload = br#"{"body":{"rule":"allow-all"},"type":"policy"}"#;
    assert_matches!(
        verify_detached_jws(tampered_payload, &detached_jws, &public_key),
        Err(JwsError::CryptoVerification(_))
    );
}

#[test]
fn test_wrong_key_is_rejected() {
    let signer = SigningKey::generate(&mut OsRng);
    let other = SigningKey::generate(&mut OsRng);
    let payload = b"payload";

    let jws = sign_detached_jws(payload, &signer, KID).unwrap();
    assert_matches!(
        verify_detached_jws(payload, &jws, &other.verifying_key()),
        Err(JwsError::CryptoVerification(_))
    );
}

#[test]
fn test_structural_errors_are_malformed() {
    let key = SigningKey::generate(&mut OsRng).verifying_key();

    let err = verify_detached_jws(b"x", "not-a-token", &key).unwrap_err();
    assert_matches!(err, JwsError::IncorrectJwsPartsCount { actual_parts: 1 });
    assert!(err.is_malformed());

    let err = verify_detached_jws(b"x", "a.b.c", &key).unwrap_err();
    assert_matches!(err, JwsError::PayloadPresentInDetachedJws);
    assert!(err.is_malformed());

    let err = verify_detached_jws(b"x", "!!!..AAAA", &key).unwrap_err();
    assert_matches!(err, JwsError::Base64(_));
    assert!(err.is_malformed());

    let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
    let err = verify_detached_jws(b"x", &format!("{not_json}..AAAA"), &key).unwrap_err();
    assert_matches!(err, JwsError::Serialization(_));
    assert!(err.is_malformed());
}

#[test]
fn test_unsupported_algorithm_never_passes() {
    let signing_key = SigningKey::generate(&mut OsRng);
    let payload = b"payload";
    let jws = sign_detached_jws(payload, &signing_key, KID).unwrap();
    let signature_b64 = jws.rsplit('.').next().unwrap();

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","kid":"a1b2c3d4e5f60718"}"#);
    let forged = format!("{header}..{signature_b64}");

    let err = verify_detached_jws(payload, &forged, &signing_key.verifying_key()).unwrap_err();
    assert_matches!(err, JwsError::UnsupportedAlgorithm(ref alg) if alg == "none");
    assert!(!err.is_malformed());
}

#[test]
fn test_truncated_signature_reports_length() {
    let signing_key = SigningKey::generate(&mut OsRng);
    let payload = b"payload";
    let jws = sign_detached_jws(payload, &signing_key, KID).unwrap();
    let header_b64 = jws.split('.').next().unwrap();
    let short = format!("{header_b64}..{}", URL_SAFE_NO_PAD.encode([0u8; 10]));

    let err = verify_detached_jws(payload, &short, &signing_key.verifying_key()).unwrap_err();
    assert_matches!(err, JwsError::InvalidSignatureLength { expected_len: 64, found_len: 10 });
    assert!(err.is_malformed());
    assert_matches!(
        DetachedJws::parse(&short),
        Err(JwsError::InvalidSignatureLength { found_len: 10, .. })
    );
}
