use crate::{Did, KeyId, KeyMaterial, PublicJwk, SignatureToken, TrustedKey, KEY_ID_HEX_LEN};

#[test]
fn did_round_trip_ed25519() {
    let key = KeyMaterial::generate();
    let did_str = key.did().as_str().to_owned();

    let pk = key.did().to_ed25519().unwrap();
    assert_eq!(pk.to_bytes(), key.verifying_key().to_bytes());

    let did2 = Did::new_ed25519(&pk);
    assert_eq!(did2.as_str(), did_str);
    assert!(did_str.starts_with("did:key:z"));
}

#[test]
fn key_id_is_stable_lowercase_hex() {
    let key = KeyMaterial::from_seed(&[42u8; 32]);
    let again = KeyMaterial::from_seed(&[42u8; 32]);
    let other = KeyMaterial::from_seed(&[43u8; 32]);

    assert_eq!(key.key_id(), again.key_id());
    assert_ne!(key.key_id(), other.key_id());

    let id = key.key_id().as_str();
    assert_eq!(id.len(), KEY_ID_HEX_LEN);
    assert!(id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    assert_eq!(&KeyId::derive(key.verifying_key()), key.key_id());
}

#[test]
fn malformed_did_rejected() {
    assert!("did:key:zQ3shBAdummy".parse::<Did>().is_err());
    assert!("did:web:example.com".parse::<Did>().is_err());
    assert!("not a did".parse::<Did>().is_err());
}

#[test]
fn jwk_round_trip_and_kid_check() {
    let key = KeyMaterial::generate();
    let jwk = key.public_jwk();
    assert_eq!(jwk.kid.as_deref(), Some(key.key_id().as_str()));
    assert_eq!(&jwk.to_verifying_key().unwrap(), key.verifying_key());

    let mut wrong = jwk.clone();
    wrong.kid = Some("0000000000000000".into());
    assert!(wrong.to_verifying_key().is_err());

    let ec: PublicJwk = serde_json::from_str(r#"{"kty":"EC","crv":"P-256","x":"AA"}"#).unwrap();
    assert!(ec.to_verifying_key().is_err());
}

#[test]
fn trusted_key_parses_every_public_form() {
    let key = KeyMaterial::generate();
    let expected = key.trusted_key();

    let from_did = TrustedKey::parse(key.did().as_str()).unwrap();
    let from_hex = TrustedKey::parse(&hex::encode(key.verifying_key().as_bytes())).unwrap();
    let jwk_json = serde_json::to_string(&key.public_jwk()).unwrap();
    let from_jwk = TrustedKey::parse(&jwk_json).unwrap();

    assert_eq!(from_did, expected);
    assert_eq!(from_hex, expected);
    assert_eq!(from_jwk, expected);
    assert!(TrustedKey::parse("abcd").is_err());
}

#[test]
fn key_material_debug_hides_secret() {
    let key = KeyMaterial::from_seed(&[1u8; 32]);
    let debug = format!("{key:?}");
    assert!(debug.contains(key.key_id().as_str()));
    assert!(!debug.contains(&hex::encode([1u8; 32])));
}

#[test]
fn token_from_str_checks_structure() {
    assert!("not-a-token".parse::<SignatureToken>().is_err());
    assert!("a.b.c".parse::<SignatureToken>().is_err());
}
