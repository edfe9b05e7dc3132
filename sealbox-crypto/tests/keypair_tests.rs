use pretty_assertions::assert_eq;
use sealbox_crypto::keypair::{
    decrypt_private_key, encrypt_private_key, load_private_key, parse_public_key,
    parse_public_key_base64, KeyPair,
};
use sealbox_crypto::{
    generate_random_key, open_key, seal_key, CryptoError, KdfParams, PassphraseProtectedKey,
};

#[test]
fn keypair_generation_produces_valid_keys() {
    let kp = KeyPair::generate().unwrap();
    let public = kp.public_key();
    let private = kp.private_key();
    assert_eq!(public.len(), 32);
    assert_eq!(private.len(), 32);
    // Public and secret keys must differ
    assert_ne!(&public[..], &private[..]);
}

#[test]
fn keypair_roundtrip_from_secret_bytes() {
    let kp1 = KeyPair::generate().unwrap();
    let kp2 = KeyPair::from_secret_bytes(*kp1.private_key());
    assert_eq!(kp1.public_key(), kp2.public_key());
}

#[test]
fn two_generated_keypairs_differ() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    assert_ne!(a.public_key(), b.public_key());
}

#[test]
fn public_key_parse_rejects_wrong_length() {
    let err = parse_public_key(&[1u8; 31]).unwrap_err();
    assert!(matches!(
        err,
        CryptoError::InvalidKeyLength {
            expected: 32,
            actual: 31
        }
    ));
    assert!(parse_public_key(&[]).is_err());
}

#[test]
fn public_key_parse_rejects_all_zero() {
    let err = parse_public_key(&[0u8; 32]).unwrap_err();
    assert!(matches!(err, CryptoError::InvalidKey(_)));
}

#[test]
fn public_key_base64_roundtrip() {
    let kp = KeyPair::generate().unwrap();
    let encoded = kp.public_key_base64();
    let parsed = parse_public_key_base64(&encoded).unwrap();
    assert_eq!(parsed.as_bytes(), &kp.public_key());

    assert!(parse_public_key_base64("not base64!!").is_err());
}

#[test]
fn seal_open_key_roundtrip() {
    let recipient = KeyPair::generate().unwrap();
    let cek = generate_random_key().unwrap();

    let sealed = seal_key(&cek, &recipient.public).unwrap();
    let recovered = open_key(&sealed, &recipient.secret).unwrap();

    assert_eq!(recovered.as_bytes(), cek.as_bytes());
}

#[test]
fn tampered_sealed_key_fails() {
    let recipient = KeyPair::generate().unwrap();
    let cek = generate_random_key().unwrap();

    let mut sealed = seal_key(&cek, &recipient.public).unwrap();
    sealed.ciphertext[0] ^= 0xFF;
    assert!(open_key(&sealed, &recipient.secret).is_err());

    let mut sealed = seal_key(&cek, &recipient.public).unwrap();
    sealed.nonce[0] ^= 0xFF;
    assert!(open_key(&sealed, &recipient.secret).is_err());
}

#[test]
fn each_seal_uses_fresh_ephemeral_key_and_nonce() {
    let recipient = KeyPair::generate().unwrap();
    let cek = generate_random_key().unwrap();

    let s1 = seal_key(&cek, &recipient.public).unwrap();
    let s2 = seal_key(&cek, &recipient.public).unwrap();

    assert_ne!(s1.ephemeral_public_key, s2.ephemeral_public_key);
    assert_ne!(s1.nonce, s2.nonce);
    assert_ne!(s1.ciphertext, s2.ciphertext);
}

#[test]
fn passphrase_encrypt_decrypt_roundtrip() {
    let kp = KeyPair::generate().unwrap();
    let passphrase = "correct-horse-battery-staple";

    let protected = encrypt_private_key(&kp.secret, passphrase, &KdfParams::test()).unwrap();
    let recovered = decrypt_private_key(&protected, passphrase).unwrap();

    assert_eq!(recovered.to_bytes(), kp.secret.to_bytes());
}

#[test]
fn wrong_passphrase_fails() {
    let kp = KeyPair::generate().unwrap();
    let protected = encrypt_private_key(&kp.secret, "correct", &KdfParams::test()).unwrap();

    let result = decrypt_private_key(&protected, "wrong");
    assert!(matches!(result, Err(CryptoError::Decryption(_))));
}

#[test]
fn passphrase_protected_key_serialization() {
    let kp = KeyPair::generate().unwrap();
    let blob = kp
        .encrypted_private_key("serialize-test", &KdfParams::test())
        .unwrap();

    let parsed: PassphraseProtectedKey = serde_json::from_slice(&blob).unwrap();
    assert_eq!(parsed.kdf, KdfParams::test());

    let recovered = load_private_key(&blob, Some("serialize-test")).unwrap();
    assert_eq!(recovered.to_bytes(), kp.secret.to_bytes());
}

#[test]
fn load_private_key_raw_and_garbage() {
    let kp = KeyPair::generate().unwrap();
    let raw = kp.private_key();
    let loaded = load_private_key(&raw[..], None).unwrap();
    assert_eq!(loaded.public_key().as_bytes(), &kp.public_key());

    assert!(matches!(
        load_private_key(b"{not json", Some("pw")),
        Err(CryptoError::Serialization(_))
    ));
    assert!(matches!(
        load_private_key(&[1, 2, 3], None),
        Err(CryptoError::InvalidKeyLength { .. })
    ));
}

// Property-based tests
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn seal_open_always_roundtrips(secret in any::<[u8; 32]>()) {
            let recipient = KeyPair::from_secret_bytes(secret);
            let cek = generate_random_key().unwrap();
            let sealed = seal_key(&cek, &recipient.public).unwrap();
            let recovered = open_key(&sealed, &recipient.secret).unwrap();
            prop_assert_eq!(recovered.as_bytes(), cek.as_bytes());
        }
    }
}
