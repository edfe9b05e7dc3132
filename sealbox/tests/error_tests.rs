use sealbox::CryptorError;
use sealbox_crypto::CryptoError;

#[test]
fn duplicate_recipient_display() {
    let err = CryptorError::DuplicateRecipient("alice".into());
    assert_eq!(err.to_string(), "duplicate recipient: alice");
}

#[test]
fn invalid_key_display() {
    let err = CryptorError::InvalidKey("public key must be 32 bytes, got 3".into());
    assert_eq!(
        err.to_string(),
        "invalid key: public key must be 32 bytes, got 3"
    );
}

#[test]
fn empty_password_display() {
    assert_eq!(
        CryptorError::EmptyPassword.to_string(),
        "password must not be empty"
    );
}

#[test]
fn no_recipients_display() {
    assert_eq!(
        CryptorError::NoRecipients.to_string(),
        "no recipients registered"
    );
}

#[test]
fn recipient_not_found_display() {
    let err = CryptorError::RecipientNotFound("bob".into());
    assert_eq!(err.to_string(), "recipient not found: bob");
}

#[test]
fn unwrap_failure_display() {
    let err = CryptorError::UnwrapFailure("password does not open the envelope".into());
    assert_eq!(
        err.to_string(),
        "failed to unwrap content key: password does not open the envelope"
    );
}

#[test]
fn integrity_and_missing_content_info_display() {
    assert_eq!(
        CryptorError::IntegrityCheckFailed.to_string(),
        "integrity check failed"
    );
    assert_eq!(
        CryptorError::MissingContentInfo.to_string(),
        "content info missing"
    );
}

#[test]
fn format_errors_display() {
    let err = CryptorError::UnsupportedFormat("content info version 9".into());
    assert_eq!(err.to_string(), "unsupported format: content info version 9");

    let err = CryptorError::MalformedEnvelope("bad magic".into());
    assert_eq!(err.to_string(), "malformed envelope: bad magic");
}

#[test]
fn invalid_state_display() {
    let err = CryptorError::InvalidState {
        operation: "encrypt_data",
        state: "terminal",
    };
    assert_eq!(err.to_string(), "encrypt_data not allowed in state terminal");
}

#[test]
fn from_crypto_error() {
    let crypto = CryptoError::KeyDerivation("invalid argon2 parameters".into());
    let err: CryptorError = crypto.into();
    assert!(err.to_string().starts_with("crypto error: key derivation failed"));
}
