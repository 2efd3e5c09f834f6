//! Integration tests for the hybrid envelope cipher.
//!
//! Tests cover:
//!  1. Round-trip (empty, short, multi-byte, long messages)
//!  2. Fresh content key + IV per call
//!  3. Tamper detection on every byte of the payload segment
//!  4. Wire format validation
//!  5. Key mismatch
//!  6. Malformed recipient key on encrypt

use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use vc_crypto::aead::{IV_LEN, TAG_LEN};
use vc_crypto::keys::WRAPPED_KEY_LEN;
use vc_crypto::{CryptoError, Envelope, EnvelopeCipher, KeyPair};

fn alice() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| KeyPair::generate().unwrap())
}

fn bob() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| KeyPair::generate().unwrap())
}

fn seal(msg: &str) -> Envelope {
    EnvelopeCipher::encrypt(&alice().public_key, msg).unwrap()
}

/// Rebuild an envelope after mutating the decoded payload segment.
fn with_payload(env: &Envelope, f: impl FnOnce(&mut Vec<u8>)) -> Envelope {
    let (wrapped, mut payload) = env.decode().unwrap();
    f(&mut payload);
    Envelope::encode(&wrapped, &payload)
}

// ─── Round-trip ─────────────────────────────────────────────────────────────

#[test]
fn roundtrip_various_messages() {
    let long = "x".repeat(1500);
    let messages = [
        "",
        "I like you",
        "Je t'aime ❤️ — 愛してる",
        long.as_str(),
    ];
    for msg in messages {
        let env = seal(msg);
        let opened = EnvelopeCipher::decrypt(&alice().private_key, &env).unwrap();
        assert_eq!(opened, msg);
    }
}

#[test]
fn envelope_layout_matches_wire_format() {
    let env = seal("hello");
    assert_eq!(env.as_str().matches('.').count(), 1);
    let (wrapped, payload) = env.decode().unwrap();
    assert_eq!(wrapped.len(), WRAPPED_KEY_LEN);
    assert_eq!(payload.len(), IV_LEN + "hello".len() + TAG_LEN);
    assert!(env
        .as_str()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "+/=.".contains(c)));
}

#[test]
fn size_grows_linearly_with_plaintext() {
    let short = seal("a").as_str().len();
    let long = seal(&"a".repeat(301)).as_str().len();
    // base64 expands 3 bytes to 4 characters
    assert_eq!(long - short, 400);
    assert!(short < 400);
}

#[test]
fn encrypt_for_published_spki() {
    let spki = alice().public_key.to_spki_b64().unwrap();
    let env = EnvelopeCipher::encrypt_for(&spki, "from a stranger").unwrap();
    let opened = EnvelopeCipher::decrypt(&alice().private_key, &env).unwrap();
    assert_eq!(opened, "from a stranger");
}

// ─── Non-determinism ────────────────────────────────────────────────────────

#[test]
fn same_message_seals_differently() {
    let a = seal("same words");
    let b = seal("same words");
    assert_ne!(a, b);
    let (ka, pa) = a.decode().unwrap();
    let (kb, pb) = b.decode().unwrap();
    assert_ne!(ka, kb);
    assert_ne!(pa[..IV_LEN], pb[..IV_LEN]);
    assert_ne!(pa[IV_LEN..], pb[IV_LEN..]);
}

// ─── Tamper detection ───────────────────────────────────────────────────────

#[test]
fn any_flipped_payload_byte_is_detected() {
    let env = seal("do not touch");
    let payload_len = env.decode().unwrap().1.len();
    for i in 0..payload_len {
        let tampered = with_payload(&env, |p| p[i] ^= 0x01);
        let err = EnvelopeCipher::decrypt(&alice().private_key, &tampered).unwrap_err();
        assert!(
            matches!(err, CryptoError::TamperOrCorruption),
            "byte {i}: {err:?}"
        );
    }
}

#[test]
fn swapped_payload_between_envelopes_is_detected() {
    let a = seal("first");
    let b = seal("second");
    let (wrapped_a, _) = a.decode().unwrap();
    let (_, payload_b) = b.decode().unwrap();
    let franken = Envelope::encode(&wrapped_a, &payload_b);
    let err = EnvelopeCipher::decrypt(&alice().private_key, &franken).unwrap_err();
    assert!(matches!(err, CryptoError::TamperOrCorruption));
}

// ─── Format validation ──────────────────────────────────────────────────────

#[test]
fn malformed_envelopes_are_rejected() {
    let good = seal("hi");
    let (wrapped, payload) = good.decode().unwrap();
    let wrapped_b64 = STANDARD.encode(&wrapped);
    let payload_b64 = STANDARD.encode(&payload);

    let cases = vec![
        format!("{wrapped_b64}{payload_b64}"),
        format!("{wrapped_b64}.{payload_b64}.{payload_b64}"),
        format!("{wrapped_b64}..{payload_b64}"),
        format!("{wrapped_b64}."),
        format!(".{payload_b64}"),
        format!("{wrapped_b64}.%%%%"),
        format!("!!!!.{payload_b64}"),
        String::new(),
    ];
    for case in cases {
        let err = EnvelopeCipher::decrypt(&alice().private_key, &Envelope::from(case.clone()))
            .unwrap_err();
        assert!(matches!(err, CryptoError::MalformedEnvelope(_)), "{case}");
    }
}

#[test]
fn truncated_wrapped_key_is_malformed() {
    let (wrapped, payload) = seal("hi").decode().unwrap();
    let env = Envelope::encode(&wrapped[..WRAPPED_KEY_LEN - 1], &payload);
    let err = EnvelopeCipher::decrypt(&alice().private_key, &env).unwrap_err();
    assert!(matches!(err, CryptoError::MalformedEnvelope(_)));
}

// ─── Key mismatch ───────────────────────────────────────────────────────────

#[test]
fn wrong_private_key_is_key_mismatch() {
    let env = seal("for alice only");
    let err = EnvelopeCipher::decrypt(&bob().private_key, &env).unwrap_err();
    assert!(matches!(err, CryptoError::KeyMismatch));
}

#[test]
fn corrupted_wrapped_key_is_key_mismatch() {
    let (mut wrapped, payload) = seal("hi").decode().unwrap();
    wrapped[10] ^= 0xff;
    let env = Envelope::encode(&wrapped, &payload);
    let err = EnvelopeCipher::decrypt(&alice().private_key, &env).unwrap_err();
    assert!(matches!(err, CryptoError::KeyMismatch));
}

// ─── Encoding errors ────────────────────────────────────────────────────────

#[test]
fn malformed_recipient_key_is_encoding_error() {
    for bad in ["", "definitely not a key", "QUJDRA=="] {
        let err = EnvelopeCipher::encrypt_for(bad, "hello").unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)), "{bad:?}");
    }
}
