//! Cryptographic primitives backing the signed-directory format: SHA-1
//! digesting of the signed byte range, RSA public-key parsing from the
//! base64 body of a PEM-armored block, and RSA-PKCSv1 signature
//! verification.
//!
//! Tor's directory protocol signs the raw SHA-1 digest directly (no
//! DigestInfo ASN.1 wrapper), so verification uses `Pkcs1v15Sign` in its
//! "unprefixed" mode, exactly as `tor-llcrypto::pk::rsa::PublicKey::verify`
//! does for the same wire format.
//!
//! Key parsing goes through `from_pkcs1_der` rather than `from_pkcs1_pem`:
//! the latter needs the `rsa` crate's `pem` feature, which this crate does
//! not enable (matching `tor-llcrypto::pk::rsa::PublicKey::from_der`, the
//! only precedent for RSA key parsing in the retrieved pack, which also
//! works from raw DER). The scanner hands us the base64 body already
//! stripped of its armor tags; we decode that ourselves before handing the
//! DER bytes to `rsa`.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::RsaPublicKey;
use sha1::{Digest, Sha1};

use crate::error::Error;

/// Length in bytes of an RSA-1024 PKCSv1 signature.
pub const SIGNATURE_LEN: usize = 128;
/// Length in bytes of a SHA-1 digest.
pub const DIGEST_LEN: usize = 20;

/// SHA-1 digest of `bytes`.
pub fn sha1_digest(bytes: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Parse an RSA public key from the base64 body of a
/// `"-----BEGIN RSA PUBLIC KEY-----"` block (armor tags already stripped by
/// the scanner; embedded line breaks are tolerated).
pub fn parse_public_key(body: &str) -> Result<RsaPublicKey, Error> {
    let cleaned: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let der = base64::decode(&cleaned)
        .map_err(|e| Error::Cryptographic(format!("error decoding public key: {e}")))?;
    RsaPublicKey::from_pkcs1_der(&der)
        .map_err(|e| Error::Cryptographic(format!("couldn't parse public key: {e}")))
}

/// Base64-decode an armored signature body (which may contain embedded line
/// breaks) into a fixed 128-byte buffer. Any other decoded length is an
/// error.
pub fn decode_signature(body: &str) -> Result<[u8; SIGNATURE_LEN], Error> {
    let cleaned: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = base64::decode(&cleaned)
        .map_err(|e| Error::Cryptographic(format!("error decoding signature: {e}")))?;
    decoded
        .try_into()
        .map_err(|v: Vec<u8>| Error::Cryptographic(format!("bad length on decoded signature: {}", v.len())))
}

/// Verify that `sig`, decrypted under `key`, is byte-for-byte equal to
/// `expected_digest`.
pub fn verify_signature(
    key: &RsaPublicKey,
    sig: &[u8; SIGNATURE_LEN],
    expected_digest: &[u8; DIGEST_LEN],
) -> Result<(), Error> {
    let padding = Pkcs1v15Sign::new_unprefixed();
    key.verify(padding, expected_digest, sig)
        .map_err(|_| Error::Cryptographic("signature does not match digest".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_of_known_input() {
        let digest = sha1_digest(b"abc");
        assert_eq!(
            digest,
            [
                0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78, 0x50,
                0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d,
            ]
        );
    }

    #[test]
    fn rejects_wrong_length_signature() {
        let too_short = base64::encode([0u8; 127]);
        assert!(matches!(decode_signature(&too_short).unwrap_err(), Error::Cryptographic(_)));

        let too_long = base64::encode([0u8; 129]);
        assert!(matches!(decode_signature(&too_long).unwrap_err(), Error::Cryptographic(_)));
    }

    #[test]
    fn parses_public_key_from_armor_body() {
        let body = "MIGJAoGBALD6Dbj1okBj4mmz/sCgIGFJk/CTWlMsT3CS1kP7Q2gAaDewEbo1+me3\nX5f3QpvZ9Yh2l5Q+btU4a/Yib3pg/KhyX96Z5zrvz9dGPPXGORpwawMIH7Aa+jtp\nv2l0misfGCloIamfI5dzayTu9gR4emuKm34tipkfIz6hLkO7xW1nAgMBAAE=";
        assert!(parse_public_key(body).is_ok());
    }

    #[test]
    fn decodes_signature_with_embedded_newlines() {
        let body = base64::encode([7u8; 128]);
        let mut armored = String::new();
        for chunk in body.as_bytes().chunks(16) {
            armored.push_str(std::str::from_utf8(chunk).unwrap());
            armored.push('\n');
        }
        let decoded = decode_signature(&armored).unwrap();
        assert_eq!(decoded, [7u8; 128]);
    }
}
