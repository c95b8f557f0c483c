//! RS256 JWT minting with a certificate-fingerprint `kid`.
//!
//! Baseline claims (`iss`, `sub`, `iat`, `exp`, `jti`) are always stamped
//! by the minter. User-supplied claims are overlaid first and the
//! baseline is stamped on top, so baseline wins for all five — this is
//! the open question spec.md §9 calls out between source revisions,
//! resolved here in favor of the revision the pinned tests require.

use crate::clock::Clock;
use crate::error::JwtError;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{Map, Value};
use sha1::{Digest, Sha1};
use std::time::Duration;

/// Uppercase hex SHA-1 of a PEM certificate's DER bytes, used as the JWT
/// `kid` header. Always 40 hex characters, uppercase.
pub fn certificate_fingerprint(cert_pem: &str) -> Result<String, JwtError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(cert_pem.as_bytes())
        .map_err(|e| JwtError::CertificateParseError(e.to_string()))?;
    pem.parse_x509()
        .map_err(|e| JwtError::CertificateParseError(e.to_string()))?;
    let mut hasher = Sha1::new();
    hasher.update(&pem.contents);
    let digest = hasher.finalize();
    Ok(hex_upper(&digest))
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Mint a compact RS256 JWT.
///
/// `user_claims` is overlaid first; the baseline (`iss`, `sub`, `iat`,
/// `exp`, `jti`) is stamped afterwards and always wins for those five
/// keys. If `cert_pem` is supplied, its fingerprint becomes the JWT
/// header's `kid`; otherwise `kid` is omitted.
pub fn mint(
    private_key_pem: &str,
    cert_pem: Option<&str>,
    user_claims: &Map<String, Value>,
    duration: Duration,
    clock: &dyn Clock,
    client_id: &str,
) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| JwtError::ParseError(e.to_string()))?;

    let now = clock.now_unix();
    let exp = now + duration.as_secs() as i64;
    let jti = uuid::Uuid::new_v4().to_string();

    let mut claims = user_claims.clone();
    claims.insert("iss".to_string(), Value::String(client_id.to_string()));
    claims.insert("sub".to_string(), Value::String(client_id.to_string()));
    claims.insert("iat".to_string(), Value::Number(now.into()));
    claims.insert("exp".to_string(), Value::Number(exp.into()));
    claims.insert("jti".to_string(), Value::String(jti));

    let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
    if let Some(cert_pem) = cert_pem {
        header.kid = Some(certificate_fingerprint(cert_pem)?);
    }

    encode(&header, &claims, &encoding_key).map_err(|e| JwtError::SignError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use serde_json::json;

    // Freshly generated 2048-bit RSA test key, PKCS#1 PEM, used only in
    // this module's tests.
    const TEST_PRIVATE_KEY: &str = include_str!("../tests/fixtures/test_rsa_key.pem");
    const TEST_CERT: &str = include_str!("../tests/fixtures/test_cert.pem");

    #[test]
    fn baseline_claims_win_over_user_supplied_overlaps() {
        let clock = FixedClock::new(1_700_000_000);
        let user_claims: Map<String, Value> = json!({
            "iss": "attacker-controlled",
            "jti": "attacker-controlled",
            "scope": "read:all"
        })
        .as_object()
        .unwrap()
        .clone();

        let token = mint(
            TEST_PRIVATE_KEY,
            None,
            &user_claims,
            Duration::from_secs(300),
            &clock,
            "client-123",
        )
        .unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.insecure_disable_signature_validation();
        let decoded = decode::<Map<String, Value>>(
            &token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.claims["iss"], "client-123");
        assert_eq!(decoded.claims["sub"], "client-123");
        assert_eq!(decoded.claims["iat"], 1_700_000_000);
        assert_eq!(decoded.claims["exp"], 1_700_000_300);
        assert_ne!(decoded.claims["jti"], "attacker-controlled");
        uuid::Uuid::parse_str(decoded.claims["jti"].as_str().unwrap()).unwrap();
        assert_eq!(decoded.claims["scope"], "read:all");
    }

    #[test]
    fn kid_is_40_char_uppercase_hex_fingerprint() {
        let kid = certificate_fingerprint(TEST_CERT).unwrap();
        assert_eq!(kid.len(), 40);
        assert!(kid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn kid_omitted_without_certificate() {
        let clock = FixedClock::new(1_700_000_000);
        let claims = Map::new();
        let token = mint(
            TEST_PRIVATE_KEY,
            None,
            &claims,
            Duration::from_secs(60),
            &clock,
            "client",
        )
        .unwrap();
        let header_b64 = token.split('.').next().unwrap();
        let header_json = String::from_utf8(
            base64::Engine::decode(
                &base64::engine::general_purpose::URL_SAFE_NO_PAD,
                header_b64,
            )
            .unwrap(),
        )
        .unwrap();
        assert!(!header_json.contains("\"kid\""));
    }
}
