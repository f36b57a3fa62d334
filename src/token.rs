//! Backend access tokens
//!
//! The backend issues HS256 JWTs carrying `exp` and `iat` claims, signed
//! with a secret it shares with trusted clients. The session treats the
//! token as opaque unless a secret is configured; these helpers only read
//! it and check its signature.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::collections::HashMap;

use crate::error::ClientError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// Claims carried by a backend token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiry, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Any other claims
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl TokenClaims {
    /// Expiry as a timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Issue time as a timestamp
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.iat.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Check whether the token has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check expiry against the given instant; a token without `exp` never expires
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(exp) => exp <= now,
            None => false,
        }
    }
}

/// Split a token into its three segments
fn split(token: &str) -> Result<(&str, &str, &str), ClientError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() => Ok((h, p, s)),
        _ => Err(ClientError::InvalidToken(
            "expected three dot-separated segments".to_string(),
        )),
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str, what: &str) -> Result<T, ClientError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| ClientError::InvalidToken(format!("{} is not base64url: {}", what, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::InvalidToken(format!("{} is not JSON: {}", what, e)))
}

/// Decode the claims without checking the signature
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClientError> {
    let (_, payload, _) = split(token)?;
    decode_segment(payload, "payload")
}

/// Verify an HS256 token against the shared secret and return its claims
///
/// Expiry is not enforced here; callers decide what to do with
/// [`TokenClaims::is_expired`].
pub fn verify_hs256(token: &str, secret: &str) -> Result<TokenClaims, ClientError> {
    let (header, payload, signature) = split(token)?;

    let header: Header = decode_segment(header, "header")?;
    if header.alg != "HS256" {
        return Err(ClientError::InvalidToken(format!(
            "unsupported algorithm: {}",
            header.alg
        )));
    }

    let expected = create_signature(&token[..token.len() - signature.len() - 1], secret)?;
    if !constant_time_compare(&expected, signature.trim_end_matches('=')) {
        return Err(ClientError::InvalidToken("signature mismatch".to_string()));
    }

    decode_segment(payload, "payload")
}

/// HMAC-SHA256 over the signing input, base64url without padding
fn create_signature(signing_input: &str, secret: &str) -> Result<String, ClientError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ClientError::InvalidConfig(format!("unusable token secret: {}", e)))?;
    mac.update(signing_input.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
pub(crate) fn sign_hs256(claims: &Value, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    let signing_input = format!("{}.{}", header, payload);
    let signature = create_signature(&signing_input, secret).unwrap();
    format!("{}.{}", signing_input, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "welcome to the console";

    #[test]
    fn test_verify_valid_token() {
        let token = sign_hs256(&json!({ "exp": 4_102_444_800i64, "iat": 1_700_000_000 }), SECRET);

        let claims = verify_hs256(&token, SECRET).unwrap();
        assert_eq!(claims.exp, Some(4_102_444_800));
        assert_eq!(claims.iat, Some(1_700_000_000));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign_hs256(&json!({ "exp": 4_102_444_800i64 }), SECRET);
        assert!(matches!(
            verify_hs256(&token, "another secret"),
            Err(ClientError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = sign_hs256(&json!({ "exp": 1 }), SECRET);
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"exp":4102444800}"#);
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_payload;
        let forged = parts.join(".");

        assert!(verify_hs256(&forged, SECRET).is_err());
        // Unverified decoding still reads the forged claims
        assert_eq!(decode_claims(&forged).unwrap().exp, Some(4_102_444_800));
    }

    #[test]
    fn test_non_hs256_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{}"#);
        let token = format!("{}.{}.", header, payload);
        let err = verify_hs256(&token, SECRET).unwrap_err();
        assert!(err.to_string().contains("unsupported algorithm"));
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(decode_claims("").is_err());
        assert!(decode_claims("opaque-token").is_err());
        assert!(decode_claims("a.b.c.d").is_err());
        assert!(decode_claims("a.!!!.c").is_err());
    }

    #[test]
    fn test_expiry() {
        let claims = TokenClaims {
            exp: Some(1_000),
            ..Default::default()
        };
        let before = Utc.timestamp_opt(999, 0).unwrap();
        let after = Utc.timestamp_opt(1_000, 0).unwrap();
        assert!(!claims.is_expired_at(before));
        assert!(claims.is_expired_at(after));
        assert!(!TokenClaims::default().is_expired());
    }

    #[test]
    fn test_extra_claims_kept() {
        let token = sign_hs256(&json!({ "sub": "alice", "iat": 5 }), SECRET);
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.extra.get("sub"), Some(&json!("alice")));
        assert_eq!(claims.issued_at().unwrap().timestamp(), 5);
    }
}
