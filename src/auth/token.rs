//! Token issuance and verification.
//!
//! Tokens are compact JWTs (HS256) built and checked here directly: base64url
//! header/payload segments signed with HMAC-SHA256 over
//! `header_part.payload_part`. Interoperable with standard HS256 consumers,
//! with a fixed header and a fixed 24-hour lifetime.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Fixed token lifetime: 24 hours.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Why an authentication attempt was rejected.
///
/// Every variant collapses to a plain 401 at the HTTP boundary; the kinds
/// exist so logs and tests can tell the failure modes apart.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no bearer credentials presented")]
    MissingCredentials,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token signature")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token subject is inactive or unknown")]
    InactiveIdentity,

    #[error("user directory lookup failed: {0}")]
    DirectoryUnavailable(anyhow::Error),
}

/// Claim set carried inside a token.
///
/// Field names are the wire names; tokens minted by earlier deployments of
/// this API decode into the same shape. `iat`/`exp` are optional on inbound
/// tokens: a token without `exp` never expires (the original behaved the same
/// way), while `issue` always stamps both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub employee_id: i32,
    pub username: String,
    pub role_id: i32,
    pub role_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Claims for a freshly issued token: `iat = now`, `exp = now + 24h`.
    pub fn new(
        user_id: i32,
        employee_id: i32,
        username: &str,
        role_id: i32,
        role_name: &str,
    ) -> Self {
        let now = Utc::now().timestamp();
        Self {
            user_id,
            employee_id,
            username: username.to_string(),
            role_id,
            role_name: role_name.to_string(),
            iat: Some(now),
            exp: Some(now + TOKEN_TTL_SECS),
        }
    }
}

/// Token header. Serialized field order matches the wire bytes the original
/// API produced (`{"typ":"JWT","alg":"HS256"}`).
#[derive(Serialize)]
struct Header {
    typ: &'static str,
    alg: &'static str,
}

/// Signs and verifies compact HS256 tokens with the process-wide secret.
///
/// The secret is loaded once at startup and held immutable for the process
/// lifetime.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        write!(f, "TokenService([REDACTED])")
    }
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Issue a signed token for the given identity.
    ///
    /// Pure function of its inputs, the current time and the process secret;
    /// there is no failure path for well-formed inputs.
    pub fn issue(
        &self,
        user_id: i32,
        employee_id: i32,
        username: &str,
        role_id: i32,
        role_name: &str,
    ) -> String {
        let claims = Claims::new(user_id, employee_id, username, role_id, role_name);

        let header = serde_json::to_vec(&Header {
            typ: "JWT",
            alg: "HS256",
        })
        .expect("serialize token header");
        let payload = serde_json::to_vec(&claims).expect("serialize claims");

        let header_part = URL_SAFE_NO_PAD.encode(header);
        let payload_part = URL_SAFE_NO_PAD.encode(payload);
        let signature_part =
            URL_SAFE_NO_PAD.encode(self.mac_for(&header_part, &payload_part).finalize().into_bytes());

        format!("{}.{}.{}", header_part, payload_part, signature_part)
    }

    /// Verify a token and return its claims.
    ///
    /// The signature is checked before the payload is decoded or parsed, so
    /// no structured data from an unauthenticated token is ever interpreted.
    /// The header segment participates in the MAC but is never read back: the
    /// verifier applies HS256 unconditionally, so `alg` smuggling has no
    /// effect.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut segments = token.split('.');
        let (header_part, payload_part, signature_part) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(p), Some(s), None)
                    if !h.is_empty() && !p.is_empty() && !s.is_empty() =>
                {
                    (h, p, s)
                }
                _ => return Err(AuthError::MalformedToken),
            };

        // A signature segment that is not valid base64url cannot match a MAC.
        let provided = URL_SAFE_NO_PAD
            .decode(signature_part)
            .map_err(|_| AuthError::BadSignature)?;
        self.mac_for(header_part, payload_part)
            .verify_slice(&provided)
            .map_err(|_| AuthError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_part)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;

        // Expiry is strict: `exp == now` is still valid for this second.
        if let Some(exp) = claims.exp {
            if exp < Utc::now().timestamp() {
                return Err(AuthError::Expired);
            }
        }

        Ok(claims)
    }

    /// HMAC-SHA256 over `header_part.payload_part`, keyed with the secret.
    fn mac_for(&self, header_part: &str, payload_part: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(header_part.as_bytes());
        mac.update(b".");
        mac.update(payload_part.as_bytes());
        mac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_SECRET: &str = "test-secret-key-for-signing";

    fn service() -> TokenService {
        TokenService::new(TEST_SECRET)
    }

    /// Build a token with an arbitrary payload, signed with the service's
    /// own primitives.
    fn forge(service: &TokenService, payload: &serde_json::Value) -> String {
        let header_part = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"HS256"}"#);
        let payload_part =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).expect("serialize test payload"));
        let signature_part = URL_SAFE_NO_PAD.encode(
            service
                .mac_for(&header_part, &payload_part)
                .finalize()
                .into_bytes(),
        );
        format!("{}.{}.{}", header_part, payload_part, signature_part)
    }

    fn flip_char(token: &str, idx: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).expect("still ascii")
    }

    #[test]
    fn issue_verify_round_trip() {
        let svc = service();
        let token = svc.issue(42, 17, "mreyes", 3, "HR Manager");

        // Compact JWT shape: three unpadded base64url segments.
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));

        let claims = svc.verify(&token).expect("fresh token verifies");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.employee_id, 17);
        assert_eq!(claims.username, "mreyes");
        assert_eq!(claims.role_id, 3);
        assert_eq!(claims.role_name, "HR Manager");

        let iat = claims.iat.expect("iat stamped");
        let exp = claims.exp.expect("exp stamped");
        assert_eq!(exp - iat, TOKEN_TTL_SECS);
        assert!(exp > iat);
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let token = service().issue(1, 1, "someone", 1, "Employee");
        let other = TokenService::new("a-different-secret");
        assert!(matches!(other.verify(&token), Err(AuthError::BadSignature)));
    }

    #[test]
    fn tampered_segments_are_rejected() {
        let svc = service();
        let token = svc.issue(1, 1, "someone", 1, "Employee");
        let header_len = token.find('.').unwrap();

        // Header, payload and signature each differ by one character.
        let cases = [
            flip_char(&token, 0),
            flip_char(&token, header_len + 1),
            flip_char(&token, token.len() - 1),
        ];
        for tampered in cases {
            match svc.verify(&tampered) {
                Err(AuthError::BadSignature) | Err(AuthError::MalformedToken) => {}
                other => panic!("tampered token not rejected: {:?}", other),
            }
        }
    }

    #[test]
    fn signature_is_checked_before_payload_is_parsed() {
        // Garbage payload signed with the wrong secret must report the
        // signature failure, proving the payload was never interpreted.
        let intruder = TokenService::new("intruder-secret");
        let token = forge(&intruder, &json!(["not", "an", "object"]));
        assert!(matches!(
            service().verify(&token),
            Err(AuthError::BadSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let now = Utc::now().timestamp();
        let token = forge(
            &svc,
            &json!({
                "user_id": 42, "employee_id": 17, "username": "mreyes",
                "role_id": 3, "role_name": "HR Manager",
                "iat": now - 100, "exp": now - 1,
            }),
        );
        assert!(matches!(svc.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn token_expiring_in_the_future_verifies() {
        let svc = service();
        let now = Utc::now().timestamp();
        let token = forge(
            &svc,
            &json!({
                "user_id": 42, "employee_id": 17, "username": "mreyes",
                "role_id": 3, "role_name": "HR Manager",
                "iat": now, "exp": now + 1,
            }),
        );
        assert!(svc.verify(&token).is_ok());
    }

    #[test]
    fn token_without_exp_never_expires() {
        let svc = service();
        let token = forge(
            &svc,
            &json!({
                "user_id": 7, "employee_id": 7, "username": "legacy",
                "role_id": 2, "role_name": "Employee",
            }),
        );
        let claims = svc.verify(&token).expect("exp-less token verifies");
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn malformed_tokens_are_rejected_without_panicking() {
        let svc = service();
        for bad in ["", "abc", "a.b", "a.b.c.d", "a..c", ".b.c", "a.b."] {
            assert!(
                matches!(svc.verify(bad), Err(AuthError::MalformedToken)),
                "expected MalformedToken for {:?}",
                bad
            );
        }
    }

    #[test]
    fn correctly_signed_non_object_payload_is_malformed() {
        let svc = service();
        for payload in [json!([1, 2, 3]), json!("just a string"), json!(17)] {
            let token = forge(&svc, &payload);
            assert!(matches!(svc.verify(&token), Err(AuthError::MalformedToken)));
        }
    }

    #[test]
    fn payload_missing_identity_fields_is_malformed() {
        let svc = service();
        let token = forge(&svc, &json!({ "user_id": 42 }));
        assert!(matches!(svc.verify(&token), Err(AuthError::MalformedToken)));
    }
}
