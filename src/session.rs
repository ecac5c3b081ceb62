//! Session state decoded from the bearer token issued by `/login`.
//!
//! The token's signature is NOT verified here. Everything read from the
//! payload is provisional: it decides what the UI shows, while the API
//! re-checks the token on every call and remains the only authorization
//! boundary.

use anyhow::{bail, Context, Result};
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// The authenticated identity as the client believes it to be
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub username: String,
    pub is_admin: bool,
    pub expires_at: Option<DateTime<Utc>>,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Subject {
    Identity {
        username: String,
        #[serde(default)]
        is_admin: bool,
    },
    Name(String),
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Subject,
    #[serde(default)]
    is_admin: Option<bool>,
    #[serde(default)]
    exp: Option<i64>,
}

impl Session {
    /// Decode the claims of a JWT-style token (`header.payload.signature`)
    pub fn from_token(token: &str) -> Result<Self> {
        let token = token.trim();
        let payload = token
            .split('.')
            .nth(1)
            .filter(|p| !p.is_empty())
            .context("token has no payload segment")?;

        let bytes = decode_segment(payload)?;
        let claims: Claims =
            serde_json::from_slice(&bytes).context("token payload is not valid claims JSON")?;

        let (username, is_admin) = match claims.sub {
            Subject::Identity { username, is_admin } => {
                (username, claims.is_admin.unwrap_or(is_admin))
            }
            Subject::Name(username) => (username, claims.is_admin.unwrap_or(false)),
        };
        if username.is_empty() {
            bail!("token subject has an empty username");
        }

        let expires_at = claims
            .exp
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        Ok(Session {
            username,
            is_admin,
            expires_at,
            token: token.to_string(),
        })
    }

    /// Raw token, sent back as `Authorization: Bearer <token>`
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Base64url without padding is what JWTs use; plain base64 is accepted too.
fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};

    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .context("token payload is not base64")
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{}.{}.signature", header, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_subject() {
        let token = encode_test_token(&json!({
            "sub": {"username": "noa", "is_admin": true},
            "exp": 1_900_000_000
        }));
        let session = Session::from_token(&token).unwrap();
        assert_eq!(session.username, "noa");
        assert!(session.is_admin);
        assert_eq!(session.token(), token);
        assert_eq!(session.expires_at.unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_string_subject_with_admin_claim() {
        let token = encode_test_token(&json!({"sub": "eitan", "is_admin": false}));
        let session = Session::from_token(&token).unwrap();
        assert_eq!(session.username, "eitan");
        assert!(!session.is_admin);
        assert!(session.expires_at.is_none());
    }

    #[test]
    fn test_standard_padded_payload() {
        use base64::engine::general_purpose::STANDARD;
        let body = STANDARD.encode(json!({"sub": {"username": "dana", "is_admin": false}}).to_string());
        let token = format!("h.{}.s", body);
        let session = Session::from_token(&token).unwrap();
        assert_eq!(session.username, "dana");
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(Session::from_token("").is_err());
        assert!(Session::from_token("onlyone").is_err());
        assert!(Session::from_token("a.!!!.c").is_err());
        let no_sub = encode_test_token(&json!({"user": "x"}));
        assert!(Session::from_token(&no_sub).is_err());
        let empty = encode_test_token(&json!({"sub": ""}));
        assert!(Session::from_token(&empty).is_err());
    }
}
