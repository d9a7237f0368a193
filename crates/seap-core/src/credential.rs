//! Bearer credential and its decoded claims

use chrono::{DateTime, Utc};
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ClientError, Result};

/// Signed bearer token identifying an authenticated session.
///
/// The value is zeroed when dropped and never shown by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Wrap a token. Surrounding whitespace is trimmed; an empty token is rejected.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let mut token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            token.zeroize();
            return Err(ClientError::InvalidToken("empty token".to_string()));
        }
        if trimmed.len() != token.len() {
            let owned = trimmed.to_string();
            token.zeroize();
            token = owned;
        }
        Ok(Self { token })
    }

    /// Get the raw token (use carefully)
    pub fn expose(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Decode the payload segment without verifying the signature.
    ///
    /// Only for display; the server is the sole judge of validity.
    pub fn claims(&self) -> Result<Claims> {
        let mut segments = self.token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) => payload,
            _ => {
                return Err(ClientError::InvalidToken(
                    "expected three dot-separated segments".to_string(),
                ))
            }
        };

        let bytes = base64_url_decode(payload)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Claims the backend puts in the token payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Claims {
    /// User id
    #[serde(default)]
    pub id: Option<i64>,
    /// Display name
    #[serde(default)]
    pub username: Option<String>,
    /// Expiry as a Unix timestamp
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Expiry as a timestamp, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Whether the expiry has passed at `now`. Tokens without `exp` never expire locally.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

fn base64_url_decode(segment: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| ClientError::InvalidToken(format!("payload is not base64url: {}", e)))
}

#[cfg(test)]
pub(crate) fn make_token(claims_json: &str) -> String {
    use base64::Engine;
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.signature",
        engine.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        engine.encode(claims_json)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        assert!(Credential::new("").is_err());
        assert!(Credential::new("   \n").is_err());
    }

    #[test]
    fn test_trims_whitespace() {
        let credential = Credential::new("  abc.def.ghi \n").unwrap();
        assert_eq!(credential.expose(), "abc.def.ghi");
        assert_eq!(credential.bearer(), "Bearer abc.def.ghi");
    }

    #[test]
    fn test_debug_redacts() {
        let credential = Credential::new("super-secret").unwrap();
        let shown = format!("{:?}", credential);
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("REDACTED"));
    }

    #[test]
    fn test_decode_claims() {
        let token = make_token(r#"{"id":7,"username":"ana","exp":1700000000}"#);
        let claims = Credential::new(token).unwrap().claims().unwrap();

        assert_eq!(claims.id, Some(7));
        assert_eq!(claims.username.as_deref(), Some("ana"));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_700_000_000);
        assert!(claims.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_claims_without_exp_never_expire() {
        let token = make_token(r#"{"username":"ana"}"#);
        let claims = Credential::new(token).unwrap().claims().unwrap();
        assert!(!claims.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_malformed_claims() {
        assert!(Credential::new("not-a-jwt").unwrap().claims().is_err());
        assert!(Credential::new("a.!!!.c").unwrap().claims().is_err());
    }
}
