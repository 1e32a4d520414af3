//! Bearer token issuance and verification

use bizdir_db::UserRole;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::AuthError;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Authenticated principal
///
/// This is both what gets signed into a token and what a guarded handler
/// receives back. It only ever lives for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub email: String,
    pub role: UserRole,
}

impl Identity {
    pub fn new(subject: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            subject: subject.into(),
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Account email
    pub email: String,
    /// Role at issue time
    pub role: UserRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp), always `iat + validity`
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Signs and verifies bearer tokens with a shared HMAC secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl TokenCodec {
    /// Create a codec from the signing secret and the token validity window
    pub fn new(secret: &str, validity: Duration) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::Configuration("signing secret is empty".to_string()));
        }
        if validity <= Duration::zero() {
            return Err(AuthError::Configuration(
                "token validity must be positive".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity,
        })
    }

    /// Validity window applied to every issued token
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a token for an identity
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, AuthError> {
        let expires_at = now.checked_add_signed(self.validity).ok_or_else(|| {
            AuthError::Configuration("token validity overflows the expiry time".to_string())
        })?;

        let claims = Claims {
            sub: identity.subject.clone(),
            email: identity.email.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        debug!("Issuing token for subject {} ({})", claims.sub, claims.role);

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))?;

        metrics::counter!("bizdir_tokens_issued_total").increment(1);
        Ok(token)
    }

    /// Verify a token and return the identity it carries
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked below against `now`, with no leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                    ErrorKind::ExpiredSignature => AuthError::Expired,
                    _ => AuthError::Malformed,
                }
            })?;

        let claims = token_data.claims;
        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-bizdir-tokens";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::hours(24)).unwrap()
    }

    fn identity(role: UserRole) -> Identity {
        Identity::new("u1", "a@b.com", role)
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let codec = codec();

        for role in [UserRole::User, UserRole::Admin] {
            let token = codec.issue(&identity(role)).unwrap();
            let decoded = codec.verify(&token).unwrap();
            assert_eq!(decoded, identity(role));
        }
    }

    #[test]
    fn test_tokens_for_same_identity_differ() {
        let codec = codec();
        let now = Utc::now();

        let first = codec.issue_at(&identity(UserRole::User), now).unwrap();
        let second = codec.issue_at(&identity(UserRole::User), now).unwrap();
        let later = codec
            .issue_at(&identity(UserRole::User), now + Duration::seconds(5))
            .unwrap();

        assert_ne!(first, second);
        assert_ne!(first, later);
    }

    #[test]
    fn test_wrong_secret_is_signature_invalid() {
        let other = TokenCodec::new("another-secret-entirely", Duration::hours(24)).unwrap();
        let token = other.issue(&identity(UserRole::Admin)).unwrap();

        assert_eq!(codec().verify(&token), Err(AuthError::SignatureInvalid));
    }

    #[test]
    fn test_any_single_char_change_is_rejected() {
        let codec = codec();
        let token = codec.issue(&identity(UserRole::Admin)).unwrap();

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            let result = codec.verify(&tampered);
            assert!(
                matches!(
                    result,
                    Err(AuthError::SignatureInvalid) | Err(AuthError::Malformed)
                ),
                "position {} accepted or misclassified: {:?}",
                i,
                result
            );
        }
    }

    #[test]
    fn test_payload_change_is_signature_invalid() {
        let codec = codec();
        let token = codec.issue(&identity(UserRole::User)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        // Re-sign nothing: splice in the payload of an admin token
        let admin = codec.issue(&identity(UserRole::Admin)).unwrap();
        let admin_payload = admin.split('.').nth(1).unwrap();
        let forged = format!("{}.{}.{}", parts[0], admin_payload, parts[2]);

        assert_eq!(codec.verify(&forged), Err(AuthError::SignatureInvalid));
    }

    #[test]
    fn test_expired_after_validity_window() {
        let codec = codec();
        let issued_at = Utc::now();
        let token = codec.issue_at(&identity(UserRole::User), issued_at).unwrap();

        let just_before = issued_at + Duration::hours(24) - Duration::seconds(1);
        assert!(codec.verify_at(&token, just_before).is_ok());

        let just_after = issued_at + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(codec.verify_at(&token, just_after), Err(AuthError::Expired));
    }

    #[test]
    fn test_token_issued_in_the_past_is_expired_now() {
        let codec = codec();
        let token = codec
            .issue_at(&identity(UserRole::Admin), Utc::now() - Duration::hours(25))
            .unwrap();

        assert_eq!(codec.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();

        assert_eq!(codec.verify("invalid-token"), Err(AuthError::Malformed));
        assert_eq!(codec.verify("a.b.c"), Err(AuthError::Malformed));
        assert_eq!(codec.verify(""), Err(AuthError::Malformed));
    }

    #[test]
    fn test_other_algorithm_is_malformed() {
        let claims = Claims {
            sub: "u1".to_string(),
            email: "a@b.com".to_string(),
            role: UserRole::Admin,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec().verify(&token), Err(AuthError::Malformed));
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(matches!(
            TokenCodec::new("", Duration::hours(1)),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            TokenCodec::new("   ", Duration::hours(1)),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            TokenCodec::new(SECRET, Duration::zero()),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_oversized_validity_fails_instead_of_panicking() {
        let codec = TokenCodec::new(SECRET, Duration::MAX).unwrap();

        assert!(matches!(
            codec.issue(&identity(UserRole::User)),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_expiry_is_issue_time_plus_validity() {
        let codec = TokenCodec::new(SECRET, Duration::hours(3)).unwrap();
        let now = Utc::now();
        let token = codec.issue_at(&identity(UserRole::User), now).unwrap();

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims.iat, now.timestamp());
        assert_eq!(data.claims.exp - data.claims.iat, 3 * 3600);
    }
}
