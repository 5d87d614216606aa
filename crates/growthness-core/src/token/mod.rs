//! Access and password-reset token generation and validation.
//!
//! Tokens are HMAC-SHA256 based, scoped to a (user_id, expires_at) pair.
//! Format: `growth_at_<user_id>_<expires_unix>_<hmac_hex>`
//!
//! Reset tokens (`growth_pr_...`) also sign the user's current password
//! hash, so they stop validating once the password changes.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Token prefix used to identify growthness access tokens.
const TOKEN_PREFIX: &str = "growth_at_";

/// Token prefix used to identify password-reset tokens.
const RESET_TOKEN_PREFIX: &str = "growth_pr_";

/// Default token lifetime: one day.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86_400;

/// Lifetime of a password-reset token.
pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

/// Errors that can occur during token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("invalid user ID in token: {0}")]
    InvalidUserId(String),

    #[error("invalid expiry in token: {0}")]
    InvalidExpiry(String),

    #[error("token HMAC verification failed")]
    HmacMismatch,

    #[error("token has expired")]
    Expired,

    #[error("missing token secret")]
    MissingSecret,
}

/// Configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// The HMAC secret key bytes.
    pub secret: Vec<u8>,
    /// Lifetime of newly issued tokens.
    pub ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: Vec<u8>, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Build a config from a hex-encoded secret (as written by
    /// `growthness init`).
    pub fn from_hex(secret_hex: &str, ttl: Duration) -> Result<Self, TokenError> {
        if secret_hex.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let secret = hex::decode(secret_hex)
            .map_err(|e| TokenError::InvalidFormat(format!("token secret is not valid hex: {e}")))?;
        Ok(Self::new(secret, ttl))
    }
}

/// Claims extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: Uuid,
    /// Unix timestamp (seconds) after which the token is rejected.
    pub expires_at: i64,
}

/// A freshly issued token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issue a token for `user_id` valid for `config.ttl` from `now`.
pub fn issue_token(config: &TokenConfig, user_id: Uuid, now: DateTime<Utc>) -> IssuedToken {
    let expires_at = now + config.ttl;
    IssuedToken {
        token: generate_token(config, user_id, expires_at.timestamp()),
        expires_at,
    }
}

/// Generate a token for a given user and expiry.
///
/// The HMAC-SHA256 is computed over `<user_id>:<expires_at>`.
pub fn generate_token(config: &TokenConfig, user_id: Uuid, expires_at: i64) -> String {
    let message = format!("{user_id}:{expires_at}");
    let mac = compute_hmac(&config.secret, message.as_bytes());
    let hmac_hex = hex::encode(mac);
    format!("{TOKEN_PREFIX}{user_id}_{expires_at}_{hmac_hex}")
}

/// Validate a token at time `now` and extract its claims.
///
/// The HMAC is checked (in constant time) before the expiry, so a forged
/// token is always reported as such.
pub fn validate_token(
    config: &TokenConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Result<TokenClaims, TokenError> {
    let raw = split_token(TOKEN_PREFIX, token)?;
    let message = format!("{}:{}", raw.user_id, raw.expires_at);
    raw.verify(config, &message, now)
}

/// Issue a single-use password-reset token for `user_id`, bound to the
/// user's current `password_hash` (`None` for accounts without one).
pub fn issue_reset_token(
    config: &TokenConfig,
    user_id: Uuid,
    password_hash: Option<&str>,
    now: DateTime<Utc>,
) -> IssuedToken {
    let expires_at = now + RESET_TOKEN_TTL;
    let message = reset_message(user_id, expires_at.timestamp(), password_hash);
    let hmac_hex = hex::encode(compute_hmac(&config.secret, message.as_bytes()));
    IssuedToken {
        token: format!(
            "{RESET_TOKEN_PREFIX}{user_id}_{}_{hmac_hex}",
            expires_at.timestamp()
        ),
        expires_at,
    }
}

/// The user a reset token names. Nothing is verified; pass the user's
/// stored hash to [`validate_reset_token`] before trusting it.
pub fn reset_token_user(token: &str) -> Result<Uuid, TokenError> {
    Ok(split_token(RESET_TOKEN_PREFIX, token)?.user_id)
}

/// Validate a reset token against the user's current password hash.
pub fn validate_reset_token(
    config: &TokenConfig,
    token: &str,
    password_hash: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TokenClaims, TokenError> {
    let raw = split_token(RESET_TOKEN_PREFIX, token)?;
    let message = reset_message(raw.user_id, raw.expires_at, password_hash);
    raw.verify(config, &message, now)
}

fn reset_message(user_id: Uuid, expires_at: i64, password_hash: Option<&str>) -> String {
    format!("reset:{user_id}:{expires_at}:{}", password_hash.unwrap_or(""))
}

/// A token split into its parts, MAC not yet checked.
struct RawToken {
    user_id: Uuid,
    expires_at: i64,
    mac: Vec<u8>,
}

impl RawToken {
    fn verify(
        self,
        config: &TokenConfig,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        verify_hmac_constant_time(&config.secret, message.as_bytes(), &self.mac)?;

        if now.timestamp() >= self.expires_at {
            return Err(TokenError::Expired);
        }

        Ok(TokenClaims {
            user_id: self.user_id,
            expires_at: self.expires_at,
        })
    }
}

fn split_token(prefix: &str, token: &str) -> Result<RawToken, TokenError> {
    let rest = token
        .strip_prefix(prefix)
        .ok_or_else(|| TokenError::InvalidFormat(format!("token must start with '{prefix}'")))?;

    let (user_id_str, after_user_id) = parse_uuid_prefix(rest)?;
    let user_id =
        Uuid::parse_str(user_id_str).map_err(|e| TokenError::InvalidUserId(e.to_string()))?;

    let after_underscore = after_user_id.strip_prefix('_').ok_or_else(|| {
        TokenError::InvalidFormat("expected underscore after user_id".to_string())
    })?;

    let (expires_str, hmac_hex) = after_underscore.split_once('_').ok_or_else(|| {
        TokenError::InvalidFormat("expected underscore between expiry and hmac".to_string())
    })?;

    let expires_at: i64 = expires_str
        .parse()
        .map_err(|e: std::num::ParseIntError| TokenError::InvalidExpiry(e.to_string()))?;

    let mac = hex::decode(hmac_hex)
        .map_err(|e| TokenError::InvalidFormat(format!("invalid hex in hmac: {e}")))?;

    Ok(RawToken {
        user_id,
        expires_at,
        mac,
    })
}

/// Split a leading 36-char UUID off `s`.
fn parse_uuid_prefix(s: &str) -> Result<(&str, &str), TokenError> {
    if s.len() < 36 || !s.is_char_boundary(36) {
        return Err(TokenError::InvalidFormat(
            "token too short to contain a valid UUID".to_string(),
        ));
    }
    Ok(s.split_at(36))
}

fn compute_hmac(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

fn verify_hmac_constant_time(
    key: &[u8],
    message: &[u8],
    expected_mac: &[u8],
) -> Result<(), TokenError> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(expected_mac)
        .map_err(|_| TokenError::HmacMismatch)
}
