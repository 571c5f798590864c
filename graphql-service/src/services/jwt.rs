use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{rank_of, RoleType};

/// Process-wide HS256 signer and verifier, built once at startup.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime_hours: i64,
}

/// Claims carried by session tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric user id
    pub user_id: i64,
    /// Highest-privilege role held at issuance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Every role held at issuance
    #[serde(default)]
    pub roles: Vec<String>,
    /// Token id
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// The role the evaluator ranks: `role` when present, else the best of `roles`.
    pub fn effective_role(&self) -> Option<&str> {
        self.role.as_deref().or_else(|| {
            self.roles
                .iter()
                .map(String::as_str)
                .max_by_key(|r| rank_of(Some(*r)))
        })
    }

    pub fn has_role(&self, role: RoleType) -> bool {
        self.role.as_deref() == Some(role.as_str()) || self.roles.iter().any(|r| r == role.as_str())
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// A freshly signed token and its decoded claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        tracing::info!("JWT service initialized with HS256");

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_lifetime_hours: config.token_lifetime_hours,
        }
    }

    /// Sign a session token for `user_id` holding `roles`.
    pub fn issue(&self, user_id: i64, roles: &[RoleType]) -> Result<IssuedToken, anyhow::Error> {
        let now = Utc::now();
        let exp = Duration::try_hours(self.token_lifetime_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Token lifetime of {} hours is out of range",
                    self.token_lifetime_hours
                )
            })?;

        let claims = Claims {
            user_id,
            role: RoleType::highest(roles).map(|r| r.as_str().to_string()),
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }
}
