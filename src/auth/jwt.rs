use crate::auth::claims::TokenClaims;
use crate::config::AuthConfig;
use anyhow::Result;
use chrono::Duration;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expires_in: Duration,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let secret = config.jwt_secret.as_bytes();
        let expires_in = parse_duration(&config.jwt_expires_in)?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            expires_in,
        })
    }

    /// Lifetime of issued tokens, also used as the cookie max-age.
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    pub fn encode_token(&self, claims: &TokenClaims) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode JWT: {}", e))
    }

    pub fn decode_token(&self, token: &str) -> Result<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| anyhow::anyhow!("Failed to decode JWT: {}", e))
    }

    pub fn create_token_for_user(&self, user_id: i64, role: String) -> Result<String> {
        let claims = TokenClaims::new(user_id, role, self.expires_in);
        self.encode_token(&claims)
    }
}

/// Parse lifetimes like `24h`, `1d`, `60m`, `30s`; a bare number means hours.
fn parse_duration(duration_str: &str) -> Result<Duration> {
    let raw = duration_str.trim();
    let (amount, unit): (&str, fn(i64) -> Duration) = match raw.char_indices().last() {
        Some((idx, 'h')) => (&raw[..idx], Duration::hours),
        Some((idx, 'd')) => (&raw[..idx], Duration::days),
        Some((idx, 'm')) => (&raw[..idx], Duration::minutes),
        Some((idx, 's')) => (&raw[..idx], Duration::seconds),
        _ => (raw, Duration::hours),
    };

    let amount: i64 = amount
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid token lifetime {:?}: {}", duration_str, e))?;
    Ok(unit(amount))
}
