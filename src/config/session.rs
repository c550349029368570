use std::env;

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha512};
use time::Duration;
use tracing::warn;

use crate::auth::token::TokenSigner;

pub const AUTH_COOKIE_NAME: &str = "auth-token";

/// Flags for the `auth-token` session cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub expiry: Duration,
    pub name: String,
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let is_production = current_environment() == "production";

        SessionConfig {
            secure: is_production,
            http_only: true,
            same_site: SameSite::Lax,
            expiry: Duration::days(7),
            name: AUTH_COOKIE_NAME.to_string(),
        }
    }

    pub fn create_signer(&self) -> TokenSigner {
        TokenSigner::new(load_session_key(), self.expiry.whole_seconds())
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.name.clone(), token))
            .path("/")
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(self.expiry)
            .build()
    }

    /// Cookie that overwrites the session cookie and expires immediately.
    pub fn cleared_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), String::new()))
            .path("/")
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(Duration::ZERO)
            .build()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
            expiry: Duration::days(7),
            name: AUTH_COOKIE_NAME.to_string(),
        }
    }
}

pub fn validate_production_config() {
    if current_environment() != "production" {
        return;
    }

    if !env_flag_enabled("FORCE_HTTPS") {
        panic!("FATAL: Production environment requires HTTPS. Set FORCE_HTTPS=true");
    }

    let secret = env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in production");
    let decoded_secret = decode_secret_bytes(&secret);

    if decoded_secret.len() < 64 {
        panic!("FATAL: SESSION_SECRET must be at least 64 bytes in production");
    }

    let lowered = secret.to_ascii_lowercase();
    if lowered.contains("example") || lowered.contains("changeme") || lowered.contains("default") {
        panic!("FATAL: SESSION_SECRET appears to be a default value. Generate a secure secret!");
    }
}

pub(crate) fn current_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
}

fn env_flag_enabled(key: &str) -> bool {
    env::var(key)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}

fn load_session_key() -> Vec<u8> {
    match env::var("SESSION_SECRET") {
        Ok(secret) if !secret.is_empty() => {
            let bytes = decode_secret_bytes(&secret);
            key_from_secret_bytes(&bytes)
        }
        _ => {
            warn!("SESSION_SECRET not set; generating ephemeral key (development only)");
            let mut key = vec![0u8; 64];
            rand::thread_rng().fill_bytes(&mut key);
            key
        }
    }
}

fn decode_secret_bytes(secret: &str) -> Vec<u8> {
    STANDARD
        .decode(secret.as_bytes())
        .unwrap_or_else(|_| secret.as_bytes().to_vec())
}

fn key_from_secret_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() >= 64 {
        bytes[..64].to_vec()
    } else {
        Sha512::digest(bytes).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_secrets_are_stretched() {
        let key = key_from_secret_bytes(b"short");
        assert_eq!(key.len(), 64);
        assert_eq!(key, key_from_secret_bytes(b"short"));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let cookie = SessionConfig::default().cleared_cookie();
        assert_eq!(cookie.name(), AUTH_COOKIE_NAME);
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.http_only(), Some(true));
    }
}
