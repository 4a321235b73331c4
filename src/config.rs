//!
//! taskboard configuration
//! -----------------------
//! A single `Config` value built once at process start and handed by reference to
//! the token service, the credential verifier and the cookie builder. Nothing in
//! the identity layer reads the environment on its own.
//!
//! Environment variables:
//! - `TASKBOARD_PORT`            HTTP port (default 3000)
//! - `JWT_SECRET`                HS256 signing secret, at least 32 characters (required)
//! - `TASKBOARD_ENV` / `NODE_ENV` `production` switches cookies to Secure + SameSite=Strict
//! - `TASKBOARD_TOKEN_TTL_SECS`  session lifetime (default 3600, at most one day)
//! - `FRONTEND_URL`              the one origin allowed to make credentialed cross-origin
//!                               calls (default http://localhost:3000, required in production)
//! - `TASKBOARD_ADMIN_EMAIL` / `TASKBOARD_ADMIN_PASSWORD` optional bootstrap administrator

use std::env;
use std::time::Duration;

pub const MIN_SECRET_LEN: usize = 32;
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not defined")]
    MissingSecret,
    #[error("JWT_SECRET should be at least {} characters", MIN_SECRET_LEN)]
    WeakSecret,
    #[error("FRONTEND_URL is required in production")]
    MissingFrontendUrl,
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool { matches!(self, Environment::Production) }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" | "test" => Some(Environment::Development),
            _ => None,
        }
    }
}

/// Argon2 cost parameters. Real hashes and the login dummy hash share them so both
/// verification paths cost the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: Option<String>,
    pub environment: Environment,
    pub token_ttl: Duration,
    pub hash_cost: HashCost,
    pub admin: Option<AdminBootstrap>,
    pub frontend_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            jwt_secret: None,
            environment: Environment::Development,
            token_ttl: DEFAULT_TOKEN_TTL,
            hash_cost: HashCost::default(),
            admin: None,
            frontend_url: None,
        }
    }
}

fn parse_port_env(name: &'static str) -> Result<Option<u16>, ConfigError> {
    match env::var(name) {
        Ok(val) => val.trim().parse::<u16>().map(Some).map_err(|_| ConfigError::InvalidValue { name, value: val }),
        Err(_) => Ok(None),
    }
}

fn parse_secs_env(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(name) {
        Ok(val) => match val.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
            _ => Err(ConfigError::InvalidValue { name, value: val }),
        },
        Err(_) => Ok(None),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Config {
    /// Build configuration from environment variables and validate it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Config::default();
        if let Some(port) = parse_port_env("TASKBOARD_PORT")? { cfg.port = port; }
        cfg.jwt_secret = non_empty_env("JWT_SECRET");
        if let Some(raw) = non_empty_env("TASKBOARD_ENV").or_else(|| non_empty_env("NODE_ENV")) {
            cfg.environment = Environment::parse(&raw)
                .ok_or(ConfigError::InvalidValue { name: "TASKBOARD_ENV", value: raw })?;
        }
        if let Some(ttl) = parse_secs_env("TASKBOARD_TOKEN_TTL_SECS")? { cfg.token_ttl = ttl; }
        if let (Some(email), Some(password)) = (non_empty_env("TASKBOARD_ADMIN_EMAIL"), non_empty_env("TASKBOARD_ADMIN_PASSWORD")) {
            cfg.admin = Some(AdminBootstrap { email, password });
        }
        cfg.frontend_url = non_empty_env("FRONTEND_URL").map(|u| u.trim_end_matches('/').to_string());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Development configuration with the given secret; used by tests and tooling.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self { jwt_secret: Some(secret.into()), ..Default::default() }
    }

    /// Origin the CORS layer admits. Development falls back to a local frontend.
    pub fn frontend_origin(&self) -> &str { self.frontend_url.as_deref().unwrap_or(DEFAULT_FRONTEND_URL) }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.jwt_secret.as_deref() {
            None => return Err(ConfigError::MissingSecret),
            Some(s) if s.len() < MIN_SECRET_LEN => return Err(ConfigError::WeakSecret),
            Some(_) => {}
        }
        if self.token_ttl.is_zero() || self.token_ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::InvalidValue {
                name: "TASKBOARD_TOKEN_TTL_SECS",
                value: self.token_ttl.as_secs().to_string(),
            });
        }
        if self.environment.is_production() && self.frontend_url.is_none() {
            return Err(ConfigError::MissingFrontendUrl);
        }
        let origin = self.frontend_origin();
        if !(origin.starts_with("http://") || origin.starts_with("https://")) || origin.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue { name: "FRONTEND_URL", value: origin.to_string() });
        }
        Ok(())
    }
}
