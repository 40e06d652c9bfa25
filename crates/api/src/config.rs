use splatforge_core::entitlement::QuotaPolicy;

use crate::auth::identity::IdentityConfig;
use crate::auth::jwt::JwtConfig;
use crate::billing::BillingConfig;

/// Server configuration loaded from environment variables.
///
/// Storage and inference settings live with their own crates
/// (`StorageConfig`, `InferenceConfig`) and are loaded separately in `main`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `360`). Must exceed the
    /// inference timeout.
    pub request_timeout_secs: u64,
    /// Access-token settings.
    pub jwt: JwtConfig,
    /// Identity-provider token verification.
    pub identity: IdentityConfig,
    /// Free-tier ceiling.
    pub quota: QuotaPolicy,
    /// `None` when billing is disabled.
    pub billing: Option<BillingConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `360`                      |
    /// | `FREE_SCENE_LIMIT`     | `3` (or `unlimited`)       |
    ///
    /// # Panics
    ///
    /// Panics on malformed values or missing secrets.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = lookup("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "360".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let quota = match lookup("FREE_SCENE_LIMIT") {
            Some(raw) => QuotaPolicy::parse(&raw)
                .unwrap_or_else(|e| panic!("FREE_SCENE_LIMIT is invalid: {e}")),
            None => QuotaPolicy::default(),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_lookup(&lookup),
            identity: IdentityConfig::from_lookup(&lookup),
            quota,
            billing: BillingConfig::from_lookup(&lookup),
        }
    }
}
