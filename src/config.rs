//! Runtime configuration
//! Every flag doubles as an environment variable so `.env` files work unchanged.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

#[derive(Parser, Debug, Clone)]
#[command(name = "hotel-booking")]
#[command(about = "Hotel booking REST backend")]
pub struct Config {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// SQLite database file (relative paths resolve against the crate directory)
    #[arg(long, env = "DATABASE_PATH", default_value = "hotel_booking.db")]
    pub database_path: String,

    /// HMAC secret used to sign access tokens
    #[arg(long, env = "JWT_SECRET", default_value = DEV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    /// Token lifetime in milliseconds
    #[arg(long, env = "JWT_EXPIRATION_MS", default_value_t = 18_000_000)]
    pub jwt_expiration_ms: u64,

    /// Requests admitted per client per window
    #[arg(long, env = "RATE_LIMIT_CAPACITY", default_value_t = 100)]
    pub rate_limit_capacity: u32,

    /// Window over which the bucket fully refills, in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 60)]
    pub rate_limit_window_secs: u64,

    /// Comma-separated list of allowed CORS origins, or `*`
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", default_value = "*")]
    pub cors_allowed_origins: String,

    /// Create a default admin account when none exists
    #[arg(long, env = "SEED_ADMIN", default_value_t = true, action = clap::ArgAction::Set)]
    pub seed_admin: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit_capacity == 0 {
            bail!("RATE_LIMIT_CAPACITY must be greater than zero");
        }
        if self.rate_limit_window_secs == 0 {
            bail!("RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }
        if self.jwt_expiration_ms == 0 {
            bail!("JWT_EXPIRATION_MS must be greater than zero");
        }
        Ok(())
    }

    /// Literal IPv4/IPv6 hosts are used as given; names such as `localhost`
    /// resolve to their first address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let host = self.host.trim().trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }

        (host, self.port)
            .to_socket_addrs()
            .with_context(|| format!("Failed to resolve HOST {}", self.host))?
            .next()
            .with_context(|| format!("HOST {} resolved to no addresses", self.host))
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_millis(self.jwt_expiration_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// `None` means any origin is accepted.
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_allowed_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }

    pub fn resolved_database_path(&self) -> String {
        resolve_data_path(&self.database_path, Path::new(env!("CARGO_MANIFEST_DIR")))
    }
}

fn resolve_data_path(raw: &str, base: &Path) -> String {
    if raw == ":memory:" {
        return raw.to_string();
    }

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    base.join(p).to_string_lossy().to_string()
}
