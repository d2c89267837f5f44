use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use convene_notify::reminder::MAX_SWEEP_INTERVAL;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Only `JWT_SECRET` is mandatory; everything else falls back to a local
/// development default.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Parsed from the comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Upper bound on each post-shutdown wait (sweep exit, pending sends).
    pub shutdown_timeout_secs: u64,
    /// `1..=600`; a longer cadence lets events fall between sweeps.
    pub reminder_sweep_interval_secs: u64,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `HOST`                         | `0.0.0.0`               |
    /// | `PORT`                         | `3000`                  |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`                    |
    /// | `REMINDER_SWEEP_INTERVAL_SECS` | `300`                   |
    ///
    /// Panics on a value that does not parse or is out of range;
    /// configuration errors should stop the process before it binds.
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let reminder_sweep_interval_secs =
            check_sweep_interval(env_or("REMINDER_SWEEP_INTERVAL_SECS", 300))
                .unwrap_or_else(|e| panic!("REMINDER_SWEEP_INTERVAL_SECS is not valid: {e}"));

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            reminder_sweep_interval_secs,
            jwt: JwtConfig::from_env(),
        }
    }

    /// Socket address to bind the listener to.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn reminder_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_sweep_interval_secs)
    }
}

/// Reject sweep cadences the reminder window cannot tolerate.
fn check_sweep_interval(secs: u64) -> Result<u64, String> {
    let max = MAX_SWEEP_INTERVAL.as_secs();
    if secs == 0 || secs > max {
        return Err(format!("{secs}s is outside 1..={max}s"));
    }
    Ok(secs)
}

/// Parse `key` from the environment, or return `default` when it is unset.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} is not valid ({raw:?}): {e}")),
        Err(_) => default,
    }
}
