//! Command-line and environment configuration.
//!
//! Flags mirror environment variables so the server runs the same way
//! from a shell, a unit file, or a container entrypoint. `Args` is the
//! raw clap surface; [`Args::resolve`] validates it into a [`Config`].

use std::net::{IpAddr, SocketAddr};

use clap::Parser;

use crate::error::ConfigError;
use crate::pairing::DEFAULT_CODE_TTL_SECS;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default interval between expired-code sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Longest accepted code lifetime, one day. Keeps the TTL well inside
/// what `chrono::Duration::seconds` can represent.
pub const MAX_CODE_TTL_SECS: u64 = 86_400;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "pairlink",
    version,
    about = "Pairing-code rendezvous and realtime room relay"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Keep all state in memory instead of PostgreSQL
    #[arg(long)]
    pub memory: bool,

    /// Seconds before an unclaimed pairing code expires
    #[arg(long, env = "CODE_TTL_SECS", default_value_t = DEFAULT_CODE_TTL_SECS)]
    pub code_ttl_secs: u64,

    /// Seconds between background sweeps of expired codes
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value_t = DEFAULT_SWEEP_INTERVAL_SECS)]
    pub sweep_interval_secs: u64,
}

/// Which persistence backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process maps, lost on restart.
    Memory,
    /// PostgreSQL at the given connection string.
    Postgres(String),
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub store: StoreBackend,
    pub code_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Args {
    /// Validate the raw arguments into a runnable [`Config`].
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        if self.code_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "code_ttl_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }

        if self.code_ttl_secs > MAX_CODE_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                key: "code_ttl_secs".to_string(),
                message: format!("must be at most {}", MAX_CODE_TTL_SECS),
            });
        }

        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sweep_interval_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }

        let store = if self.memory {
            StoreBackend::Memory
        } else {
            match &self.database_url {
                Some(url) => StoreBackend::Postgres(url.clone()),
                None => return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string())),
            }
        };

        Ok(Config {
            addr: SocketAddr::new(self.bind, self.port),
            store,
            code_ttl_secs: self.code_ttl_secs,
            sweep_interval_secs: self.sweep_interval_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            port: DEFAULT_PORT,
            bind: "0.0.0.0".parse().unwrap(),
            database_url: None,
            memory: true,
            code_ttl_secs: DEFAULT_CODE_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }

    #[test]
    fn test_resolve_memory_backend() {
        let config = base_args().resolve().unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.addr.port(), DEFAULT_PORT);
        assert_eq!(config.code_ttl_secs, DEFAULT_CODE_TTL_SECS);
    }

    #[test]
    fn test_resolve_postgres_backend() {
        let mut args = base_args();
        args.memory = false;
        args.database_url = Some("postgres://localhost/pairlink".to_string());

        let config = args.resolve().unwrap();
        assert_eq!(
            config.store,
            StoreBackend::Postgres("postgres://localhost/pairlink".to_string())
        );
    }

    #[test]
    fn test_resolve_requires_database_url_without_memory() {
        let mut args = base_args();
        args.memory = false;
        args.database_url = None;

        let err = args.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "DATABASE_URL"));
    }

    #[test]
    fn test_memory_flag_wins_over_database_url() {
        let mut args = base_args();
        args.database_url = Some("postgres://localhost/pairlink".to_string());

        let config = args.resolve().unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
    }

    #[test]
    fn test_resolve_rejects_zero_code_ttl() {
        let mut args = base_args();
        args.code_ttl_secs = 0;

        let err = args.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "code_ttl_secs"));
    }

    #[test]
    fn test_resolve_rejects_oversized_code_ttl() {
        let mut args = base_args();
        args.code_ttl_secs = u64::MAX;

        let err = args.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "code_ttl_secs"));
    }

    #[test]
    fn test_resolve_accepts_code_ttl_at_bound() {
        let mut args = base_args();
        args.code_ttl_secs = MAX_CODE_TTL_SECS;

        let config = args.resolve().unwrap();
        assert_eq!(config.code_ttl_secs, MAX_CODE_TTL_SECS);
    }

    #[test]
    fn test_resolve_rejects_zero_sweep_interval() {
        let mut args = base_args();
        args.sweep_interval_secs = 0;

        let err = args.resolve().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "sweep_interval_secs")
        );
    }

    #[test]
    fn test_parse_explicit_flags() {
        let args = Args::parse_from([
            "pairlink",
            "--memory",
            "--port",
            "8080",
            "--bind",
            "127.0.0.1",
            "--code-ttl-secs",
            "30",
        ]);

        assert!(args.memory);
        assert_eq!(args.port, 8080);
        assert_eq!(args.bind, "127.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(args.code_ttl_secs, 30);
    }

    #[test]
    fn test_resolved_addr_combines_bind_and_port() {
        let mut args = base_args();
        args.bind = "127.0.0.1".parse().unwrap();
        args.port = 9000;

        let config = args.resolve().unwrap();
        assert_eq!(config.addr, "127.0.0.1:9000".parse().unwrap());
    }
}
