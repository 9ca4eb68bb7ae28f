use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use natours_core::DbOpenConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub environment: Environment,
    pub db_open: DbOpenConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("NATOURS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("NATOURS_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(3000);
        let db_path = env::var("NATOURS_DB").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("natours.db"));
        let environment = env::var("NATOURS_ENV").map(|s| Environment::parse(&s)).unwrap_or(Environment::Development);

        Self {
            host,
            port,
            db_path,
            environment,
            db_open: DbOpenConfig::from_env(),
        }
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_defaults_to_development() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse(" PROD "), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }

    #[test]
    fn addr_parses_host_and_port() {
        let cfg = Config {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("natours.db"),
            environment: Environment::Development,
            db_open: DbOpenConfig::default(),
        };
        assert_eq!(cfg.addr().unwrap().port(), 8080);
        let bad = Config { host: "not a host".into(), ..cfg };
        assert!(bad.addr().is_err());
    }
}
