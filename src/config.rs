use std::{env, net::SocketAddr};

use anyhow::Context;

/// Process configuration, read once at startup. `.env` is honoured by the
/// binaries through `dotenvy`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// HS256 secret shared with the identity provider that issues tokens.
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip = self
            .host
            .parse::<std::net::IpAddr>()
            .with_context(|| format!("APP_HOST {:?} is not an IP address", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str) -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            host: host.into(),
            port: 8080,
            jwt_secret: "s".into(),
        }
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let addr = config("0.0.0.0").bind_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
        assert!(config("localhost").bind_addr().is_err());
    }
}
