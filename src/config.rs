//! Environment-driven application configuration

use crate::runtime::DEFAULT_GREETING;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind: IpAddr,
    pub port: u16,
    /// Initial conversation message; `{lawyer}` and `{title}` are substituted
    pub greeting: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("LEGAL_MATCH_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.legal-match/legal-match.db"))
            },
            PathBuf::from,
        );

        let port = lookup("LEGAL_MATCH_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let bind = lookup("LEGAL_MATCH_BIND")
            .and_then(|b| b.parse().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        let greeting = lookup("LEGAL_MATCH_GREETING")
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GREETING.to_string());

        Self {
            db_path,
            bind,
            port,
            greeting,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
