//! Environment-driven server settings with local-dev defaults.

use std::{collections::HashSet, net::SocketAddr, path::PathBuf};

use konspekt_core::Provider;

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub provider: Provider,
    pub data_dir: PathBuf,
    /// Notes a non-admin client may create, counted per IP.
    pub note_limit: usize,
    pub admin_ips: HashSet<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("KONSPEKT_BIND")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| "127.0.0.1:8000".parse().expect("static default address"));

        let provider = std::env::var("KONSPEKT_PROVIDER")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        let data_dir = std::env::var("KONSPEKT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let note_limit = std::env::var("KONSPEKT_NOTE_LIMIT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(2);

        let admin_ips = parse_admin_ips(&std::env::var("ADMIN_IPS").unwrap_or_default());

        Self {
            bind_addr,
            provider,
            data_dir,
            note_limit,
            admin_ips,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("konspekt")
}

/// Parse the comma-separated admin list, ignoring blanks and padding.
pub fn parse_admin_ips(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect()
}
