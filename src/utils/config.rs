use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_DB_PATH: &str = "gallery.sqlite";
pub const DEFAULT_BLOB_DIR: &str = "blobs";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub max_connections: usize,
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            max_connections: 8,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
    pub blob_dir: PathBuf,
    /// Prefix for every URL the service hands out (QR targets, blob links).
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store: StoreConfig::default(),
            blob_dir: PathBuf::from(DEFAULT_BLOB_DIR),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn new(
        bind: &str,
        db_path: PathBuf,
        blob_dir: PathBuf,
        public_base_url: &str,
        max_connections: usize,
    ) -> Result<Self> {
        let bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address '{bind}'"))?;
        Ok(Self {
            bind_addr,
            store: StoreConfig {
                db_path,
                max_connections: max_connections.max(1),
                ..StoreConfig::default()
            },
            blob_dir,
            public_base_url: normalize_base_url(public_base_url),
            ..Self::default()
        })
    }
}

/// Strips trailing slashes so `{base}/artwork/{id}` never doubles up.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
