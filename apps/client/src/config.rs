use std::path::PathBuf;
use std::str::FromStr;

/// Client configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host the server runs on.
    pub server_host: String,
    /// Control (chat) port.
    pub control_port: u16,
    /// Auxiliary byte-relay port.
    pub relay_port: u16,
    /// Where downloaded files are saved.
    pub download_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_host: std::env::var("PARLEY_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            control_port: env_or("PARLEY_PORT", 1337),
            relay_port: env_or("PARLEY_RELAY_PORT", 1338),
            download_dir: std::env::var("PARLEY_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("downloads")),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
