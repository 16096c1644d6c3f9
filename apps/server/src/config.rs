use std::str::FromStr;
use std::time::Duration;

/// Server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the control (chat) listener binds to.
    pub control_port: u16,
    /// Port the auxiliary byte-relay listener binds to.
    pub relay_port: u16,
    /// How often a named session is pinged.
    pub ping_interval: Duration,
    /// How long a PONG may take before the session is hung up.
    pub pong_timeout: Duration,
    /// How long a minted transfer context may wait for both peers.
    pub relay_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// protocol defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            control_port: env_or("PARLEY_PORT", 1337),
            relay_port: env_or("PARLEY_RELAY_PORT", 1338),
            ping_interval: Duration::from_millis(env_or("PARLEY_PING_INTERVAL_MS", 10_000)),
            pong_timeout: Duration::from_millis(env_or("PARLEY_PONG_TIMEOUT_MS", 2_000)),
            relay_ttl: Duration::from_secs(env_or("PARLEY_RELAY_TTL_SECS", 60)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            control_port: 1337,
            relay_port: 1338,
            ping_interval: Duration::from_secs(10),
            pong_timeout: Duration::from_secs(2),
            relay_ttl: Duration::from_secs(60),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
