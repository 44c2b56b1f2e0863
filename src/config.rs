//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
///
/// Everything is fixed at build time; [`Config::default`] is what the
/// binary runs with. Tests override individual fields.
#[derive(Debug, Clone)]
pub struct Config {
    /// SSH listen address
    pub listen_addr: SocketAddr,
    /// Path to server host key (created if missing)
    pub host_key_path: PathBuf,
    /// File the submitted value is written to
    pub output_path: PathBuf,
    /// Upper bound on graceful shutdown
    pub shutdown_timeout: Duration,
    /// Idle connections are dropped after this long
    pub inactivity_timeout: Duration,
    /// Heading shown above the text field
    pub title: String,
    /// Text field placeholder
    pub placeholder: String,
    /// Text field width in columns
    pub input_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            host_key_path: PathBuf::from(".ssh/id_ed25519"),
            output_path: PathBuf::from("output.log"),
            shutdown_timeout: Duration::from_secs(30),
            inactivity_timeout: Duration::from_secs(20 * 60),
            title: "Name?".to_string(),
            placeholder: "Jae C".to_string(),
            input_width: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.host_key_path, PathBuf::from(".ssh/id_ed25519"));
        assert_eq!(config.output_path, PathBuf::from("output.log"));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(30));
    }
}
