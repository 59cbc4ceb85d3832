use shared::{DEFAULT_HOST, DEFAULT_KEY, DEFAULT_PORT};
use std::path::PathBuf;

/// Runtime settings for one server instance
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared codec key; clients must use the same one
    pub key: String,
    pub quotes_path: PathBuf,
    pub chat_log_path: PathBuf,
    /// Connection ceiling, 0 for unlimited
    pub max_clients: usize,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            key: DEFAULT_KEY.to_string(),
            quotes_path: PathBuf::from("quotes.json"),
            chat_log_path: PathBuf::from("chat_log.txt"),
            max_clients: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:5050");
        assert_eq!(config.key, "my_simple_key");
        assert_eq!(config.max_clients, 0);
    }

    #[test]
    fn test_bind_address_ipv6() {
        let config = ServerConfig {
            host: "[::1]".to_string(),
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.bind_address().parse::<std::net::SocketAddr>().is_ok());
    }
}
