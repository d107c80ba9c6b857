use std::env;

/// Runtime configuration, read entirely from the environment — no CLI
/// flags, no config file (Non-goal: CLI argument parsing).
#[derive(Debug, Clone)]
pub struct Config {
    /// §4.1: "default loopback, port `5000`".
    pub bind_addr: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            bind_addr: env::var("BROKER_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_owned()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1:5000".to_owned(),
            log_level: "info".to_owned(),
        }
    }
}
