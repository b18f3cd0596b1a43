//! Configuration for the console
//!
//! CLI arguments and environment variable handling using clap.

use std::time::Duration;

use base64::Engine;
use clap::Parser;

use crate::fetch::RetryPolicy;

/// banksim-console - administrative console client for the banksim backend
#[derive(Parser, Debug, Clone)]
#[command(name = "banksim-console")]
#[command(about = "Administrative console client for the banksim backend")]
pub struct Args {
    /// Host and port of the banksim backend (authority only, no scheme)
    #[arg(long, env = "BANKSIM_API_HOST", default_value = "localhost:15100")]
    pub api_host: String,

    /// Use https/wss instead of http/ws
    #[arg(long, env = "BANKSIM_SECURE", default_value = "false")]
    pub secure: bool,

    /// Basic auth username
    #[arg(long, env = "BANKSIM_USERNAME", default_value = "ghashy")]
    pub username: String,

    /// Basic auth password
    #[arg(long, env = "BANKSIM_PASSWORD", default_value = "terminalpassword")]
    pub password: String,

    /// Maximum attempts per retried request
    #[arg(long, env = "BANKSIM_MAX_RETRIES", default_value = "7")]
    pub max_retries: u32,

    /// Fixed delay between retry attempts in milliseconds
    #[arg(long, env = "BANKSIM_RETRY_DELAY_MS", default_value = "1000")]
    pub retry_delay_ms: u64,

    /// Fixed delay before a manual channel reconnect in milliseconds
    #[arg(long, env = "BANKSIM_RECONNECT_DELAY_MS", default_value = "1000")]
    pub reconnect_delay_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "BANKSIM_REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Maximum retained log lines (oldest are evicted)
    #[arg(long, env = "BANKSIM_LOG_CAPACITY", default_value = "10000")]
    pub log_capacity: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "BANKSIM_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Base URL for HTTP calls, e.g. `http://localhost:15100`
    pub fn http_base(&self) -> String {
        format!("http{}://{}", if self.secure { "s" } else { "" }, self.api_host)
    }

    /// Base URL for push channels, e.g. `ws://localhost:15100`
    pub fn ws_base(&self) -> String {
        format!("ws{}://{}", if self.secure { "s" } else { "" }, self.api_host)
    }

    /// Basic credential, encoded once.
    pub fn auth_header(&self) -> String {
        let credential = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credential)
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_host.is_empty() {
            return Err("BANKSIM_API_HOST must not be empty".to_string());
        }
        if self.api_host.contains("://") {
            return Err("BANKSIM_API_HOST is an authority, not a URL".to_string());
        }
        if self.max_retries == 0 {
            return Err("BANKSIM_MAX_RETRIES must be at least 1".to_string());
        }
        if self.log_capacity == 0 {
            return Err("BANKSIM_LOG_CAPACITY must be at least 1".to_string());
        }
        Ok(())
    }
}
