use std::env;
use std::time::Duration;

use crate::gateway::HttpGatewayConfig;
use crate::lifecycle::LinkPollPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Remote program service. The local SQLite service is used when unset.
    pub gateway_url: Option<String>,
    pub gateway_token: Option<String>,
    pub gateway_timeout: Duration,
    pub link_poll_interval: Duration,
    pub link_poll_attempts: u32,
    pub default_program_id: Option<String>,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:programlog.db?mode=rwc".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 3000),
            gateway_url: non_empty("GATEWAY_URL"),
            gateway_token: non_empty("GATEWAY_TOKEN"),
            gateway_timeout: Duration::from_secs(parse_or("GATEWAY_TIMEOUT_SECS", 30)),
            link_poll_interval: Duration::from_millis(parse_or("LINK_POLL_INTERVAL_MS", 2000)),
            link_poll_attempts: parse_or("LINK_POLL_ATTEMPTS", 15),
            default_program_id: non_empty("DEFAULT_PROGRAM_ID"),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn link_poll_policy(&self) -> LinkPollPolicy {
        LinkPollPolicy {
            interval: self.link_poll_interval,
            max_attempts: self.link_poll_attempts.max(1),
        }
    }

    pub fn http_gateway(&self) -> Option<HttpGatewayConfig> {
        self.gateway_url.as_ref().map(|url| HttpGatewayConfig {
            base_url: url.clone(),
            token: self.gateway_token.clone(),
            timeout: self.gateway_timeout,
        })
    }
}
