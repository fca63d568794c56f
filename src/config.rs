//! Process configuration, read once at startup from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token. Read from TELEGRAM_BOT_TOKEN. Never logged.
    pub bot_token: String,
    /// Destination chat. Read from TELEGRAM_CHAT_ID. Never logged.
    pub chat_id: String,
    /// Listen address. Read from RELAY_BIND_ADDR.
    pub bind_addr: SocketAddr,
    /// Bot API origin, without a trailing slash. Read from
    /// TELEGRAM_API_BASE; tests point this at a local mock.
    pub api_base: String,
    /// Bounded wait for the outbound call. Read from
    /// RELAY_UPSTREAM_TIMEOUT_SECS.
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an injected variable lookup so tests can supply a fake
    /// environment without touching the real one.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        let chat_id = lookup("TELEGRAM_CHAT_ID").unwrap_or_default();

        let bind_addr =
            lookup("RELAY_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .with_context(|| format!("invalid RELAY_BIND_ADDR: {bind_addr}"))?;

        let api_base =
            lookup("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_base = api_base.trim_end_matches('/').to_string();

        let upstream_timeout = match lookup("RELAY_UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .with_context(|| format!("invalid RELAY_UPSTREAM_TIMEOUT_SECS: {raw}"))?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        Ok(Self {
            bot_token,
            chat_id,
            bind_addr,
            api_base,
            upstream_timeout,
        })
    }

    /// Both secrets present. Checked per request: their absence maps to the
    /// ServerMisconfigured fault, not to a refusal to boot.
    pub fn has_credentials(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn test_defaults_apply_when_env_is_empty() {
        let config = Config::from_lookup(env(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_credentials_require_both_values() {
        let only_token = Config::from_lookup(env(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert!(!only_token.has_credentials());

        let only_chat = Config::from_lookup(env(&[("TELEGRAM_CHAT_ID", "42")])).unwrap();
        assert!(!only_chat.has_credentials());

        let both = Config::from_lookup(env(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "42"),
        ]))
        .unwrap();
        assert!(both.has_credentials());
    }

    #[test]
    fn test_api_base_trailing_slash_is_stripped() {
        let config = Config::from_lookup(env(&[(
            "TELEGRAM_API_BASE",
            "http://127.0.0.1:9000/",
        )]))
        .unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_bind_addr_is_an_error() {
        let err = Config::from_lookup(env(&[("RELAY_BIND_ADDR", "not-an-addr")])).unwrap_err();
        assert!(err.to_string().contains("RELAY_BIND_ADDR"));
    }

    #[test]
    fn test_invalid_timeout_is_an_error() {
        let err =
            Config::from_lookup(env(&[("RELAY_UPSTREAM_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(err.to_string().contains("RELAY_UPSTREAM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_timeout_override() {
        let config =
            Config::from_lookup(env(&[("RELAY_UPSTREAM_TIMEOUT_SECS", "5")])).unwrap();
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
    }
}
