//! Client configuration from the environment

use crate::game::ResolverStrategy;
use crate::runtime::{RuntimeConfig, DEFAULT_SEND_TIMEOUT};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8010;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the conversation service; `None` runs disconnected
    pub backend_url: Option<String>,
    pub port: u16,
    /// `None` waits forever for a reply
    pub send_timeout: Option<Duration>,
    /// Bound on history reads; sends are bounded by `send_timeout` only
    pub http_timeout: Duration,
    pub game_resolver: ResolverStrategy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            port: DEFAULT_PORT,
            send_timeout: Some(DEFAULT_SEND_TIMEOUT),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            game_resolver: ResolverStrategy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let backend_url = lookup("GAMECHAT_BACKEND_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let port = parse_or("GAMECHAT_PORT", lookup("GAMECHAT_PORT"), defaults.port);

        // 0 disables the bound
        let send_timeout = match lookup("GAMECHAT_SEND_TIMEOUT_SECS") {
            Some(raw) => match parse::<u64>("GAMECHAT_SEND_TIMEOUT_SECS", &raw) {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.send_timeout,
            },
            None => defaults.send_timeout,
        };

        let http_timeout = parse_or(
            "GAMECHAT_HTTP_TIMEOUT_SECS",
            lookup("GAMECHAT_HTTP_TIMEOUT_SECS"),
            0,
        );
        let http_timeout = if http_timeout == 0 {
            defaults.http_timeout
        } else {
            Duration::from_secs(http_timeout)
        };

        let game_resolver = parse_or(
            "GAMECHAT_GAME_RESOLVER",
            lookup("GAMECHAT_GAME_RESOLVER"),
            defaults.game_resolver,
        );

        Self {
            backend_url,
            port,
            send_timeout,
            http_timeout,
            game_resolver,
        }
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            send_timeout: self.send_timeout,
        }
    }
}

fn parse<T>(key: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    raw.and_then(|raw| parse(key, &raw)).unwrap_or(default)
}
