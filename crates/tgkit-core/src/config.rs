use std::{collections::HashMap, env, fs, net::SocketAddr, path::Path, time::Duration};

use crate::{errors::Error, keyboard::DEFAULT_MAX_COLUMNS, Result};

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Bot API
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
    pub telegram_bot_username: Option<String>,
    pub http_timeout: Duration,

    // Keyboards
    pub keyboard_max_columns: usize,

    // Dispatch
    pub max_concurrent_handlers: usize,

    // Webhook ingress (enabled when a listen address is set)
    pub webhook_listen_addr: Option<SocketAddr>,
    pub webhook_path: String,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,

    // Long polling ingress
    pub poll_timeout: Duration,
}

impl Config {
    /// Process environment first, then `.env`. The process environment is never modified.
    pub fn load() -> Result<Self> {
        let dotenv = read_dotenv(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Build from any key lookup. `load()` uses the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let telegram_api_url = get("TELEGRAM_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://api.telegram.org".to_string())
            .trim_end_matches('/')
            .to_string();
        let telegram_bot_username = get("TELEGRAM_BOT_USERNAME")
            .and_then(non_empty)
            .map(|u| u.trim().trim_start_matches('@').to_string());
        let http_timeout = Duration::from_secs(parse_u64(&get, "HTTP_TIMEOUT_SECS")?.unwrap_or(60));

        let keyboard_max_columns =
            parse_usize(&get, "KEYBOARD_MAX_COLUMNS")?.unwrap_or(DEFAULT_MAX_COLUMNS);
        if keyboard_max_columns < 1 {
            return Err(Error::Config(
                "KEYBOARD_MAX_COLUMNS must be at least 1".to_string(),
            ));
        }

        let max_concurrent_handlers = parse_usize(&get, "MAX_CONCURRENT_HANDLERS")?.unwrap_or(0);

        let webhook_listen_addr = match get("WEBHOOK_LISTEN_ADDR").and_then(non_empty) {
            Some(s) => Some(s.trim().parse::<SocketAddr>().map_err(|e| {
                Error::Config(format!("WEBHOOK_LISTEN_ADDR is not a socket address: {e}"))
            })?),
            None => None,
        };
        let mut webhook_path = get("WEBHOOK_PATH")
            .and_then(non_empty)
            .unwrap_or_else(|| "/webhook".to_string());
        if !webhook_path.starts_with('/') {
            webhook_path.insert(0, '/');
        }
        let webhook_url = get("WEBHOOK_URL").and_then(non_empty);
        let webhook_secret = get("WEBHOOK_SECRET").and_then(non_empty);

        let poll_timeout = Duration::from_secs(parse_u64(&get, "POLL_TIMEOUT_SECS")?.unwrap_or(30));

        Ok(Self {
            telegram_bot_token,
            telegram_api_url,
            telegram_bot_username,
            http_timeout,
            keyboard_max_columns,
            max_concurrent_handlers,
            webhook_listen_addr,
            webhook_path,
            webhook_url,
            webhook_secret,
            poll_timeout,
        })
    }

    pub fn webhook_enabled(&self) -> bool {
        self.webhook_listen_addr.is_some()
    }
}

/// Parse `KEY=value` lines from a `.env` file. Missing or unreadable files yield nothing.
fn read_dotenv(path: &Path) -> HashMap<String, String> {
    fs::read_to_string(path)
        .map(|contents| parse_dotenv(&contents))
        .unwrap_or_default()
}

fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .filter_map(|(k, v)| {
            let key = k.trim();
            (!key.is_empty()).then(|| (key.to_string(), unquote(v.trim()).to_string()))
        })
        .collect()
}

fn unquote(val: &str) -> &str {
    let quoted = val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')));
    if quoted {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match get(key).and_then(non_empty) {
        Some(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{key} must be a non-negative integer: {e}"))),
        None => Ok(None),
    }
}

fn parse_usize(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<usize>> {
    match get(key).and_then(non_empty) {
        Some(s) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{key} must be a non-negative integer: {e}"))),
        None => Ok(None),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(cfg(&[]), Err(Error::Config(_))));
        assert!(matches!(
            cfg(&[("TELEGRAM_BOT_TOKEN", "  ")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn defaults() {
        let c = cfg(&[("TELEGRAM_BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(c.telegram_api_url, "https://api.telegram.org");
        assert_eq!(c.keyboard_max_columns, 3);
        assert_eq!(c.max_concurrent_handlers, 0);
        assert_eq!(c.webhook_path, "/webhook");
        assert!(!c.webhook_enabled());
        assert_eq!(c.poll_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_normalized() {
        let c = cfg(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_API_URL", "http://localhost:8081/"),
            ("TELEGRAM_BOT_USERNAME", "@MyBot"),
            ("KEYBOARD_MAX_COLUMNS", "2"),
            ("WEBHOOK_LISTEN_ADDR", "127.0.0.1:8443"),
            ("WEBHOOK_PATH", "hooks/tg"),
        ])
        .unwrap();
        assert_eq!(c.telegram_api_url, "http://localhost:8081");
        assert_eq!(c.telegram_bot_username.as_deref(), Some("MyBot"));
        assert_eq!(c.keyboard_max_columns, 2);
        assert!(c.webhook_enabled());
        assert_eq!(c.webhook_path, "/hooks/tg");
    }

    #[test]
    fn zero_columns_is_a_config_error() {
        let err = cfg(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("KEYBOARD_MAX_COLUMNS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = cfg(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("KEYBOARD_MAX_COLUMNS", "-1"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn dotenv_lines_are_parsed() {
        let vars = parse_dotenv(
            "# comment\n\nTELEGRAM_BOT_TOKEN = \"123:abc\"\nWEBHOOK_PATH='/tg'\n=orphan\nnot a pair\n",
        );
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["TELEGRAM_BOT_TOKEN"], "123:abc");
        assert_eq!(vars["WEBHOOK_PATH"], "/tg");
    }

    #[test]
    fn missing_dotenv_is_empty() {
        assert!(read_dotenv(Path::new("/nonexistent/tgkit/.env")).is_empty());
    }
}
