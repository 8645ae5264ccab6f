use std::{env, fs, path::Path};

use crate::{
    domain::{ChatId, Recipient},
    errors::Error,
    texts::Texts,
    Result,
};

/// Typed configuration, built once at startup and shared as `Arc<Config>`.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Where finished questionnaires are forwarded.
    pub admin_chat: Recipient,
    pub texts: Texts,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(env_str)
    }

    /// Build from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let admin_raw = lookup("ADMIN_CHAT_ID").and_then(non_empty).ok_or_else(|| {
            Error::Config("ADMIN_CHAT_ID environment variable is required".to_string())
        })?;
        let admin_chat = parse_recipient(&admin_raw)?;

        Ok(Self {
            telegram_bot_token: telegram_bot_token.trim().to_string(),
            admin_chat,
            texts: Texts::default(),
        })
    }
}

/// Numeric chat id (`123`, `-100...` for groups) or a public `@channel`.
pub fn parse_recipient(raw: &str) -> Result<Recipient> {
    let v = raw.trim();
    if let Ok(id) = v.parse::<i64>() {
        return Ok(Recipient::Chat(ChatId(id)));
    }
    if v.len() > 1 && v.starts_with('@') && !v.contains(char::is_whitespace) {
        return Ok(Recipient::Channel(v.to_string()));
    }
    Err(Error::Config(format!(
        "ADMIN_CHAT_ID must be a numeric chat id or @channel, got {v:?}"
    )))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for line in contents.lines() {
        let Some((key, val)) = parse_dotenv_line(line) else {
            continue;
        };
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv_line(raw: &str) -> Option<(String, String)> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (k, v) = line.split_once('=')?;
    let key = k.trim();
    if key.is_empty() {
        return None;
    }

    let mut val = v.trim().to_string();
    // Strip optional surrounding quotes.
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        val = val[1..val.len() - 1].to_string();
    }

    Some((key.to_string(), val))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
