/// Command that starts the questionnaire.
pub const START: &str = "start";

/// Name of the command in `text`, if it is one.
///
/// Telegram may send `/cmd@botname arg1 ...`; the bot suffix and any payload
/// are dropped. The text must begin with `/` and the name is returned as
/// written, so `/Start` is not `/start`.
pub fn command_name(text: &str) -> Option<&str> {
    if !text.starts_with('/') {
        return None;
    }

    let token = text.split_whitespace().next()?.strip_prefix('/')?;
    let name = token.split('@').next().unwrap_or("");
    if name.is_empty() {
        return None;
    }

    Some(name)
}

/// True when `text` is the start command (with or without bot suffix or payload).
pub fn is_start(text: &str) -> bool {
    command_name(text) == Some(START)
}
