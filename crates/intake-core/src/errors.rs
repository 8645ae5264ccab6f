/// Core error type.
///
/// Adapter crates map their transport errors into `External` so the
/// conversation handler can contain failures the same way regardless of
/// which messenger produced them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("message has no text")]
    MissingText,

    #[error("message has no sender")]
    MissingSender,

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
