use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order rejected: {reason}")]
    OrderRejected { reason: String },

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("No provider supports strategy '{0}'")]
    UnknownStrategy(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
