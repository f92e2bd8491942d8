use thiserror::Error;

/// Genuine defects the engine surfaces as `Result::Err`. Consensus outcomes
/// (buffered, dropped, quorum pending) are not errors and never flow
/// through this type — see `session::driver::RouteOutcome`.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),
}
