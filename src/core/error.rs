use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A required geometry/path service is not wired up
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Malformed threat source: {0}")]
    MalformedThreatSource(String),

    #[error("Malformed candidate: {0}")]
    MalformedCandidate(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
