pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build the 'Environment' from the provided string.")]
    StringToEnvironmentFail,
    #[error("failed to parse 'DbConfig' from the provided string.")]
    StringToDbConfigFail,
    #[error("invalid sender email: {0}")]
    InvalidSenderEmail(String),
    #[error("invalid bcc email: {0}")]
    InvalidBccEmail(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml deserialization error: {0}")]
    TomlDeser(#[from] toml::de::Error),
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
