use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("Config serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Line error: {0}")]
    Line(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
