use thiserror::Error;

use crate::params::DecodeError;
use crate::remote::FetchError;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("invalid query string: {0}")]
    Decode(#[from] DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to load page: {0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
