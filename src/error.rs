use std::path::PathBuf;
use thiserror::Error;

/// Failures reading from the log server or the push channel.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status `{0}`")]
    Status(u16),

    #[error("malformed body: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ViewError {
    #[error("page `{page}` is out of range, there are `{page_count}` pages")]
    PageOutOfRange {
        page: usize,
        page_count: usize,
    },
}
