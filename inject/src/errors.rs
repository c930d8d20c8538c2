use std::collections::TryReserveError;

use common::UuidError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FuseError {
    #[error("failed to serialize the metadata record")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to allocate {requested} bytes for the output buffer")]
    Allocation {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("invalid stream UUID")]
    Uuid(#[from] UuidError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown injection mode `{0}`, expected `always` or `idr`")]
    UnknownMode(String),
}
