use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodingError {
    #[error("An error occurred when opening the file")]
    FileError(#[from] io::Error),

    #[error("File is empty: {0}")]
    EmptyFile(PathBuf),
}
