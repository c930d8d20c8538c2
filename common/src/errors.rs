use thiserror::Error;

#[derive(Error, Debug)]
pub enum UuidError {
    #[error("a stream UUID is 16 bytes long, got {0}")]
    InvalidLength(usize),

    #[error("invalid UUID text")]
    Parse(#[from] uuid::Error),
}
