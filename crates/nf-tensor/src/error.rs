use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
    #[error("rank {rank} exceeds the limit of {limit} dimensions")]
    RankLimitExceeded { rank: usize, limit: usize },
    #[error("{count} tensors exceed the limit of {limit}")]
    TooManyTensors { count: usize, limit: usize },
    #[error("invalid dimension string '{0}'")]
    InvalidDimension(String),
    #[error("unknown tensor type: {0}")]
    UnknownType(String),
}

pub type Result<T> = std::result::Result<T, TensorError>;
