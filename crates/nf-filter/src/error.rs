use std::fmt;
use std::path::PathBuf;

use nf_engine::{EngineError, TypeClass};
use thiserror::Error;

/// Which side of the filter a tensor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("no model file given")]
    NoModel,
    #[error("model file '{0}' does not exist")]
    ModelNotFound(PathBuf),
    #[error("failed to load model '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    #[error("{direction} tensor count mismatch: declared {declared}, model has {engine}")]
    SchemaMismatch {
        direction: Direction,
        declared: usize,
        engine: usize,
    },
    #[error("tensor '{tensor}' has unsupported type: {bits}-bit {class}")]
    UnsupportedType {
        tensor: String,
        class: TypeClass,
        bits: u8,
    },
    #[error("tensor '{tensor}' has rank {rank}, exceeding the limit of {limit}")]
    RankLimitExceeded {
        tensor: String,
        rank: usize,
        limit: usize,
    },
    #[error("dimension {value} of tensor '{tensor}' does not fit in 32 bits")]
    DimensionOverflow { tensor: String, value: u64 },
    #[error("model has {count} {direction} tensors, exceeding the limit of {limit}")]
    TooManyTensors {
        direction: Direction,
        count: usize,
        limit: usize,
    },
    #[error("expected {expected} {direction} buffers, got {got}")]
    BufferCount {
        direction: Direction,
        expected: usize,
        got: usize,
    },
    #[error("{direction} tensor '{tensor}': buffer holds {declared} bytes, model expects {engine}")]
    SizeMismatch {
        direction: Direction,
        tensor: String,
        declared: usize,
        engine: usize,
    },
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
    #[error("not supported: {0}")]
    NotSupported(&'static str),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl FilterError {
    /// True for contract violations by the caller, as opposed to problems with
    /// the model or the data. These must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FilterError::IllegalState(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("framework '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("framework '{0}' is not registered")]
    NotRegistered(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;
