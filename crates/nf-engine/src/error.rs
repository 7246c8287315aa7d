use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid NFM magic: expected 'NFM1', got {0:?}")]
    InvalidMagic([u8; 4]),
    #[error("unsupported NFM version: {0}")]
    UnsupportedVersion(u32),
    #[error("missing metadata key: {0}")]
    MissingKey(String),
    #[error("type mismatch for key '{key}': expected {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: String,
        got: String,
    },
    #[error("unsupported metadata value type ID: {0}")]
    UnsupportedValueType(u32),
    #[error("unknown type class {class} for tensor '{tensor}'")]
    UnknownTypeClass { tensor: String, class: u32 },
    #[error("tensor not found: {0}")]
    TensorNotFound(String),
    #[error("unknown op '{op}' producing tensor '{tensor}'")]
    UnknownOp { tensor: String, op: String },
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
    #[error("compute error: {0}")]
    Compute(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
