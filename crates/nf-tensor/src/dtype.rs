use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TensorError;

/// Element types a pipeline tensor may carry.
///
/// The discriminants follow the pipeline's wire enum, so `as i32` and
/// `from_raw` can be used at the C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum TensorType {
    Int32 = 0,
    Uint32 = 1,
    Int16 = 2,
    Uint16 = 3,
    Int8 = 4,
    Uint8 = 5,
    Float64 = 6,
    Float32 = 7,
    Int64 = 8,
    Uint64 = 9,
    Float16 = 10,
}

impl TensorType {
    /// All supported types, in discriminant order.
    pub const ALL: [TensorType; 11] = [
        TensorType::Int32,
        TensorType::Uint32,
        TensorType::Int16,
        TensorType::Uint16,
        TensorType::Int8,
        TensorType::Uint8,
        TensorType::Float64,
        TensorType::Float32,
        TensorType::Int64,
        TensorType::Uint64,
        TensorType::Float16,
    ];

    /// Returns the size in bytes of a single element.
    pub fn element_size(&self) -> usize {
        match self {
            TensorType::Int8 | TensorType::Uint8 => 1,
            TensorType::Int16 | TensorType::Uint16 | TensorType::Float16 => 2,
            TensorType::Int32 | TensorType::Uint32 | TensorType::Float32 => 4,
            TensorType::Int64 | TensorType::Uint64 | TensorType::Float64 => 8,
        }
    }

    /// Converts a raw wire value to a `TensorType`.
    pub fn from_raw(raw: i32) -> Option<TensorType> {
        TensorType::ALL.iter().copied().find(|t| *t as i32 == raw)
    }

    /// Returns the lowercase name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            TensorType::Int32 => "int32",
            TensorType::Uint32 => "uint32",
            TensorType::Int16 => "int16",
            TensorType::Uint16 => "uint16",
            TensorType::Int8 => "int8",
            TensorType::Uint8 => "uint8",
            TensorType::Float64 => "float64",
            TensorType::Float32 => "float32",
            TensorType::Int64 => "int64",
            TensorType::Uint64 => "uint64",
            TensorType::Float16 => "float16",
        }
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TensorType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        TensorType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| TensorError::UnknownType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_size() {
        assert_eq!(TensorType::Int8.element_size(), 1);
        assert_eq!(TensorType::Float16.element_size(), 2);
        assert_eq!(TensorType::Uint32.element_size(), 4);
        assert_eq!(TensorType::Float64.element_size(), 8);
    }

    #[test]
    fn test_raw_values() {
        assert_eq!(TensorType::Int32 as i32, 0);
        assert_eq!(TensorType::Float32 as i32, 7);
        assert_eq!(TensorType::from_raw(10), Some(TensorType::Float16));
        assert_eq!(TensorType::from_raw(11), None);
        assert_eq!(TensorType::from_raw(-1), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("float32".parse::<TensorType>().unwrap(), TensorType::Float32);
        assert_eq!(" UINT8 ".parse::<TensorType>().unwrap(), TensorType::Uint8);
        assert!("complex64".parse::<TensorType>().is_err());
    }
}
