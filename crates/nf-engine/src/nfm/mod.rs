//! The NFM compiled-model file format.
//!
//! ```text
//! "NFM1" | version u32 | n_tensors u64 | n_kv u64
//! n_kv      x { key string, value type u32, value }
//! n_tensors x { name string, n_dims u32, dims u64..., class u32, bits u32, offset u64 }
//! padding to NFM_ALIGNMENT, then constant tensor data
//! ```
//!
//! All integers are little endian; strings are a u64 length followed by UTF-8.

pub mod header;
pub mod metadata;
pub mod reader;
pub mod tensor_info;
pub mod writer;

use std::io::{Read, Write};

use crate::error::{EngineError, Result};

pub use header::{NfmHeader, NFM_ALIGNMENT, NFM_MAGIC, NFM_VERSION};
pub use metadata::{MetadataValue, NfmMetadata};
pub use reader::NfmFile;
pub use tensor_info::NfmTensorInfo;
pub use writer::{ModelWriter, OpSpec};

/// Metadata key listing the graph's input tensor names, in order.
pub const KEY_INPUTS: &str = "graph.inputs";
/// Metadata key listing the graph's output tensor names, in order.
pub const KEY_OUTPUTS: &str = "graph.outputs";
/// Optional human-readable model name.
pub const KEY_MODEL_NAME: &str = "model.name";

/// Metadata key holding the op kind that produces output `tensor`.
pub fn op_key(tensor: &str) -> String {
    format!("op.{}", tensor)
}

/// Metadata key holding the operand names of the op producing `tensor`.
pub fn op_src_key(tensor: &str) -> String {
    format!("op.{}.src", tensor)
}

/// Metadata key holding the scale factor of the op producing `tensor`.
pub fn op_factor_key(tensor: &str) -> String {
    format!("op.{}.factor", tensor)
}

/// Round `pos` up to the next multiple of `NFM_ALIGNMENT`.
pub fn align(pos: usize) -> usize {
    (pos + NFM_ALIGNMENT - 1) & !(NFM_ALIGNMENT - 1)
}

pub(crate) fn read_bytes<const N: usize>(reader: &mut impl Read) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read an NFM string: u64 length followed by that many UTF-8 bytes.
pub(crate) fn read_string(reader: &mut impl Read) -> Result<String> {
    let len = u64::from_le_bytes(read_bytes(reader)?);
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(EngineError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "truncated string",
        )));
    }
    String::from_utf8(buf).map_err(|e| EngineError::Other(format!("invalid UTF-8 in string: {}", e)))
}

pub(crate) fn write_string(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(&(s.len() as u64).to_le_bytes())?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(0), 0);
        assert_eq!(align(1), 32);
        assert_eq!(align(32), 32);
        assert_eq!(align(33), 64);
    }

    #[test]
    fn test_truncated_string() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&10u64.to_le_bytes());
        buf.extend_from_slice(b"abc");
        assert!(read_string(&mut buf.as_slice()).is_err());
    }
}
