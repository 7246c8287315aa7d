use std::io::{Read, Write};

use crate::error::{EngineError, Result};

/// The four-byte magic number identifying an NFM file: ASCII "NFM1".
pub const NFM_MAGIC: [u8; 4] = [0x4E, 0x46, 0x4D, 0x31];

/// The only NFM format version this engine reads and writes.
pub const NFM_VERSION: u32 = 1;

/// Alignment (in bytes) of the constant data section.
pub const NFM_ALIGNMENT: usize = 32;

/// Parsed NFM file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfmHeader {
    pub version: u32,
    /// Number of entries in the tensor table.
    pub n_tensors: u64,
    /// Number of key-value metadata entries.
    pub n_kv: u64,
}

impl NfmHeader {
    /// Parse an NFM header from the beginning of a reader.
    ///
    /// Reads and validates the 4-byte magic, then reads the version (u32 LE),
    /// tensor count (u64 LE), and KV count (u64 LE).
    pub fn parse(reader: &mut impl Read) -> Result<NfmHeader> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != NFM_MAGIC {
            return Err(EngineError::InvalidMagic(magic));
        }

        let mut buf4 = [0u8; 4];
        reader.read_exact(&mut buf4)?;
        let version = u32::from_le_bytes(buf4);
        if version != NFM_VERSION {
            return Err(EngineError::UnsupportedVersion(version));
        }

        let mut buf8 = [0u8; 8];
        reader.read_exact(&mut buf8)?;
        let n_tensors = u64::from_le_bytes(buf8);

        reader.read_exact(&mut buf8)?;
        let n_kv = u64::from_le_bytes(buf8);

        Ok(NfmHeader {
            version,
            n_tensors,
            n_kv,
        })
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&NFM_MAGIC)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.n_tensors.to_le_bytes())?;
        writer.write_all(&self.n_kv.to_le_bytes())?;
        Ok(())
    }
}
