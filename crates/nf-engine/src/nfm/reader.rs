use std::io::{BufReader, Seek};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{EngineError, Result};
use super::align;
use super::header::NfmHeader;
use super::metadata::NfmMetadata;
use super::tensor_info::{self, NfmTensorInfo};

/// A parsed NFM file backed by a memory-mapped region.
///
/// After parsing the header, metadata, and tensor table, the entire file is
/// memory-mapped so that constant tensor data can be accessed without
/// additional reads.
pub struct NfmFile {
    pub header: NfmHeader,
    pub metadata: NfmMetadata,
    pub tensor_infos: Vec<NfmTensorInfo>,
    mmap: Mmap,
    /// Byte offset within the file where the data section begins (aligned).
    data_offset: usize,
}

impl NfmFile {
    /// Open and parse an NFM file from disk.
    pub fn open(path: &Path) -> Result<NfmFile> {
        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::new(&file);

        let header = NfmHeader::parse(&mut reader)?;
        let metadata = NfmMetadata::parse_kv(&mut reader, header.n_kv)?;
        let tensor_infos = tensor_info::parse_tensor_infos(&mut reader, header.n_tensors)?;

        let current_pos = reader.stream_position()? as usize;
        let data_offset = align(current_pos);

        // SAFETY: the map is read-only and the file is not modified while the
        // interpreter holding it is alive.
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(NfmFile {
            header,
            metadata,
            tensor_infos,
            mmap,
            data_offset,
        })
    }

    /// Look up a tensor declaration by name.
    pub fn tensor_info(&self, name: &str) -> Result<&NfmTensorInfo> {
        self.tensor_infos
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| EngineError::TensorNotFound(name.to_string()))
    }

    /// Get the raw bytes of a constant tensor within the memory-mapped file.
    ///
    /// # Errors
    /// Returns an error if the tensor's data range lies outside the file.
    pub fn tensor_data(&self, info: &NfmTensorInfo) -> Result<&[u8]> {
        let size = info.data_size()?;
        let range = usize::try_from(info.offset)
            .ok()
            .and_then(|offset| self.data_offset.checked_add(offset))
            .and_then(|start| Some(start..start.checked_add(size)?));
        range
            .and_then(|range| self.mmap.get(range))
            .ok_or_else(|| {
                EngineError::Other(format!(
                    "data of tensor '{}' ({} bytes at offset {}) lies outside the file ({} bytes)",
                    info.name,
                    size,
                    info.offset,
                    self.mmap.len()
                ))
            })
    }
}
