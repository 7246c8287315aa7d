use std::io::{Read, Write};

use crate::dtype::{ElementType, TypeClass};
use crate::error::{EngineError, Result};
use super::{read_bytes, read_string, write_string};

/// Describes a single tensor declared in an NFM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfmTensorInfo {
    /// Tensor name, unique within the file.
    pub name: String,
    /// Size of each dimension, outermost first.
    pub dims: Vec<u64>,
    pub dtype: ElementType,
    /// Byte offset of constant data from the start of the data section.
    /// Ignored for graph inputs and outputs.
    pub offset: u64,
}

impl NfmTensorInfo {
    /// Total number of elements in this tensor.
    ///
    /// # Errors
    /// `InvalidGraph` if the product of the dimensions does not fit in `usize`.
    pub fn numel(&self) -> Result<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| usize::try_from(d).ok().and_then(|d| acc.checked_mul(d)))
            .ok_or_else(|| self.size_overflow())
    }

    /// Byte size of this tensor's data.
    pub fn data_size(&self) -> Result<usize> {
        self.numel()?
            .checked_mul(self.dtype.byte_width())
            .ok_or_else(|| self.size_overflow())
    }

    fn size_overflow(&self) -> EngineError {
        EngineError::InvalidGraph(format!(
            "size of tensor '{}' with dims {:?} overflows",
            self.name, self.dims
        ))
    }

    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        write_string(writer, &self.name)?;
        writer.write_all(&(self.dims.len() as u32).to_le_bytes())?;
        for d in &self.dims {
            writer.write_all(&d.to_le_bytes())?;
        }
        writer.write_all(&self.dtype.class.to_nfm().to_le_bytes())?;
        writer.write_all(&(self.dtype.bits as u32).to_le_bytes())?;
        writer.write_all(&self.offset.to_le_bytes())?;
        Ok(())
    }
}

/// Parse `n_tensors` tensor info entries from a reader.
///
/// Each entry:
/// 1. NFM string name
/// 2. u32 number of dimensions
/// 3. n_dims x u64 dimension sizes
/// 4. u32 type-class ID (mapped via `TypeClass::from_nfm`)
/// 5. u32 bit width
/// 6. u64 byte offset within the data section
pub fn parse_tensor_infos(reader: &mut impl Read, n_tensors: u64) -> Result<Vec<NfmTensorInfo>> {
    let mut infos = Vec::with_capacity((n_tensors as usize).min(1024));
    for _ in 0..n_tensors {
        let name = read_string(reader)?;

        let n_dims = u32::from_le_bytes(read_bytes(reader)?);
        let mut dims = Vec::with_capacity((n_dims as usize).min(64));
        for _ in 0..n_dims {
            dims.push(u64::from_le_bytes(read_bytes(reader)?));
        }

        let class_id = u32::from_le_bytes(read_bytes(reader)?);
        let class = TypeClass::from_nfm(class_id).ok_or_else(|| EngineError::UnknownTypeClass {
            tensor: name.clone(),
            class: class_id,
        })?;
        let bits = u32::from_le_bytes(read_bytes(reader)?);
        let bits = u8::try_from(bits).map_err(|_| {
            EngineError::Other(format!("bit width {} of tensor '{}' is out of range", bits, name))
        })?;

        let offset = u64::from_le_bytes(read_bytes(reader)?);

        infos.push(NfmTensorInfo {
            name,
            dims,
            dtype: ElementType::new(class, bits),
            offset,
        });
    }
    Ok(infos)
}
