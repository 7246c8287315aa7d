use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::dtype::TensorType;
use crate::error::{Result, TensorError};
use crate::SIZE_LIMIT;

/// Schema of a single tensor: name, element type and dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorInfo {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TensorType,
    pub dims: Dimension,
}

impl TensorInfo {
    pub fn new(name: impl Into<String>, ty: TensorType, dims: Dimension) -> Self {
        TensorInfo {
            name: name.into(),
            ty,
            dims,
        }
    }

    /// Byte size of one frame of this tensor.
    pub fn byte_size(&self) -> usize {
        self.dims.numel() * self.ty.element_size()
    }
}

/// An ordered list of tensor schemas with a fixed capacity of `SIZE_LIMIT`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<TensorInfo>", into = "Vec<TensorInfo>")]
pub struct TensorsInfo {
    infos: Vec<TensorInfo>,
}

impl TensorsInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tensor schema.
    ///
    /// # Errors
    /// Returns `TooManyTensors` once the list already holds `SIZE_LIMIT` entries.
    pub fn push(&mut self, info: TensorInfo) -> Result<()> {
        if self.infos.len() >= SIZE_LIMIT {
            return Err(TensorError::TooManyTensors {
                count: self.infos.len() + 1,
                limit: SIZE_LIMIT,
            });
        }
        self.infos.push(info);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TensorInfo> {
        self.infos.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TensorInfo> {
        self.infos.iter()
    }
}

impl TryFrom<Vec<TensorInfo>> for TensorsInfo {
    type Error = TensorError;

    fn try_from(infos: Vec<TensorInfo>) -> Result<Self> {
        if infos.len() > SIZE_LIMIT {
            return Err(TensorError::TooManyTensors {
                count: infos.len(),
                limit: SIZE_LIMIT,
            });
        }
        Ok(TensorsInfo { infos })
    }
}

impl From<TensorsInfo> for Vec<TensorInfo> {
    fn from(info: TensorsInfo) -> Self {
        info.infos
    }
}

impl<'a> IntoIterator for &'a TensorsInfo {
    type Item = &'a TensorInfo;
    type IntoIter = std::slice::Iter<'a, TensorInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.infos.iter()
    }
}
