//! Translation of engine tensor metadata into pipeline tensor descriptors.
//!
//! Dimensions are copied positionally: the engine's first (outermost)
//! dimension lands in slot 0. No reordering between the engine's and the
//! pipeline's layout conventions is attempted, and dimension values are not
//! compared against the declared schema.

use nf_engine::{ElementType, HostTensor, TensorMap, TypeClass};
use nf_tensor::{Dimension, TensorInfo, TensorType, TensorsInfo, RANK_LIMIT, SIZE_LIMIT};

use crate::error::{Direction, FilterError, Result};

/// Supported (type class, bit width) pairs.
const TYPE_TABLE: [(TypeClass, u8, TensorType); 11] = [
    (TypeClass::Int, 8, TensorType::Int8),
    (TypeClass::Int, 16, TensorType::Int16),
    (TypeClass::Int, 32, TensorType::Int32),
    (TypeClass::Int, 64, TensorType::Int64),
    (TypeClass::UInt, 8, TensorType::Uint8),
    (TypeClass::UInt, 16, TensorType::Uint16),
    (TypeClass::UInt, 32, TensorType::Uint32),
    (TypeClass::UInt, 64, TensorType::Uint64),
    (TypeClass::Float, 16, TensorType::Float16),
    (TypeClass::Float, 32, TensorType::Float32),
    (TypeClass::Float, 64, TensorType::Float64),
];

/// Map an engine element type to a pipeline tensor type.
pub fn tensor_type(tensor: &str, dtype: ElementType) -> Result<TensorType> {
    TYPE_TABLE
        .iter()
        .find(|(class, bits, _)| *class == dtype.class && *bits == dtype.bits)
        .map(|(_, _, ty)| *ty)
        .ok_or_else(|| FilterError::UnsupportedType {
            tensor: tensor.to_string(),
            class: dtype.class,
            bits: dtype.bits,
        })
}

/// Copy an engine shape into a zero-padded pipeline dimension array.
pub fn dimension(tensor: &str, shape: &[u64]) -> Result<Dimension> {
    if shape.len() > RANK_LIMIT {
        return Err(FilterError::RankLimitExceeded {
            tensor: tensor.to_string(),
            rank: shape.len(),
            limit: RANK_LIMIT,
        });
    }
    let mut dims = [0u32; RANK_LIMIT];
    for (slot, &value) in dims.iter_mut().zip(shape) {
        *slot = u32::try_from(value).map_err(|_| FilterError::DimensionOverflow {
            tensor: tensor.to_string(),
            value,
        })?;
    }
    Ok(Dimension::new(dims))
}

/// Describe a single engine tensor.
pub fn tensor_info(tensor: &HostTensor) -> Result<TensorInfo> {
    let ty = tensor_type(tensor.name(), tensor.element_type())?;
    let dims = dimension(tensor.name(), tensor.shape())?;
    Ok(TensorInfo::new(tensor.name(), ty, dims))
}

/// Describe every tensor in `map`, preserving its order.
pub fn tensors_info(direction: Direction, map: TensorMap<'_>) -> Result<TensorsInfo> {
    if map.len() > SIZE_LIMIT {
        return Err(FilterError::TooManyTensors {
            direction,
            count: map.len(),
            limit: SIZE_LIMIT,
        });
    }
    let infos = map.iter().map(tensor_info).collect::<Result<Vec<_>>>()?;
    TensorsInfo::try_from(infos).map_err(|_| FilterError::TooManyTensors {
        direction,
        count: map.len(),
        limit: SIZE_LIMIT,
    })
}
