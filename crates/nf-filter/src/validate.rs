//! Structural checks between the pipeline's view of a model and the engine's.

use nf_engine::TensorMap;

use crate::error::{Direction, FilterError, Result};

/// Declared and discovered tensor counts must agree.
pub fn check_counts(direction: Direction, declared: usize, engine: usize) -> Result<()> {
    if declared != engine {
        return Err(FilterError::SchemaMismatch {
            direction,
            declared,
            engine,
        });
    }
    Ok(())
}

/// Every caller buffer must be exactly as large as the engine tensor bound to it.
///
/// Buffers are matched to tensors by position.
pub fn check_buffers<B: AsRef<[u8]>>(
    direction: Direction,
    tensors: TensorMap<'_>,
    buffers: &[B],
) -> Result<()> {
    if buffers.len() != tensors.len() {
        return Err(FilterError::BufferCount {
            direction,
            expected: tensors.len(),
            got: buffers.len(),
        });
    }
    for (tensor, buffer) in tensors.iter().zip(buffers) {
        let declared = buffer.as_ref().len();
        if declared != tensor.size() {
            return Err(FilterError::SizeMismatch {
                direction,
                tensor: tensor.name().to_string(),
                declared,
                engine: tensor.size(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_counts() {
        assert!(check_counts(Direction::Input, 2, 2).is_ok());
        match check_counts(Direction::Output, 1, 3) {
            Err(FilterError::SchemaMismatch {
                direction,
                declared,
                engine,
            }) => {
                assert_eq!(direction, Direction::Output);
                assert_eq!(declared, 1);
                assert_eq!(engine, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_mismatch_message() {
        let err = check_counts(Direction::Input, 0, 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "input tensor count mismatch: declared 0, model has 1"
        );
    }
}
