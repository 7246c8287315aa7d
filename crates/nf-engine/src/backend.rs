use std::fmt::Debug;

use crate::error::{EngineError, Result};

/// Trait for pluggable compute backends.
///
/// All operations work on f32 slices. Data is passed in as slices and
/// returned as owned vectors.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Element-wise addition: result[i] = a[i] + b[i].
    fn add(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>>;

    /// Element-wise multiplication: result[i] = a[i] * b[i].
    fn mul(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>>;

    /// Scalar multiplication: result[i] = a[i] * s.
    fn scale(&self, a: &[f32], s: f32) -> Result<Vec<f32>>;
}

/// Pure-Rust CPU compute backend.
///
/// Straightforward loops, optimized for correctness rather than peak
/// performance.
#[derive(Debug, Clone, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

fn check_len(op: &str, a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(EngineError::Compute(format!(
            "{}: operand lengths differ ({} vs {})",
            op,
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn add(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
        check_len("add", a, b)?;
        Ok(a.iter().zip(b.iter()).map(|(x, y)| x + y).collect())
    }

    fn mul(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
        check_len("mul", a, b)?;
        Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).collect())
    }

    fn scale(&self, a: &[f32], s: f32) -> Result<Vec<f32>> {
        Ok(a.iter().map(|x| x * s).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_add_mul() {
        let backend = CpuBackend::new();
        assert_eq!(backend.add(&[1.0, 2.0], &[3.0, 4.0]).unwrap(), vec![4.0, 6.0]);
        assert_eq!(backend.mul(&[1.0, 2.0], &[3.0, 4.0]).unwrap(), vec![3.0, 8.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let backend = CpuBackend::new();
        assert!(backend.add(&[1.0], &[1.0, 2.0]).is_err());
        assert!(backend.mul(&[1.0, 2.0], &[]).is_err());
    }

    #[test]
    fn test_scale() {
        let backend = CpuBackend::new();
        let out = backend.scale(&[0.1, 0.2, 0.3], 3.0).unwrap();
        assert_relative_eq!(out[0], 0.3, epsilon = 1e-6);
        assert_relative_eq!(out[1], 0.6, epsilon = 1e-6);
        assert_relative_eq!(out[2], 0.9, epsilon = 1e-6);
        assert_eq!(backend.name(), "cpu");
    }
}
