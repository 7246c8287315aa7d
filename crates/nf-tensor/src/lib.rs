//! `nf-tensor` - Generic tensor descriptors shared by the pipeline and its filters.
//!
//! This crate provides:
//! - `TensorType`, the engine-agnostic element type enum
//! - `Dimension`, a fixed-capacity, zero-padded dimension array
//! - `TensorInfo` / `TensorsInfo`, the per-tensor and per-direction schema records
//!
//! Nothing in here knows about a particular inference engine. Filters translate
//! their engine's native tensor metadata into these types.

pub mod dimension;
pub mod dtype;
pub mod error;
pub mod info;

/// Maximum number of dimensions a `Dimension` can hold.
pub const RANK_LIMIT: usize = 16;

/// Maximum number of tensors a `TensorsInfo` can hold.
pub const SIZE_LIMIT: usize = 16;

// Re-export primary types at the crate root for convenience.
pub use dimension::Dimension;
pub use dtype::TensorType;
pub use error::{Result, TensorError};
pub use info::{TensorInfo, TensorsInfo};
