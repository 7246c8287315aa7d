//! `nf-filter` - Tensor-filter adapter for the `nf-engine` inference engine.
//!
//! A pipeline drives filters through the [`FilterFramework`] trait without
//! knowing engine types. [`NfmFilter`] is the implementation for NFM models:
//! it loads the model, translates the engine's tensor metadata into
//! [`nf_tensor::TensorsInfo`], checks it against the declared schema, and
//! copies buffers in and out around each synchronous forward pass.

pub mod error;
pub mod filter;
pub mod framework;
pub mod loader;
pub mod properties;
pub mod registry;
pub mod translate;
pub mod validate;

pub use error::{Direction, FilterError, RegistryError, Result};
pub use filter::{NfmFilter, FRAMEWORK_INFO, FRAMEWORK_NAME};
pub use framework::{Accelerator, FilterFramework, FilterState, FrameworkInfo, OpenOutcome};
pub use properties::FilterProperties;
pub use registry::FilterRegistry;
