use nf_tensor::TensorsInfo;

use crate::error::{FilterError, Result};
use crate::properties::FilterProperties;

/// Execution targets a framework can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accelerator {
    Cpu,
}

/// Static description of a filter framework, fixed at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkInfo {
    pub name: &'static str,
    /// Output may be written into the input buffer.
    pub allow_in_place: bool,
    /// The framework allocates output buffers itself during `invoke`.
    pub allocate_in_invoke: bool,
    /// The framework can run without a model file.
    pub run_without_model: bool,
    /// The host should check that model files exist before `configure`.
    pub verify_model_path: bool,
    pub hw_list: &'static [Accelerator],
    pub accl_auto: Accelerator,
    pub accl_default: Accelerator,
    /// Whether invoke latency/throughput statistics are reported.
    pub statistics: bool,
}

/// Lifecycle state of a filter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Empty,
    Configured,
}

/// Result of a successful `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A model was loaded.
    Opened,
    /// The requested model was already loaded; nothing changed.
    AlreadyOpen,
}

/// The interface every engine adapter implements for the pipeline.
///
/// The pipeline picks an implementation by name through the
/// [`FilterRegistry`](crate::registry::FilterRegistry) and then drives it
/// through `configure`, any number of `invoke`s and `release`. Calls on one
/// instance must be sequential.
pub trait FilterFramework: Send {
    fn info(&self) -> &'static FrameworkInfo;

    fn state(&self) -> FilterState;

    /// Load the model named by `props` and check it against the declared schema.
    fn configure(&mut self, props: &FilterProperties) -> Result<OpenOutcome>;

    /// Run one inference. `inputs[i]` and `outputs[i]` are bound to the i-th
    /// model input and output; their lengths are the caller-declared sizes.
    fn invoke(&mut self, inputs: &[&[u8]], outputs: &mut [&mut [u8]]) -> Result<()>;

    /// Input and output schemas of the loaded model.
    fn model_info(&self) -> Result<(&TensorsInfo, &TensorsInfo)>;

    /// Change the input schema and return the resulting output schema.
    fn set_input_info(&mut self, _input: &TensorsInfo) -> Result<TensorsInfo> {
        Err(FilterError::NotSupported("changing the input schema"))
    }

    /// Release the model. Safe to call in any state.
    fn release(&mut self);
}
