use std::path::Path;

use nf_tensor::TensorsInfo;

use crate::error::{Direction, FilterError, RegistryError, Result};
use crate::framework::{Accelerator, FilterFramework, FilterState, FrameworkInfo, OpenOutcome};
use crate::loader::LoadedModel;
use crate::properties::FilterProperties;
use crate::registry::FilterRegistry;
use crate::{translate, validate};

/// Registry name of the NFM framework.
pub const FRAMEWORK_NAME: &str = "nfm";

pub static FRAMEWORK_INFO: FrameworkInfo = FrameworkInfo {
    name: FRAMEWORK_NAME,
    allow_in_place: false,
    allocate_in_invoke: false,
    run_without_model: false,
    verify_model_path: true,
    hw_list: &[Accelerator::Cpu],
    accl_auto: Accelerator::Cpu,
    accl_default: Accelerator::Cpu,
    statistics: false,
};

/// Everything that exists only while a model is configured.
struct Configured {
    model: LoadedModel,
    input_info: TensorsInfo,
    output_info: TensorsInfo,
}

impl Configured {
    fn open(path: &Path, props: &FilterProperties) -> Result<Configured> {
        let model = LoadedModel::open(path)?;
        check_model_counts(&model, props)?;

        let input_info = translate::tensors_info(Direction::Input, model.inputs())?;
        let output_info = translate::tensors_info(Direction::Output, model.outputs())?;

        Ok(Configured {
            model,
            input_info,
            output_info,
        })
    }
}

/// Declared tensor counts must match the model's, in both directions.
fn check_model_counts(model: &LoadedModel, props: &FilterProperties) -> Result<()> {
    validate::check_counts(Direction::Input, props.input_info.len(), model.inputs().len())?;
    validate::check_counts(Direction::Output, props.output_info.len(), model.outputs().len())
}

/// Tensor filter backed by an `nf-engine` interpreter.
///
/// Starts `Empty`; `configure` loads a model and moves it to `Configured`;
/// `release` (or drop) returns it to `Empty`.
#[derive(Default)]
pub struct NfmFilter {
    configured: Option<Configured>,
}

impl NfmFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory used for registry registration.
    pub fn boxed() -> Box<dyn FilterFramework> {
        Box::new(NfmFilter::new())
    }

    /// Register this framework. Call once when the module is loaded.
    pub fn register(registry: &FilterRegistry) -> std::result::Result<(), RegistryError> {
        registry.register(&FRAMEWORK_INFO, NfmFilter::boxed)
    }

    /// Undo `register`. Call once when the module is unloaded.
    pub fn unregister(registry: &FilterRegistry) -> std::result::Result<(), RegistryError> {
        registry.unregister(FRAMEWORK_NAME)
    }

    /// Path of the loaded model, if any.
    pub fn model_path(&self) -> Option<&Path> {
        self.configured.as_ref().map(|c| c.model.path())
    }

    /// Number of forward passes run since the model was loaded.
    pub fn run_count(&self) -> Option<u64> {
        self.configured.as_ref().map(|c| c.model.session().run_count())
    }
}

impl FilterFramework for NfmFilter {
    fn info(&self) -> &'static FrameworkInfo {
        &FRAMEWORK_INFO
    }

    fn state(&self) -> FilterState {
        match self.configured {
            Some(_) => FilterState::Configured,
            None => FilterState::Empty,
        }
    }

    fn configure(&mut self, props: &FilterProperties) -> Result<OpenOutcome> {
        let path = props.first_model().ok_or(FilterError::NoModel)?;

        if let Some(current) = &self.configured {
            if current.model.path() == path {
                check_model_counts(&current.model, props)?;
                return Ok(OpenOutcome::AlreadyOpen);
            }
            tracing::warn!(
                old = %current.model.path().display(),
                new = %path.display(),
                "model file changed, reopening"
            );
            self.release();
        }

        let configured = Configured::open(path, props)?;
        tracing::info!(
            path = %path.display(),
            model = configured.model.model_name().unwrap_or("<unnamed>"),
            inputs = configured.input_info.len(),
            outputs = configured.output_info.len(),
            "model configured"
        );
        self.configured = Some(configured);
        Ok(OpenOutcome::Opened)
    }

    fn invoke(&mut self, inputs: &[&[u8]], outputs: &mut [&mut [u8]]) -> Result<()> {
        let configured = self
            .configured
            .as_mut()
            .ok_or(FilterError::IllegalState("invoke called on an unconfigured filter"))?;
        let session = configured.model.session_mut();

        // Check everything before touching any buffer.
        validate::check_buffers(Direction::Input, session.inputs(), inputs)?;
        validate::check_buffers(Direction::Output, session.outputs(), &*outputs)?;

        for (tensor, buffer) in session.inputs_mut().iter_mut().zip(inputs) {
            tensor.host_mut().copy_from_slice(buffer);
        }
        session.run()?;
        for (tensor, buffer) in session.outputs().iter().zip(outputs.iter_mut()) {
            buffer.copy_from_slice(tensor.host());
        }

        tracing::trace!(
            inputs = inputs.len(),
            outputs = outputs.len(),
            run = session.run_count(),
            "invoke done"
        );
        Ok(())
    }

    fn model_info(&self) -> Result<(&TensorsInfo, &TensorsInfo)> {
        self.configured
            .as_ref()
            .map(|c| (&c.input_info, &c.output_info))
            .ok_or(FilterError::IllegalState("model info requested from an unconfigured filter"))
    }

    fn release(&mut self) {
        if let Some(configured) = self.configured.take() {
            tracing::info!(path = %configured.model.path().display(), "releasing model");
            drop(configured);
        }
    }
}

impl Drop for NfmFilter {
    fn drop(&mut self) {
        self.release();
    }
}
