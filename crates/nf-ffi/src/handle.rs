use std::ffi::CString;

use nf_filter::{FilterFramework, Result};

use crate::types::NfTensorsInfo;

/// Opaque per-instance handle owning one filter.
pub struct NfFilter {
    pub filter: Box<dyn FilterFramework>,
    /// Backing storage for the name pointers handed out by `model_info`.
    names: Vec<CString>,
}

impl NfFilter {
    pub fn new(filter: Box<dyn FilterFramework>) -> Self {
        Self {
            filter,
            names: Vec::new(),
        }
    }

    /// Describe the configured model.
    ///
    /// Name pointers written into `inputs` and `outputs` stay valid until the
    /// next call, a reopen, or the handle is closed.
    pub fn model_info(
        &mut self,
        inputs: Option<&mut NfTensorsInfo>,
        outputs: Option<&mut NfTensorsInfo>,
    ) -> Result<()> {
        let (input_info, output_info) = self.filter.model_info()?;
        self.names = input_info
            .iter()
            .chain(output_info.iter())
            .map(|t| CString::new(t.name.as_str()).unwrap_or_default())
            .collect();

        let (input_names, output_names) = self.names.split_at(input_info.len());
        if let Some(inputs) = inputs {
            inputs.fill(input_info, input_names);
        }
        if let Some(outputs) = outputs {
            outputs.fill(output_info, output_names);
        }
        Ok(())
    }
}
