use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::graph::Graph;
use crate::nfm::NfmFile;
use crate::session::{HostTensor, ScheduleConfig, Session};

/// A loaded NFM model.
///
/// The interpreter owns the memory-mapped file and the validated op graph.
/// Sessions created from it share the graph but own their tensor storage.
pub struct Interpreter {
    path: PathBuf,
    file: NfmFile,
    graph: Arc<Graph>,
}

impl Interpreter {
    /// Open, parse and validate the model at `path`.
    pub fn from_file(path: &Path) -> Result<Interpreter> {
        let file = NfmFile::open(path)?;
        let graph = Graph::from_nfm(&file)?;
        tracing::debug!(
            path = %path.display(),
            inputs = graph.inputs.len(),
            outputs = graph.outputs.len(),
            ops = graph.ops.len(),
            "model parsed"
        );
        Ok(Interpreter {
            path: path.to_path_buf(),
            file,
            graph: Arc::new(graph),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn model_name(&self) -> Option<&str> {
        self.graph.name.as_deref()
    }

    /// Create an execution session with freshly zeroed input/output buffers.
    pub fn create_session(&self, config: ScheduleConfig) -> Result<Session> {
        let constants = self
            .graph
            .constants
            .iter()
            .map(|info| Ok(HostTensor::with_data(info, self.file.tensor_data(info)?)))
            .collect::<Result<Vec<_>>>()?;
        Session::new(Arc::clone(&self.graph), constants, config)
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        tracing::debug!(path = %self.path.display(), "model released");
    }
}
