use std::path::Path;

use nf_engine::{Interpreter, ScheduleConfig, Session, TensorMap};

use crate::error::{FilterError, Result};

/// An interpreter together with the one session created from it.
///
/// Fields drop in declaration order, so the session is always released before
/// the interpreter it was created from.
pub struct LoadedModel {
    session: Session,
    interpreter: Interpreter,
}

impl LoadedModel {
    /// Load the model at `path` and create a CPU session for it.
    pub fn open(path: &Path) -> Result<LoadedModel> {
        let load_error = |source| FilterError::Load {
            path: path.to_path_buf(),
            source,
        };
        let interpreter = Interpreter::from_file(path).map_err(load_error)?;
        let session = interpreter
            .create_session(ScheduleConfig::default())
            .map_err(load_error)?;
        Ok(LoadedModel {
            session,
            interpreter,
        })
    }

    pub fn path(&self) -> &Path {
        self.interpreter.path()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.interpreter.model_name()
    }

    pub fn inputs(&self) -> TensorMap<'_> {
        self.session.inputs()
    }

    pub fn outputs(&self) -> TensorMap<'_> {
        self.session.outputs()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}
