//! `nf-engine` - A small CPU graph inference engine.
//!
//! Models are stored in the NFM format (see [`nfm`]). Loading one yields an
//! [`Interpreter`]; an interpreter creates [`Session`]s, which own the tensor
//! buffers and run the forward pass.
//!
//! ```no_run
//! use nf_engine::{Interpreter, ScheduleConfig};
//!
//! let interp = Interpreter::from_file(std::path::Path::new("model.nfm")).unwrap();
//! let mut session = interp.create_session(ScheduleConfig::default()).unwrap();
//! for tensor in session.inputs().iter() {
//!     println!("{} {} {:?}", tensor.name(), tensor.element_type(), tensor.shape());
//! }
//! session.run().unwrap();
//! ```

pub mod backend;
pub mod dtype;
pub mod error;
pub mod graph;
pub mod interpreter;
pub mod nfm;
pub mod session;

pub use backend::{ComputeBackend, CpuBackend};
pub use dtype::{ElementType, TypeClass};
pub use error::{EngineError, Result};
pub use interpreter::Interpreter;
pub use session::{ForwardType, HostTensor, ScheduleConfig, Session, TensorMap, TensorMapMut};
