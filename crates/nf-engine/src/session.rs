use std::sync::Arc;

use crate::backend::{ComputeBackend, CpuBackend};
use crate::dtype::ElementType;
use crate::error::{EngineError, Result};
use crate::graph::{Graph, Op, OpKind, Operand};
use crate::nfm::NfmTensorInfo;

/// Execution target of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForwardType {
    #[default]
    Cpu,
}

/// Scheduling options used when creating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub forward_type: ForwardType,
    pub num_threads: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            forward_type: ForwardType::Cpu,
            num_threads: 1,
        }
    }
}

/// A session-owned tensor with host-accessible storage.
#[derive(Debug, Clone)]
pub struct HostTensor {
    name: String,
    dtype: ElementType,
    shape: Vec<u64>,
    data: Vec<u8>,
}

impl HostTensor {
    pub(crate) fn zeroed(info: &NfmTensorInfo) -> Result<Self> {
        Ok(HostTensor {
            name: info.name.clone(),
            dtype: info.dtype,
            shape: info.dims.clone(),
            data: vec![0u8; info.data_size()?],
        })
    }

    pub(crate) fn with_data(info: &NfmTensorInfo, data: &[u8]) -> Self {
        HostTensor {
            name: info.name.clone(),
            dtype: info.dtype,
            shape: info.dims.clone(),
            data: data.to_vec(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.dtype
    }

    /// Dimension sizes, outermost first.
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Byte size of the tensor's storage.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn host(&self) -> &[u8] {
        &self.data
    }

    pub fn host_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Read-only view of a session's input or output tensors, in graph order.
///
/// The view borrows the session, so it cannot outlive it.
#[derive(Debug, Clone, Copy)]
pub struct TensorMap<'s> {
    tensors: &'s [HostTensor],
}

impl<'s> TensorMap<'s> {
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'s, HostTensor> {
        self.tensors.iter()
    }

    pub fn get(&self, name: &str) -> Option<&'s HostTensor> {
        self.tensors.iter().find(|t| t.name == name)
    }

}

/// Mutable view of a session's input or output tensors, in graph order.
#[derive(Debug)]
pub struct TensorMapMut<'s> {
    tensors: &'s mut [HostTensor],
}

impl<'s> TensorMapMut<'s> {
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, HostTensor> {
        self.tensors.iter_mut()
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut HostTensor> {
        self.tensors.iter_mut().find(|t| t.name == name)
    }
}

/// Execution context for one interpreter's graph.
///
/// Owns the tensor buffers the forward pass reads and writes.
#[derive(Debug)]
pub struct Session {
    graph: Arc<Graph>,
    backend: Box<dyn ComputeBackend>,
    inputs: Vec<HostTensor>,
    outputs: Vec<HostTensor>,
    constants: Vec<HostTensor>,
    runs: u64,
}

impl Session {
    pub(crate) fn new(
        graph: Arc<Graph>,
        constants: Vec<HostTensor>,
        config: ScheduleConfig,
    ) -> Result<Session> {
        if config.num_threads == 0 {
            return Err(EngineError::Other("num_threads must be > 0".to_string()));
        }
        let backend: Box<dyn ComputeBackend> = match config.forward_type {
            ForwardType::Cpu => Box::new(CpuBackend::new()),
        };
        let inputs = graph
            .inputs
            .iter()
            .map(HostTensor::zeroed)
            .collect::<Result<Vec<_>>>()?;
        let outputs = graph
            .outputs
            .iter()
            .map(HostTensor::zeroed)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            backend = backend.name(),
            threads = config.num_threads,
            "session created"
        );
        Ok(Session {
            graph,
            backend,
            inputs,
            outputs,
            constants,
            runs: 0,
        })
    }

    pub fn inputs(&self) -> TensorMap<'_> {
        TensorMap {
            tensors: &self.inputs,
        }
    }

    pub fn inputs_mut(&mut self) -> TensorMapMut<'_> {
        TensorMapMut {
            tensors: &mut self.inputs,
        }
    }

    pub fn outputs(&self) -> TensorMap<'_> {
        TensorMap {
            tensors: &self.outputs,
        }
    }

    /// Number of completed forward passes.
    pub fn run_count(&self) -> u64 {
        self.runs
    }

    /// Run one synchronous forward pass over the current input buffers.
    pub fn run(&mut self) -> Result<()> {
        let graph = Arc::clone(&self.graph);
        for (index, op) in graph.ops.iter().enumerate() {
            let bytes = self.evaluate(op, self.outputs[index].dtype)?;
            self.outputs[index].data.copy_from_slice(&bytes);
        }
        self.runs += 1;
        Ok(())
    }

    fn operand(&self, operand: Operand) -> &HostTensor {
        match operand {
            Operand::Input(i) => &self.inputs[i],
            Operand::Constant(i) => &self.constants[i],
            Operand::Output(i) => &self.outputs[i],
        }
    }

    fn evaluate(&self, op: &Op, dtype: ElementType) -> Result<Vec<u8>> {
        let arg = |i: usize| decode_f32(&self.operand(op.operands[i]).data, dtype);
        let result = match op.kind {
            OpKind::Identity => return Ok(self.operand(op.operands[0]).data.clone()),
            OpKind::Add => self.backend.add(&arg(0)?, &arg(1)?)?,
            OpKind::Mul => self.backend.mul(&arg(0)?, &arg(1)?)?,
            OpKind::Scale => self.backend.scale(&arg(0)?, op.factor)?,
        };
        encode_f32(&result, dtype)
    }
}

/// Decode little-endian f32 or f16 bytes into f32 values.
fn decode_f32(data: &[u8], dtype: ElementType) -> Result<Vec<f32>> {
    match dtype {
        ElementType::F32 => Ok(data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        ElementType::F16 => Ok(data
            .chunks_exact(2)
            .map(|b| half::f16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect()),
        other => Err(EngineError::Compute(format!("cannot compute on {}", other))),
    }
}

fn encode_f32(values: &[f32], dtype: ElementType) -> Result<Vec<u8>> {
    match dtype {
        ElementType::F32 => Ok(values.iter().flat_map(|v| v.to_le_bytes()).collect()),
        ElementType::F16 => Ok(values
            .iter()
            .flat_map(|v| half::f16::from_f32(*v).to_le_bytes())
            .collect()),
        other => Err(EngineError::Compute(format!("cannot compute on {}", other))),
    }
}
