//! Op graph built from an NFM file.
//!
//! Every graph output is produced by exactly one op. Operands may be graph
//! inputs, constants, or outputs that appear earlier in the output list, so
//! executing ops in output order is always valid.

use std::collections::HashSet;

use crate::dtype::ElementType;
use crate::error::{EngineError, Result};
use crate::nfm::{op_factor_key, op_key, op_src_key, NfmFile, NfmTensorInfo};
use crate::nfm::{KEY_INPUTS, KEY_MODEL_NAME, KEY_OUTPUTS};

/// Largest byte size a single tensor may declare. Session buffers are
/// allocated up front, so anything above this is treated as a corrupt model.
pub const MAX_TENSOR_BYTES: usize = 1 << 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Byte-for-byte copy; works on any element type.
    Identity,
    Add,
    Mul,
    Scale,
}

impl OpKind {
    pub fn parse(s: &str) -> Option<OpKind> {
        match s {
            "identity" => Some(OpKind::Identity),
            "add" => Some(OpKind::Add),
            "mul" => Some(OpKind::Mul),
            "scale" => Some(OpKind::Scale),
            _ => None,
        }
    }

    fn arity(&self) -> usize {
        match self {
            OpKind::Identity | OpKind::Scale => 1,
            OpKind::Add | OpKind::Mul => 2,
        }
    }
}

/// Where an op reads one of its operands from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Input(usize),
    Constant(usize),
    Output(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    pub kind: OpKind,
    pub operands: Vec<Operand>,
    /// Only meaningful for `OpKind::Scale`.
    pub factor: f32,
}

#[derive(Debug, Clone)]
pub struct Graph {
    pub name: Option<String>,
    pub inputs: Vec<NfmTensorInfo>,
    pub outputs: Vec<NfmTensorInfo>,
    pub constants: Vec<NfmTensorInfo>,
    /// `ops[i]` produces `outputs[i]`.
    pub ops: Vec<Op>,
}

impl Graph {
    /// Build and validate the graph described by `file`.
    pub fn from_nfm(file: &NfmFile) -> Result<Graph> {
        let mut seen = HashSet::new();
        for info in &file.tensor_infos {
            if !seen.insert(info.name.as_str()) {
                return Err(EngineError::InvalidGraph(format!(
                    "tensor '{}' is declared more than once",
                    info.name
                )));
            }
            check_extent(info)?;
        }

        let input_names = file.metadata.get_string_array(KEY_INPUTS)?;
        let output_names = file.metadata.get_string_array(KEY_OUTPUTS)?;
        if let Some(both) = input_names.iter().find(|n| output_names.contains(n)) {
            return Err(EngineError::InvalidGraph(format!(
                "tensor '{}' is both an input and an output",
                both
            )));
        }

        let inputs = input_names
            .iter()
            .map(|n| file.tensor_info(n).cloned())
            .collect::<Result<Vec<_>>>()?;
        let outputs = output_names
            .iter()
            .map(|n| file.tensor_info(n).cloned())
            .collect::<Result<Vec<_>>>()?;

        let mut constants = Vec::new();
        for info in &file.tensor_infos {
            if !input_names.contains(&info.name) && !output_names.contains(&info.name) {
                file.tensor_data(info)?;
                constants.push(info.clone());
            }
        }

        let name = file.metadata.get_string(KEY_MODEL_NAME).ok().map(str::to_string);
        let mut graph = Graph {
            name,
            inputs,
            outputs,
            constants,
            ops: Vec::new(),
        };

        let ops = graph
            .outputs
            .iter()
            .enumerate()
            .map(|(index, output)| graph.build_op(file, index, output))
            .collect::<Result<Vec<_>>>()?;
        graph.ops = ops;
        Ok(graph)
    }

    /// Declaration of the tensor an operand refers to.
    pub fn operand_info(&self, operand: Operand) -> &NfmTensorInfo {
        match operand {
            Operand::Input(i) => &self.inputs[i],
            Operand::Constant(i) => &self.constants[i],
            Operand::Output(i) => &self.outputs[i],
        }
    }

    fn resolve(&self, name: &str, consumer: &str, position: usize) -> Result<Operand> {
        if let Some(i) = self.inputs.iter().position(|t| t.name == name) {
            return Ok(Operand::Input(i));
        }
        if let Some(i) = self.constants.iter().position(|t| t.name == name) {
            return Ok(Operand::Constant(i));
        }
        match self.outputs.iter().position(|t| t.name == name) {
            Some(i) if i < position => Ok(Operand::Output(i)),
            Some(_) => Err(EngineError::InvalidGraph(format!(
                "operand '{}' of '{}' is not computed before it",
                name, consumer
            ))),
            None => Err(EngineError::TensorNotFound(name.to_string())),
        }
    }

    fn build_op(&self, file: &NfmFile, index: usize, output: &NfmTensorInfo) -> Result<Op> {
        let tensor = output.name.as_str();
        let kind_name = file.metadata.get_string(&op_key(tensor))?;
        let kind = OpKind::parse(kind_name).ok_or_else(|| EngineError::UnknownOp {
            tensor: tensor.to_string(),
            op: kind_name.to_string(),
        })?;

        let src = file.metadata.get_string_array(&op_src_key(tensor))?;
        if src.len() != kind.arity() {
            return Err(EngineError::InvalidGraph(format!(
                "op {:?} producing '{}' takes {} operand(s), got {}",
                kind,
                tensor,
                kind.arity(),
                src.len()
            )));
        }
        let operands = src
            .iter()
            .map(|s| self.resolve(s, tensor, index))
            .collect::<Result<Vec<_>>>()?;

        let factor = match kind {
            OpKind::Scale => file.metadata.get_f32(&op_factor_key(tensor))?,
            _ => 1.0,
        };

        let op = Op {
            kind,
            operands,
            factor,
        };
        self.check_op(&op, output)?;
        Ok(op)
    }

    fn check_op(&self, op: &Op, output: &NfmTensorInfo) -> Result<()> {
        for &operand in &op.operands {
            let info = self.operand_info(operand);
            match op.kind {
                OpKind::Identity => {
                    let (from, to) = (info.data_size()?, output.data_size()?);
                    if from != to {
                        return Err(EngineError::InvalidGraph(format!(
                            "identity '{}' -> '{}' changes byte size ({} vs {})",
                            info.name, output.name, from, to
                        )));
                    }
                }
                OpKind::Add | OpKind::Mul | OpKind::Scale => {
                    if output.dtype != ElementType::F32 && output.dtype != ElementType::F16 {
                        return Err(EngineError::InvalidGraph(format!(
                            "op {:?} producing '{}' does not support {}",
                            op.kind, output.name, output.dtype
                        )));
                    }
                    let (from, to) = (info.numel()?, output.numel()?);
                    if info.dtype != output.dtype || from != to {
                        return Err(EngineError::InvalidGraph(format!(
                            "operand '{}' ({} x {}) does not match '{}' ({} x {})",
                            info.name, info.dtype, from, output.name, output.dtype, to
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Every dimension must be non-zero and the total size must stay within
/// `MAX_TENSOR_BYTES`.
fn check_extent(info: &NfmTensorInfo) -> Result<()> {
    if info.dims.contains(&0) {
        return Err(EngineError::InvalidGraph(format!(
            "tensor '{}' has a zero-sized dimension {:?}",
            info.name, info.dims
        )));
    }
    let size = info.data_size()?;
    if size > MAX_TENSOR_BYTES {
        return Err(EngineError::InvalidGraph(format!(
            "tensor '{}' needs {} bytes, more than the limit of {}",
            info.name, size, MAX_TENSOR_BYTES
        )));
    }
    Ok(())
}
