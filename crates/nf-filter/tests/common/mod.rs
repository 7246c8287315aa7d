#![allow(dead_code)]

use std::path::{Path, PathBuf};

use nf_engine::nfm::{ModelWriter, OpSpec};
use nf_engine::ElementType;
use nf_filter::FilterProperties;
use nf_tensor::{Dimension, TensorInfo, TensorType, TensorsInfo};

/// Write `writer` into `dir` as `name` and return the path.
pub fn write_model(dir: &Path, name: &str, writer: ModelWriter) -> PathBuf {
    let path = dir.join(name);
    writer.write(&path).unwrap();
    path
}

/// A u8 pass-through model with a single input and output of `len` bytes.
pub fn identity_model(len: u64) -> ModelWriter {
    ModelWriter::new()
        .name("identity")
        .input("in", ElementType::U8, &[1, len])
        .output("out", ElementType::U8, &[1, len], OpSpec::identity("in"))
}

/// A declared schema with `n` placeholder entries; only the count matters.
pub fn declared(n: usize) -> TensorsInfo {
    let infos = (0..n)
        .map(|i| {
            TensorInfo::new(
                format!("t{}", i),
                TensorType::Uint8,
                Dimension::from_slice(&[1]).unwrap(),
            )
        })
        .collect::<Vec<_>>();
    TensorsInfo::try_from(infos).unwrap()
}

pub fn props(model: &Path, n_in: usize, n_out: usize) -> FilterProperties {
    FilterProperties::new(model, declared(n_in), declared(n_out))
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn f32_values(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
