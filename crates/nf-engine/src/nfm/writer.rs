use std::path::Path;

use crate::dtype::ElementType;
use crate::error::Result;
use super::header::{NfmHeader, NFM_VERSION};
use super::metadata::{MetadataValue, NfmMetadata};
use super::tensor_info::NfmTensorInfo;
use super::{align, op_factor_key, op_key, op_src_key, KEY_INPUTS, KEY_MODEL_NAME, KEY_OUTPUTS};

/// The op producing one graph output, as stored in metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct OpSpec {
    pub kind: String,
    pub src: Vec<String>,
    pub factor: Option<f32>,
}

impl OpSpec {
    pub fn identity(src: &str) -> Self {
        OpSpec {
            kind: "identity".to_string(),
            src: vec![src.to_string()],
            factor: None,
        }
    }

    pub fn add(a: &str, b: &str) -> Self {
        OpSpec {
            kind: "add".to_string(),
            src: vec![a.to_string(), b.to_string()],
            factor: None,
        }
    }

    pub fn mul(a: &str, b: &str) -> Self {
        OpSpec {
            kind: "mul".to_string(),
            src: vec![a.to_string(), b.to_string()],
            factor: None,
        }
    }

    pub fn scale(src: &str, factor: f32) -> Self {
        OpSpec {
            kind: "scale".to_string(),
            src: vec![src.to_string()],
            factor: Some(factor),
        }
    }
}

/// Serializes a graph description into the NFM format.
///
/// ```no_run
/// use nf_engine::nfm::{ModelWriter, OpSpec};
/// use nf_engine::ElementType;
///
/// ModelWriter::new()
///     .input("in", ElementType::F32, &[1, 4])
///     .output("out", ElementType::F32, &[1, 4], OpSpec::identity("in"))
///     .write(std::path::Path::new("identity.nfm"))
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelWriter {
    name: Option<String>,
    inputs: Vec<String>,
    outputs: Vec<(String, OpSpec)>,
    extra: Vec<(String, MetadataValue)>,
    tensors: Vec<(NfmTensorInfo, Option<Vec<u8>>)>,
}

impl ModelWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn input(mut self, name: &str, dtype: ElementType, dims: &[u64]) -> Self {
        self.inputs.push(name.to_string());
        self.tensors.push((declare(name, dtype, dims), None));
        self
    }

    pub fn output(mut self, name: &str, dtype: ElementType, dims: &[u64], op: OpSpec) -> Self {
        self.outputs.push((name.to_string(), op));
        self.tensors.push((declare(name, dtype, dims), None));
        self
    }

    pub fn constant(mut self, name: &str, dtype: ElementType, dims: &[u64], data: Vec<u8>) -> Self {
        self.tensors.push((declare(name, dtype, dims), Some(data)));
        self
    }

    /// Add a raw metadata entry. Entries added here are written after the
    /// generated graph keys and therefore take precedence over them.
    pub fn metadata(mut self, key: &str, value: MetadataValue) -> Self {
        self.extra.push((key.to_string(), value));
        self
    }

    fn metadata_entries(&self) -> Vec<(String, MetadataValue)> {
        let mut entries = Vec::new();
        if let Some(name) = &self.name {
            entries.push((KEY_MODEL_NAME.to_string(), MetadataValue::String(name.clone())));
        }
        entries.push((KEY_INPUTS.to_string(), MetadataValue::strings(self.inputs.iter().cloned())));
        entries.push((
            KEY_OUTPUTS.to_string(),
            MetadataValue::strings(self.outputs.iter().map(|(n, _)| n.clone())),
        ));
        for (name, op) in &self.outputs {
            entries.push((op_key(name), MetadataValue::String(op.kind.clone())));
            entries.push((op_src_key(name), MetadataValue::strings(op.src.iter().cloned())));
            if let Some(factor) = op.factor {
                entries.push((op_factor_key(name), MetadataValue::F32(factor)));
            }
        }
        entries.extend(self.extra.iter().cloned());
        entries
    }

    /// Encode the model into an in-memory NFM image.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let entries = self.metadata_entries();

        // Lay out constant data, each blob aligned within the data section.
        let mut data = Vec::new();
        let mut infos = Vec::with_capacity(self.tensors.len());
        for (info, bytes) in &self.tensors {
            let mut info = info.clone();
            if let Some(bytes) = bytes {
                data.resize(align(data.len()), 0);
                info.offset = data.len() as u64;
                data.extend_from_slice(bytes);
            }
            infos.push(info);
        }

        let mut buf = Vec::new();
        NfmHeader {
            version: NFM_VERSION,
            n_tensors: infos.len() as u64,
            n_kv: entries.len() as u64,
        }
        .write(&mut buf)?;
        for (key, value) in &entries {
            NfmMetadata::write_entry(&mut buf, key, value)?;
        }
        for info in &infos {
            info.write(&mut buf)?;
        }
        buf.resize(align(buf.len()), 0);
        buf.extend_from_slice(&data);
        Ok(buf)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

fn declare(name: &str, dtype: ElementType, dims: &[u64]) -> NfmTensorInfo {
    NfmTensorInfo {
        name: name.to_string(),
        dims: dims.to_vec(),
        dtype,
        offset: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfm::NfmFile;

    #[test]
    fn test_written_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.nfm");
        let bias: Vec<u8> = [1.0f32, 2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        ModelWriter::new()
            .name("tiny")
            .input("x", ElementType::F32, &[2])
            .constant("b", ElementType::F32, &[2], bias.clone())
            .output("y", ElementType::F32, &[2], OpSpec::add("x", "b"))
            .write(&path)
            .unwrap();

        let file = NfmFile::open(&path).unwrap();
        assert_eq!(file.header.n_tensors, 3);
        assert_eq!(file.metadata.get_string("model.name").unwrap(), "tiny");
        assert_eq!(file.metadata.get_string_array("graph.inputs").unwrap(), vec!["x"]);
        assert_eq!(file.metadata.get_string("op.y").unwrap(), "add");
        assert_eq!(file.metadata.get_string_array("op.y.src").unwrap(), vec!["x", "b"]);

        let info = file.tensor_info("b").unwrap();
        assert_eq!(file.tensor_data(info).unwrap(), bias.as_slice());
    }

    #[test]
    fn test_extra_metadata_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.nfm");
        ModelWriter::new()
            .input("x", ElementType::U8, &[4])
            .output("y", ElementType::U8, &[4], OpSpec::identity("x"))
            .metadata("op.y", MetadataValue::String("conv".into()))
            .write(&path)
            .unwrap();
        let file = NfmFile::open(&path).unwrap();
        assert_eq!(file.metadata.get_string("op.y").unwrap(), "conv");
    }

    #[test]
    fn test_constant_data_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.nfm");
        let bytes = ModelWriter::new()
            .constant("c", ElementType::F32, &[4], vec![0u8; 16])
            .to_bytes()
            .unwrap();
        // Drop the tail so the constant no longer fits.
        std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();
        let file = NfmFile::open(&path).unwrap();
        let info = file.tensor_info("c").unwrap();
        assert!(file.tensor_data(info).is_err());

        // An offset near the top of the address space must not wrap around.
        let mut far = info.clone();
        far.offset = u64::MAX - 4;
        assert!(file.tensor_data(&far).is_err());
    }
}
