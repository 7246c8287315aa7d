use std::collections::HashMap;
use std::io::{Read, Write};

use crate::error::{EngineError, Result};
use super::{read_bytes, read_string, write_string};

/// Value type ID of an array. Arrays hold scalars or strings only.
const ARRAY_TYPE_ID: u32 = 9;

/// A single NFM metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    String(String),
    Array(Vec<MetadataValue>),
}

impl MetadataValue {
    /// Returns a human-readable name for the variant (used in error messages).
    fn type_name(&self) -> &'static str {
        match self {
            MetadataValue::U8(_) => "U8",
            MetadataValue::I8(_) => "I8",
            MetadataValue::U16(_) => "U16",
            MetadataValue::I16(_) => "I16",
            MetadataValue::U32(_) => "U32",
            MetadataValue::I32(_) => "I32",
            MetadataValue::U64(_) => "U64",
            MetadataValue::I64(_) => "I64",
            MetadataValue::F32(_) => "F32",
            MetadataValue::F64(_) => "F64",
            MetadataValue::Bool(_) => "Bool",
            MetadataValue::String(_) => "String",
            MetadataValue::Array(_) => "Array",
        }
    }

    /// NFM value type ID of this variant.
    fn type_id(&self) -> u32 {
        match self {
            MetadataValue::U8(_) => 0,
            MetadataValue::I8(_) => 1,
            MetadataValue::U16(_) => 2,
            MetadataValue::I16(_) => 3,
            MetadataValue::U32(_) => 4,
            MetadataValue::I32(_) => 5,
            MetadataValue::F32(_) => 6,
            MetadataValue::Bool(_) => 7,
            MetadataValue::String(_) => 8,
            MetadataValue::Array(_) => ARRAY_TYPE_ID,
            MetadataValue::U64(_) => 10,
            MetadataValue::I64(_) => 11,
            MetadataValue::F64(_) => 12,
        }
    }

    /// Build a string array value.
    pub fn strings<I, S>(items: I) -> MetadataValue
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MetadataValue::Array(
            items
                .into_iter()
                .map(|s| MetadataValue::String(s.into()))
                .collect(),
        )
    }

    /// Write the payload of this value (without the type ID).
    fn write_payload(&self, writer: &mut impl Write) -> Result<()> {
        match self {
            MetadataValue::U8(v) => writer.write_all(&[*v])?,
            MetadataValue::I8(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::U16(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::I16(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::U32(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::I32(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::U64(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::I64(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::F32(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::F64(v) => writer.write_all(&v.to_le_bytes())?,
            MetadataValue::Bool(v) => writer.write_all(&[*v as u8])?,
            MetadataValue::String(s) => write_string(writer, s)?,
            MetadataValue::Array(items) => {
                // Empty arrays are written as string arrays.
                let elem_type = items.first().map(|v| v.type_id()).unwrap_or(8);
                if let Some(bad) = items.iter().find(|v| v.type_id() != elem_type) {
                    return Err(EngineError::Other(format!(
                        "heterogeneous metadata array: {} among type ID {}",
                        bad.type_name(),
                        elem_type
                    )));
                }
                if elem_type == ARRAY_TYPE_ID {
                    return Err(EngineError::Other(
                        "nested metadata arrays are not supported".to_string(),
                    ));
                }
                writer.write_all(&elem_type.to_le_bytes())?;
                writer.write_all(&(items.len() as u64).to_le_bytes())?;
                for item in items {
                    item.write_payload(writer)?;
                }
            }
        }
        Ok(())
    }
}

/// Collection of NFM metadata key-value pairs.
#[derive(Debug, Clone, Default)]
pub struct NfmMetadata {
    pub entries: HashMap<String, MetadataValue>,
}

impl NfmMetadata {
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    /// Retrieve a string value by key.
    pub fn get_string(&self, key: &str) -> Result<&str> {
        match self.entries.get(key) {
            Some(MetadataValue::String(s)) => Ok(s.as_str()),
            Some(other) => Err(mismatch(key, "String", other)),
            None => Err(EngineError::MissingKey(key.to_string())),
        }
    }

    /// Retrieve an f32 value by key.
    pub fn get_f32(&self, key: &str) -> Result<f32> {
        match self.entries.get(key) {
            Some(MetadataValue::F32(v)) => Ok(*v),
            Some(other) => Err(mismatch(key, "F32", other)),
            None => Err(EngineError::MissingKey(key.to_string())),
        }
    }

    /// Retrieve a string array value by key.
    pub fn get_string_array(&self, key: &str) -> Result<Vec<String>> {
        match self.entries.get(key) {
            Some(MetadataValue::Array(arr)) => {
                let mut result = Vec::with_capacity(arr.len());
                for (i, v) in arr.iter().enumerate() {
                    match v {
                        MetadataValue::String(s) => result.push(s.clone()),
                        other => return Err(mismatch(&format!("{}[{}]", key, i), "String", other)),
                    }
                }
                Ok(result)
            }
            Some(other) => Err(mismatch(key, "Array", other)),
            None => Err(EngineError::MissingKey(key.to_string())),
        }
    }

    /// Parse `n_kv` key-value metadata entries from a reader.
    ///
    /// Each entry consists of:
    /// 1. An NFM string key (u64 length + UTF-8 bytes).
    /// 2. A u32 value type ID.
    /// 3. The value payload, whose format depends on the type ID.
    ///
    /// NFM value type IDs:
    ///   0=U8, 1=I8, 2=U16, 3=I16, 4=U32, 5=I32, 6=F32, 7=Bool,
    ///   8=String, 9=Array, 10=U64, 11=I64, 12=F64
    pub fn parse_kv(reader: &mut impl Read, n_kv: u64) -> Result<NfmMetadata> {
        let mut entries = HashMap::new();
        for _ in 0..n_kv {
            let key = read_string(reader)?;
            let type_id = u32::from_le_bytes(read_bytes(reader)?);
            let value = read_value(reader, type_id)?;
            entries.insert(key, value);
        }
        Ok(NfmMetadata { entries })
    }

    /// Write one entry in the layout `parse_kv` reads.
    pub fn write_entry(writer: &mut impl Write, key: &str, value: &MetadataValue) -> Result<()> {
        write_string(writer, key)?;
        writer.write_all(&value.type_id().to_le_bytes())?;
        value.write_payload(writer)
    }
}

fn mismatch(key: &str, expected: &str, got: &MetadataValue) -> EngineError {
    EngineError::TypeMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        got: got.type_name().to_string(),
    }
}

/// Read a single NFM metadata value given its type ID.
fn read_value(reader: &mut impl Read, type_id: u32) -> Result<MetadataValue> {
    let value = match type_id {
        0 => MetadataValue::U8(read_bytes::<1>(reader)?[0]),
        1 => MetadataValue::I8(i8::from_le_bytes(read_bytes(reader)?)),
        2 => MetadataValue::U16(u16::from_le_bytes(read_bytes(reader)?)),
        3 => MetadataValue::I16(i16::from_le_bytes(read_bytes(reader)?)),
        4 => MetadataValue::U32(u32::from_le_bytes(read_bytes(reader)?)),
        5 => MetadataValue::I32(i32::from_le_bytes(read_bytes(reader)?)),
        6 => MetadataValue::F32(f32::from_le_bytes(read_bytes(reader)?)),
        7 => MetadataValue::Bool(read_bytes::<1>(reader)?[0] != 0),
        8 => MetadataValue::String(read_string(reader)?),
        9 => {
            // Array: u32 element_type, u64 count, then count values of element_type
            let elem_type = u32::from_le_bytes(read_bytes(reader)?);
            if elem_type == ARRAY_TYPE_ID {
                return Err(EngineError::Other(
                    "nested metadata arrays are not supported".to_string(),
                ));
            }
            let count = u64::from_le_bytes(read_bytes(reader)?) as usize;
            let mut values = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                values.push(read_value(reader, elem_type)?);
            }
            MetadataValue::Array(values)
        }
        10 => MetadataValue::U64(u64::from_le_bytes(read_bytes(reader)?)),
        11 => MetadataValue::I64(i64::from_le_bytes(read_bytes(reader)?)),
        12 => MetadataValue::F64(f64::from_le_bytes(read_bytes(reader)?)),
        other => return Err(EngineError::UnsupportedValueType(other)),
    };
    Ok(value)
}
