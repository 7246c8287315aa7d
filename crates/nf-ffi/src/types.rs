use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::ptr;

use nf_filter::FilterProperties;
use nf_tensor::{Dimension, TensorInfo, TensorType, TensorsInfo, RANK_LIMIT, SIZE_LIMIT};

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NfStatus {
    Ok = 0,
    /// `nf_filter_open` was given the model that is already loaded.
    AlreadyOpen = 1,
    ErrorInvalidArgument = 2,
    ErrorModelLoad = 3,
    ErrorSchema = 4,
    ErrorSize = 5,
    ErrorIllegalState = 6,
    ErrorNotSupported = 7,
    ErrorInternal = 8,
}

/// One tensor descriptor.
///
/// `ty` uses the pipeline's tensor type numbering. Only the first `rank`
/// entries of `dims` are meaningful; the rest are zero. `name` is borrowed
/// and may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NfTensorInfo {
    pub name: *const c_char,
    pub ty: i32,
    pub rank: u32,
    pub dims: [u32; RANK_LIMIT],
}

/// Fixed-capacity list of tensor descriptors.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NfTensorsInfo {
    pub num_tensors: u32,
    pub info: [NfTensorInfo; SIZE_LIMIT],
}

/// A caller-owned tensor buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NfTensorMemory {
    pub data: *mut c_void,
    pub size: usize,
}

/// Properties for `nf_filter_open`.
///
/// `framework` may be null, selecting the NFM framework. `model_path` may be
/// null, in which case opening fails with `ErrorModelLoad`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NfFilterProperties {
    pub framework: *const c_char,
    pub model_path: *const c_char,
    pub input_info: NfTensorsInfo,
    pub output_info: NfTensorsInfo,
}

impl NfTensorInfo {
    pub const EMPTY: NfTensorInfo = NfTensorInfo {
        name: ptr::null(),
        ty: 0,
        rank: 0,
        dims: [0; RANK_LIMIT],
    };
}

impl NfTensorsInfo {
    pub const EMPTY: NfTensorsInfo = NfTensorsInfo {
        num_tensors: 0,
        info: [NfTensorInfo::EMPTY; SIZE_LIMIT],
    };

    /// Fill from `infos`, pointing each name at the matching entry of `names`.
    pub(crate) fn fill(&mut self, infos: &TensorsInfo, names: &[CString]) {
        *self = NfTensorsInfo::EMPTY;
        self.num_tensors = infos.len() as u32;
        for (slot, (info, name)) in self.info.iter_mut().zip(infos.iter().zip(names)) {
            slot.name = name.as_ptr();
            slot.ty = info.ty as i32;
            slot.rank = info.dims.ndim() as u32;
            slot.dims = *info.dims.as_array();
        }
    }

    /// Convert to the Rust-side descriptor list.
    ///
    /// # Safety
    /// Every non-null `name` among the first `num_tensors` entries must point
    /// to a valid NUL-terminated string.
    pub(crate) unsafe fn to_tensors_info(&self) -> Result<TensorsInfo, String> {
        let count = self.num_tensors as usize;
        if count > SIZE_LIMIT {
            return Err(format!("{count} tensors exceed the limit of {SIZE_LIMIT}"));
        }
        let mut out = TensorsInfo::new();
        for raw in &self.info[..count] {
            let name = cstr_to_string(raw.name)?.unwrap_or_default();
            let ty = TensorType::from_raw(raw.ty)
                .ok_or_else(|| format!("tensor '{name}': unknown type {}", raw.ty))?;
            let rank = raw.rank as usize;
            if rank > RANK_LIMIT {
                return Err(format!(
                    "tensor '{name}': rank {rank} exceeds the limit of {RANK_LIMIT}"
                ));
            }
            let dims = Dimension::from_slice(&raw.dims[..rank])
                .map_err(|e| format!("tensor '{name}': {e}"))?;
            out.push(TensorInfo::new(name, ty, dims))
                .map_err(|e| e.to_string())?;
        }
        Ok(out)
    }
}

impl NfFilterProperties {
    /// # Safety
    /// `framework` and `model_path` must be null or valid NUL-terminated
    /// strings; see also [`NfTensorsInfo::to_tensors_info`].
    pub(crate) unsafe fn to_properties(&self) -> Result<FilterProperties, String> {
        let mut props = FilterProperties::default();
        if let Some(framework) = cstr_to_string(self.framework)? {
            props.framework = framework;
        }
        if let Some(path) = cstr_to_string(self.model_path)? {
            props.model_files.push(PathBuf::from(path));
        }
        props.input_info = self.input_info.to_tensors_info()?;
        props.output_info = self.output_info.to_tensors_info()?;
        Ok(props)
    }
}

unsafe fn cstr_to_string(s: *const c_char) -> Result<Option<String>, String> {
    if s.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(s)
        .to_str()
        .map(|s| Some(s.to_string()))
        .map_err(|e| format!("invalid string: {e}"))
}
