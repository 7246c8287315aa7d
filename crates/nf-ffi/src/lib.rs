//! C interface to the NFM tensor filter.
//!
//! A host pipeline calls `nf_filter_module_init` once when it loads this
//! library, opens one handle per filter instance, and calls
//! `nf_filter_module_fini` before unloading. The generated header lives in
//! `include/nf_filter.h`.

mod error;
mod handle;
mod types;

pub use error::*;
pub use handle::*;
pub use types::*;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::AssertUnwindSafe;

use nf_filter::{registry, FilterProperties, NfmFilter, OpenOutcome, RegistryError};

/// Execute a closure that returns an `NfStatus`, catching any panics
/// and converting them into `NfStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> NfStatus>(f: F) -> NfStatus {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            tracing::error!("panic caught at the FFI boundary");
            set_last_error("internal panic".to_string());
            NfStatus::ErrorInternal
        }
    }
}

fn registry_status(result: Result<(), RegistryError>) -> NfStatus {
    match result {
        Ok(()) => NfStatus::Ok,
        Err(e) => {
            set_last_error(e.to_string());
            NfStatus::ErrorIllegalState
        }
    }
}

/// Register the NFM framework with the process-wide registry.
///
/// Must be called exactly once before any `nf_filter_open`. A second call
/// without an intervening `nf_filter_module_fini` returns
/// `ErrorIllegalState`.
#[no_mangle]
pub extern "C" fn nf_filter_module_init() -> NfStatus {
    catch_panic(|| registry_status(NfmFilter::register(registry::global())))
}

/// Remove the NFM framework from the process-wide registry.
///
/// Open handles are unaffected. Returns `ErrorIllegalState` if the framework
/// is not registered.
#[no_mangle]
pub extern "C" fn nf_filter_module_fini() -> NfStatus {
    catch_panic(|| registry_status(NfmFilter::unregister(registry::global())))
}

/// Open or reopen a filter.
///
/// If `*handle` is null a new filter is created from the registry and, on
/// success, written to `*handle`. If `*handle` already holds a filter, it is
/// reconfigured: the same model path returns `AlreadyOpen` without reloading,
/// a different one releases the old model and loads the new one. Model files
/// are checked for existence first when the framework asks for it. A failed
/// reopen leaves the handle valid; it must still be closed.
///
/// # Safety
/// `props` must point to valid properties and `handle` to a slot that is
/// null or holds a handle from this function.
#[no_mangle]
pub unsafe extern "C" fn nf_filter_open(
    props: *const NfFilterProperties,
    handle: *mut *mut NfFilter,
) -> NfStatus {
    catch_panic(|| {
        if props.is_null() || handle.is_null() {
            set_last_error("null argument".to_string());
            return NfStatus::ErrorInvalidArgument;
        }
        let props = match unsafe { (*props).to_properties() } {
            Ok(p) => p,
            Err(e) => {
                set_last_error(format!("invalid properties: {e}"));
                return NfStatus::ErrorInvalidArgument;
            }
        };

        let existing = unsafe { *handle };
        if !existing.is_null() {
            let existing = unsafe { &mut *existing };
            return configure(existing, &props);
        }

        let filter = match registry::global().create(&props.framework) {
            Ok(f) => f,
            Err(e) => {
                set_last_error(e.to_string());
                return NfStatus::ErrorIllegalState;
            }
        };
        let mut new = Box::new(NfFilter::new(filter));
        let status = configure(&mut new, &props);
        if status == NfStatus::Ok {
            unsafe { *handle = Box::into_raw(new) };
        }
        status
    })
}

fn configure(handle: &mut NfFilter, props: &FilterProperties) -> NfStatus {
    if handle.filter.info().verify_model_path {
        if let Err(e) = props.verify_model_files() {
            return report(e);
        }
    }
    match handle.filter.configure(props) {
        Ok(OpenOutcome::Opened) => NfStatus::Ok,
        Ok(OpenOutcome::AlreadyOpen) => NfStatus::AlreadyOpen,
        Err(e) => report(e),
    }
}

/// Release a filter and free its handle, setting `*handle` to null.
///
/// A null `handle` or a null `*handle` is a no-op, so closing twice is safe.
///
/// # Safety
/// `handle` must be null or point to a slot filled by `nf_filter_open`.
#[no_mangle]
pub unsafe extern "C" fn nf_filter_close(handle: *mut *mut NfFilter) -> NfStatus {
    catch_panic(|| {
        if handle.is_null() {
            return NfStatus::Ok;
        }
        let filter = unsafe { std::mem::replace(&mut *handle, std::ptr::null_mut()) };
        if !filter.is_null() {
            let mut filter = unsafe { Box::from_raw(filter) };
            filter.filter.release();
            tracing::debug!("filter handle closed");
        }
        NfStatus::Ok
    })
}

/// Run one synchronous inference.
///
/// `inputs` and `outputs` are matched to the model's tensors by position and
/// each buffer must be exactly the tensor's byte size. Nothing is copied and
/// no inference runs unless every buffer checks out.
///
/// # Safety
/// `handle` must come from `nf_filter_open`. `inputs` and `outputs` must point
/// to `n_in` and `n_out` records whose `data` is valid for `size` bytes, and
/// no two output buffers may overlap.
#[no_mangle]
pub unsafe extern "C" fn nf_filter_invoke(
    handle: *mut NfFilter,
    inputs: *const NfTensorMemory,
    n_in: u32,
    outputs: *const NfTensorMemory,
    n_out: u32,
) -> NfStatus {
    catch_panic(|| {
        if handle.is_null()
            || (inputs.is_null() && n_in > 0)
            || (outputs.is_null() && n_out > 0)
        {
            set_last_error("null argument".to_string());
            return NfStatus::ErrorInvalidArgument;
        }
        let handle = unsafe { &mut *handle };
        let inputs = unsafe { records(inputs, n_in) };
        let outputs = unsafe { records(outputs, n_out) };

        if inputs.iter().chain(outputs).any(|m| m.data.is_null() && m.size > 0) {
            set_last_error("null tensor buffer".to_string());
            return NfStatus::ErrorInvalidArgument;
        }
        let input_bufs: Vec<&[u8]> = inputs
            .iter()
            .map(|m| unsafe { bytes(m) })
            .collect();
        let mut output_bufs: Vec<&mut [u8]> = outputs
            .iter()
            .map(|m| unsafe { bytes_mut(m) })
            .collect();

        match handle.filter.invoke(&input_bufs, &mut output_bufs) {
            Ok(()) => NfStatus::Ok,
            Err(e) => report(e),
        }
    })
}

/// Describe the configured model's input and output tensors.
///
/// Either output pointer may be null to skip it. Name pointers in the result
/// are owned by the handle and stay valid until the next call, a reopen, or
/// `nf_filter_close`.
///
/// # Safety
/// `handle` must come from `nf_filter_open`.
#[no_mangle]
pub unsafe extern "C" fn nf_filter_get_model_info(
    handle: *mut NfFilter,
    in_info: *mut NfTensorsInfo,
    out_info: *mut NfTensorsInfo,
) -> NfStatus {
    catch_panic(|| {
        if handle.is_null() {
            set_last_error("null handle".to_string());
            return NfStatus::ErrorInvalidArgument;
        }
        let handle = unsafe { &mut *handle };
        let in_info = unsafe { in_info.as_mut() };
        let out_info = unsafe { out_info.as_mut() };
        match handle.model_info(in_info, out_info) {
            Ok(()) => NfStatus::Ok,
            Err(e) => report(e),
        }
    })
}

/// Negotiate a new input schema. The NFM framework has fixed model shapes, so
/// this always returns `ErrorNotSupported` and leaves `out_info` untouched.
///
/// # Safety
/// `handle` must come from `nf_filter_open`; `in_info` must be valid.
#[no_mangle]
pub unsafe extern "C" fn nf_filter_set_input_info(
    handle: *mut NfFilter,
    in_info: *const NfTensorsInfo,
    _out_info: *mut NfTensorsInfo,
) -> NfStatus {
    catch_panic(|| {
        if handle.is_null() || in_info.is_null() {
            set_last_error("null argument".to_string());
            return NfStatus::ErrorInvalidArgument;
        }
        let handle = unsafe { &mut *handle };
        let requested = match unsafe { (*in_info).to_tensors_info() } {
            Ok(info) => info,
            Err(e) => {
                set_last_error(format!("invalid tensor info: {e}"));
                return NfStatus::ErrorInvalidArgument;
            }
        };
        match handle.filter.set_input_info(&requested) {
            Ok(_) => NfStatus::Ok,
            Err(e) => report(e),
        }
    })
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `nf_free_string`.
#[no_mangle]
pub extern "C" fn nf_last_error() -> *mut c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null_mut(),
    }
}

/// Free a string previously returned by `nf_last_error`.
///
/// # Safety
/// `s` must be null or a pointer returned by `nf_last_error`.
#[no_mangle]
pub unsafe extern "C" fn nf_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

unsafe fn records<'a>(ptr: *const NfTensorMemory, n: u32) -> &'a [NfTensorMemory] {
    if n == 0 {
        return &[];
    }
    std::slice::from_raw_parts(ptr, n as usize)
}

unsafe fn bytes<'a>(m: &NfTensorMemory) -> &'a [u8] {
    if m.size == 0 {
        return &[];
    }
    std::slice::from_raw_parts(m.data as *const u8, m.size)
}

unsafe fn bytes_mut<'a>(m: &NfTensorMemory) -> &'a mut [u8] {
    if m.size == 0 {
        return &mut [];
    }
    std::slice::from_raw_parts_mut(m.data as *mut u8, m.size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr;

    use nf_engine::nfm::{ModelWriter, OpSpec};
    use nf_engine::ElementType;
    use serial_test::serial;

    fn declared(n: u32) -> NfTensorsInfo {
        let mut info = NfTensorsInfo::EMPTY;
        info.num_tensors = n;
        for slot in &mut info.info[..n as usize] {
            slot.ty = 5; // uint8
            slot.rank = 1;
            slot.dims[0] = 1;
        }
        info
    }

    fn props(path: &CStr, n_in: u32, n_out: u32) -> NfFilterProperties {
        NfFilterProperties {
            framework: ptr::null(),
            model_path: path.as_ptr(),
            input_info: declared(n_in),
            output_info: declared(n_out),
        }
    }

    fn identity_model(dir: &std::path::Path, len: u64) -> CString {
        let path = dir.join(format!("id{len}.nfm"));
        ModelWriter::new()
            .input("in", ElementType::U8, &[1, len])
            .output("out", ElementType::U8, &[1, len], OpSpec::identity("in"))
            .write(&path)
            .unwrap();
        CString::new(path.to_str().unwrap()).unwrap()
    }

    fn last_error() -> String {
        let ptr = nf_last_error();
        assert!(!ptr.is_null());
        let msg = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        unsafe { nf_free_string(ptr) };
        msg
    }

    /// Leave the module registered regardless of what earlier tests did.
    fn ensure_init() {
        let _ = nf_filter_module_fini();
        assert_eq!(nf_filter_module_init(), NfStatus::Ok);
    }

    fn memory(buf: &mut [u8]) -> NfTensorMemory {
        NfTensorMemory {
            data: buf.as_mut_ptr().cast(),
            size: buf.len(),
        }
    }

    #[test]
    #[serial]
    fn test_module_init_fini() {
        let _ = nf_filter_module_fini();
        assert_eq!(nf_filter_module_init(), NfStatus::Ok);
        assert_eq!(nf_filter_module_init(), NfStatus::ErrorIllegalState);
        assert!(last_error().contains("already registered"));
        assert_eq!(nf_filter_module_fini(), NfStatus::Ok);
        assert_eq!(nf_filter_module_fini(), NfStatus::ErrorIllegalState);
    }

    #[test]
    #[serial]
    fn test_open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let model = identity_model(dir.path(), 4);
        let _ = nf_filter_module_fini();

        let mut handle: *mut NfFilter = ptr::null_mut();
        let status = unsafe { nf_filter_open(&props(&model, 1, 1), &mut handle) };
        assert_eq!(status, NfStatus::ErrorIllegalState);
        assert!(handle.is_null());
    }

    #[test]
    #[serial]
    fn test_open_invoke_close() {
        ensure_init();
        let dir = tempfile::tempdir().unwrap();
        let model = identity_model(dir.path(), 8);

        let mut handle: *mut NfFilter = ptr::null_mut();
        let status = unsafe { nf_filter_open(&props(&model, 1, 1), &mut handle) };
        assert_eq!(status, NfStatus::Ok);
        assert!(!handle.is_null());

        let mut in_info = NfTensorsInfo::EMPTY;
        let mut out_info = NfTensorsInfo::EMPTY;
        let status = unsafe { nf_filter_get_model_info(handle, &mut in_info, &mut out_info) };
        assert_eq!(status, NfStatus::Ok);
        assert_eq!(in_info.num_tensors, 1);
        assert_eq!(in_info.info[0].ty, 5);
        assert_eq!(in_info.info[0].rank, 2);
        assert_eq!(&in_info.info[0].dims[..3], &[1, 8, 0]);
        let name = unsafe { CStr::from_ptr(out_info.info[0].name) };
        assert_eq!(name.to_str().unwrap(), "out");

        let mut input: Vec<u8> = (10..18).collect();
        let mut output = vec![0u8; 8];
        let inputs = [memory(&mut input)];
        let outputs = [memory(&mut output)];
        let status =
            unsafe { nf_filter_invoke(handle, inputs.as_ptr(), 1, outputs.as_ptr(), 1) };
        assert_eq!(status, NfStatus::Ok);
        assert_eq!(output, input);

        assert_eq!(unsafe { nf_filter_close(&mut handle) }, NfStatus::Ok);
        assert!(handle.is_null());
        assert_eq!(unsafe { nf_filter_close(&mut handle) }, NfStatus::Ok);
        assert_eq!(unsafe { nf_filter_close(ptr::null_mut()) }, NfStatus::Ok);
    }

    #[test]
    #[serial]
    fn test_size_mismatch_reports_tensor() {
        ensure_init();
        let dir = tempfile::tempdir().unwrap();
        let model = identity_model(dir.path(), 8);
        let mut handle: *mut NfFilter = ptr::null_mut();
        unsafe { nf_filter_open(&props(&model, 1, 1), &mut handle) };

        let mut input = vec![0u8; 6];
        let mut output = vec![0u8; 8];
        let inputs = [memory(&mut input)];
        let outputs = [memory(&mut output)];
        let status =
            unsafe { nf_filter_invoke(handle, inputs.as_ptr(), 1, outputs.as_ptr(), 1) };
        assert_eq!(status, NfStatus::ErrorSize);
        assert_eq!(
            last_error(),
            "input tensor 'in': buffer holds 6 bytes, model expects 8"
        );

        let status = unsafe { nf_filter_invoke(handle, inputs.as_ptr(), 1, ptr::null(), 0) };
        assert_eq!(status, NfStatus::ErrorSize);

        unsafe { nf_filter_close(&mut handle) };
    }

    #[test]
    #[serial]
    fn test_reopen() {
        ensure_init();
        let dir = tempfile::tempdir().unwrap();
        let small = identity_model(dir.path(), 4);
        let large = identity_model(dir.path(), 12);

        let mut handle: *mut NfFilter = ptr::null_mut();
        assert_eq!(
            unsafe { nf_filter_open(&props(&small, 1, 1), &mut handle) },
            NfStatus::Ok
        );
        let first = handle;
        assert_eq!(
            unsafe { nf_filter_open(&props(&small, 1, 1), &mut handle) },
            NfStatus::AlreadyOpen
        );
        assert_eq!(
            unsafe { nf_filter_open(&props(&large, 1, 1), &mut handle) },
            NfStatus::Ok
        );
        assert_eq!(handle, first);

        let mut in_info = NfTensorsInfo::EMPTY;
        unsafe { nf_filter_get_model_info(handle, &mut in_info, ptr::null_mut()) };
        assert_eq!(in_info.info[0].dims[1], 12);

        unsafe { nf_filter_close(&mut handle) };
    }

    #[test]
    #[serial]
    fn test_schema_mismatch() {
        ensure_init();
        let dir = tempfile::tempdir().unwrap();
        let model = identity_model(dir.path(), 4);

        let mut handle: *mut NfFilter = ptr::null_mut();
        let status = unsafe { nf_filter_open(&props(&model, 2, 1), &mut handle) };
        assert_eq!(status, NfStatus::ErrorSchema);
        assert!(handle.is_null());
        assert!(last_error().contains("input tensor count mismatch"));
    }

    #[test]
    #[serial]
    fn test_missing_model() {
        ensure_init();
        let path = CString::new("/nonexistent/model.nfm").unwrap();
        let mut handle: *mut NfFilter = ptr::null_mut();
        let status = unsafe { nf_filter_open(&props(&path, 1, 1), &mut handle) };
        assert_eq!(status, NfStatus::ErrorModelLoad);
        assert!(handle.is_null());
    }

    #[test]
    #[serial]
    fn test_set_input_info_not_supported() {
        ensure_init();
        let dir = tempfile::tempdir().unwrap();
        let model = identity_model(dir.path(), 4);
        let mut handle: *mut NfFilter = ptr::null_mut();
        unsafe { nf_filter_open(&props(&model, 1, 1), &mut handle) };

        let requested = declared(1);
        let mut out = NfTensorsInfo::EMPTY;
        let status = unsafe { nf_filter_set_input_info(handle, &requested, &mut out) };
        assert_eq!(status, NfStatus::ErrorNotSupported);
        assert_eq!(out.num_tensors, 0);

        unsafe { nf_filter_close(&mut handle) };
    }

    #[test]
    fn test_null_arguments() {
        let status = unsafe { nf_filter_invoke(ptr::null_mut(), ptr::null(), 0, ptr::null(), 0) };
        assert_eq!(status, NfStatus::ErrorInvalidArgument);
        let status = unsafe {
            nf_filter_get_model_info(ptr::null_mut(), ptr::null_mut(), ptr::null_mut())
        };
        assert_eq!(status, NfStatus::ErrorInvalidArgument);
        let mut handle: *mut NfFilter = ptr::null_mut();
        let status = unsafe { nf_filter_open(ptr::null(), &mut handle) };
        assert_eq!(status, NfStatus::ErrorInvalidArgument);
    }

    #[test]
    fn test_invalid_tensor_type() {
        let mut info = declared(1);
        info.info[0].ty = 42;
        assert!(unsafe { info.to_tensors_info() }.is_err());
        info.num_tensors = 17;
        assert!(unsafe { info.to_tensors_info() }.is_err());

        let mut info = declared(1);
        info.info[0].rank = 17;
        let err = unsafe { info.to_tensors_info() }.unwrap_err();
        assert!(err.contains("rank 17"));
        info.info[0].rank = 16;
        let parsed = unsafe { info.to_tensors_info() }.unwrap();
        assert_eq!(parsed.get(0).unwrap().dims.dims(), &[1]);

        let path = CString::new("/nonexistent/model.nfm").unwrap();
        let mut deep = props(&path, 1, 1);
        deep.input_info.info[0].rank = 20;
        let mut handle: *mut NfFilter = ptr::null_mut();
        let status = unsafe { nf_filter_open(&deep, &mut handle) };
        assert_eq!(status, NfStatus::ErrorInvalidArgument);
        assert!(handle.is_null());
        assert!(last_error().contains("rank 20"));
    }

    #[test]
    fn test_status_mapping() {
        use nf_filter::{Direction, FilterError};
        assert_eq!(status_of(&FilterError::NoModel), NfStatus::ErrorModelLoad);
        assert_eq!(
            status_of(&FilterError::IllegalState("x")),
            NfStatus::ErrorIllegalState
        );
        assert_eq!(
            status_of(&FilterError::BufferCount {
                direction: Direction::Input,
                expected: 1,
                got: 0,
            }),
            NfStatus::ErrorSize
        );
        assert_eq!(
            status_of(&FilterError::NotSupported("x")),
            NfStatus::ErrorNotSupported
        );
    }
}
