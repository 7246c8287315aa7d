use std::cell::RefCell;
use std::ffi::CString;

use nf_filter::FilterError;

use crate::types::NfStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store an error message for later retrieval via `nf_last_error`.
pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Status code a filter error is reported as.
pub fn status_of(err: &FilterError) -> NfStatus {
    match err {
        FilterError::NoModel
        | FilterError::ModelNotFound(_)
        | FilterError::Load { .. }
        | FilterError::Config(_) => NfStatus::ErrorModelLoad,
        FilterError::SchemaMismatch { .. }
        | FilterError::UnsupportedType { .. }
        | FilterError::RankLimitExceeded { .. }
        | FilterError::DimensionOverflow { .. }
        | FilterError::TooManyTensors { .. } => NfStatus::ErrorSchema,
        FilterError::BufferCount { .. } | FilterError::SizeMismatch { .. } => NfStatus::ErrorSize,
        FilterError::IllegalState(_) => NfStatus::ErrorIllegalState,
        FilterError::NotSupported(_) => NfStatus::ErrorNotSupported,
        FilterError::Engine(_) => NfStatus::ErrorInternal,
    }
}

/// Record `err` as the last error and return its status.
pub fn report(err: FilterError) -> NfStatus {
    let status = status_of(&err);
    set_last_error(err.to_string());
    status
}
