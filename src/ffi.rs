// This is free and unencumbered software released into the public domain.

// C ABI for hosting the plugin from Swift/Kotlin/C.
// Calls travel as JSON envelopes; results come back as JSON strings.

use crate::shared::{Bridge, CameraBackend, NativeCamera, PluginConfig, Request, open_driver};
use core::ffi::c_char;
use serde_json::Value;
use std::ffi::{CStr, CString};

/// Status codes returned by the FFI API.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Camera2Status {
    /// The call resolved.
    Ok = 0,
    /// Invalid arguments passed via the FFI boundary.
    InvalidArgument = 1,
    /// The call was rejected; the response carries the error.
    Rejected = 2,
    /// The requested camera backend could not be opened.
    NoDriver = 3,
}

/// Opaque handle owned by the host between `camera2_open` and `camera2_free`.
pub struct Camera2Handle {
    bridge: Bridge,
}

const PLUGIN_NAME_C: &CStr = c"Camera2";

/// Convert an optional C string into a Rust string.
///
/// - `NULL` and `""` are both `None`.
/// - Returns `InvalidArgument` if the C string is not valid UTF-8.
fn optional_str(s: *const c_char) -> Result<Option<String>, Camera2Status> {
    if s.is_null() {
        return Ok(None);
    }
    let s = unsafe { CStr::from_ptr(s) }
        .to_str()
        .map_err(|_| Camera2Status::InvalidArgument)?;
    Ok((!s.is_empty()).then(|| s.to_owned()))
}

fn open_bridge(
    backend: Option<String>,
    storage_root: Option<String>,
) -> Result<Bridge, Camera2Status> {
    let mut config = PluginConfig::from_env().map_err(|_| Camera2Status::InvalidArgument)?;
    if let Some(root) = storage_root {
        config = config.with_storage_root(root);
    }
    let Some(backend) = backend else {
        return Ok(Bridge::open(&config));
    };

    let backend: CameraBackend = backend
        .parse()
        .map_err(|_| Camera2Status::InvalidArgument)?;
    config = config.with_backend(backend);
    let driver = open_driver(&config).map_err(|err| {
        tracing::warn!(%err, %backend, "requested camera backend unavailable");
        Camera2Status::NoDriver
    })?;
    Ok(Bridge::new(Box::new(NativeCamera::new(config, driver))))
}

/// Open the plugin and create a handle.
///
/// Parameters:
/// - `backend`: `"android"`, `"ffmpeg"` or `"synthetic"`; NULL or "" selects
///   the platform default and falls back when no camera driver exists.
/// - `storage_root`: directory relative picture paths resolve against; may be NULL.
/// - `out_handle`: [out] receives the handle.
///
/// An explicit backend that cannot be opened returns `NoDriver`.
#[unsafe(no_mangle)]
pub extern "C" fn camera2_open(
    backend: *const c_char,
    storage_root: *const c_char,
    out_handle: *mut *mut Camera2Handle,
) -> Camera2Status {
    if out_handle.is_null() {
        return Camera2Status::InvalidArgument;
    }

    let result = optional_str(backend).and_then(|backend| {
        let storage_root = optional_str(storage_root)?;
        open_bridge(backend, storage_root)
    });

    match result {
        Ok(bridge) => {
            let handle = Box::new(Camera2Handle { bridge });
            unsafe {
                *out_handle = Box::into_raw(handle);
            }
            Camera2Status::Ok
        },
        Err(status) => status,
    }
}

/// Invoke one method and wait for its result.
///
/// `options_json` is a JSON object or NULL. On `Ok` and `Rejected`,
/// `out_json` receives the response envelope, which the host releases with
/// [`camera2_string_free`].
#[unsafe(no_mangle)]
pub extern "C" fn camera2_invoke(
    handle: *mut Camera2Handle,
    method: *const c_char,
    options_json: *const c_char,
    out_json: *mut *mut c_char,
) -> Camera2Status {
    if handle.is_null() || method.is_null() || out_json.is_null() {
        return Camera2Status::InvalidArgument;
    }

    let method = match optional_str(method) {
        Ok(Some(method)) => method,
        Ok(None) | Err(_) => return Camera2Status::InvalidArgument,
    };
    let options = match optional_str(options_json) {
        Ok(Some(json)) => match serde_json::from_str::<Value>(&json) {
            Ok(options) => options,
            Err(_) => return Camera2Status::InvalidArgument,
        },
        Ok(None) => Value::Null,
        Err(status) => return status,
    };

    let handle = unsafe { &*handle };
    let response = handle.bridge.handle(Request::new(method, options));
    let status = if response.is_resolved() {
        Camera2Status::Ok
    } else {
        Camera2Status::Rejected
    };

    let Ok(json) = serde_json::to_string(&response) else {
        return Camera2Status::InvalidArgument;
    };
    let Ok(json) = CString::new(json) else {
        return Camera2Status::InvalidArgument;
    };
    unsafe {
        *out_json = json.into_raw();
    }
    status
}

/// Release a string returned by [`camera2_invoke`].
#[unsafe(no_mangle)]
pub extern "C" fn camera2_string_free(s: *mut c_char) {
    if s.is_null() {
        return;
    }

    unsafe {
        drop(CString::from_raw(s));
    }
}

/// Free the handle. Calls already queued finish first; an active session
/// is stopped.
#[unsafe(no_mangle)]
pub extern "C" fn camera2_free(handle: *mut Camera2Handle) {
    if handle.is_null() {
        return;
    }

    unsafe {
        drop(Box::from_raw(handle));
    }
}

/// The plugin identifier as a static NUL-terminated string.
#[unsafe(no_mangle)]
pub extern "C" fn camera2_plugin_name() -> *const c_char {
    PLUGIN_NAME_C.as_ptr()
}
