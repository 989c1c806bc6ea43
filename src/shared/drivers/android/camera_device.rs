// This is free and unencumbered software released into the public domain.

use core::{
    ffi::{c_int, c_void},
    ptr::null_mut,
};
use ndk_sys::{ACameraDevice, ACameraDevice_StateCallbacks, ACameraDevice_close};
use std::ffi::CString;

#[derive(Debug)]
pub struct AndroidCameraDevice {
    pub(crate) device_id: CString,
    pub(crate) handle: *mut ACameraDevice,
    pub(crate) state_callbacks: Box<ACameraDevice_StateCallbacks>,
}

unsafe impl Send for AndroidCameraDevice {}

impl Drop for AndroidCameraDevice {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe {
                ACameraDevice_close(self.handle);
            }
            self.handle = null_mut();
        }
    }
}

unsafe extern "C" fn on_disconnected(_context: *mut c_void, device: *mut ACameraDevice) {
    tracing::warn!(?device, "camera device disconnected");
}

unsafe extern "C" fn on_error(_context: *mut c_void, device: *mut ACameraDevice, error: c_int) {
    tracing::warn!(?device, error, "camera device error");
}

impl AndroidCameraDevice {
    pub(crate) fn new(device_id: CString) -> Self {
        Self {
            device_id,
            handle: null_mut(),
            state_callbacks: Box::new(ACameraDevice_StateCallbacks {
                context: null_mut(),
                onDisconnected: Some(on_disconnected),
                onError: Some(on_error),
            }),
        }
    }
}
