// This is free and unencumbered software released into the public domain.

use super::{AndroidNativeWindow, CameraResult};
use core::ptr::null_mut;
use ndk_sys::{
    ACaptureSessionOutput, ACaptureSessionOutput_create, ACaptureSessionOutput_free,
    camera_status_t,
};

#[derive(Debug)]
pub struct CaptureSessionOutput {
    pub(crate) handle: *mut ACaptureSessionOutput,
}

impl Drop for CaptureSessionOutput {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACaptureSessionOutput_free(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl CaptureSessionOutput {
    pub fn new(window: &AndroidNativeWindow) -> CameraResult<Self> {
        // See: https://developer.android.com/ndk/reference/group/camera#acapturesessionoutput_create
        let mut handle = null_mut();
        let status = unsafe { ACaptureSessionOutput_create(window.handle, &mut handle) };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }
        Ok(Self { handle })
    }
}
