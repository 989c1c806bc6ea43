// This is free and unencumbered software released into the public domain.

use super::{CameraResult, CaptureSessionOutput};
use core::ptr::null_mut;
use ndk_sys::{
    ACaptureSessionOutputContainer, ACaptureSessionOutputContainer_add,
    ACaptureSessionOutputContainer_create, ACaptureSessionOutputContainer_free, camera_status_t,
};

#[derive(Debug)]
pub struct CaptureSessionOutputContainer {
    pub(crate) handle: *mut ACaptureSessionOutputContainer,
}

impl Drop for CaptureSessionOutputContainer {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACaptureSessionOutputContainer_free(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl CaptureSessionOutputContainer {
    pub fn new() -> CameraResult<Self> {
        // See: https://developer.android.com/ndk/reference/group/camera#acapturesessionoutputcontainer_create
        let mut handle = null_mut();
        let status = unsafe { ACaptureSessionOutputContainer_create(&mut handle) };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }
        Ok(Self { handle })
    }

    pub fn add(&mut self, output: &CaptureSessionOutput) -> CameraResult {
        let status = unsafe { ACaptureSessionOutputContainer_add(self.handle, output.handle) };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }
        Ok(())
    }
}
