// This is free and unencumbered software released into the public domain.

use super::{AndroidNativeWindow, CameraResult};
use core::ptr::null_mut;
use ndk_sys::{
    ACameraOutputTarget, ACameraOutputTarget_create, ACameraOutputTarget_free, camera_status_t,
};

#[derive(Debug)]
pub struct CameraOutputTarget {
    pub(crate) handle: *mut ACameraOutputTarget,
}

impl Drop for CameraOutputTarget {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACameraOutputTarget_free(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl CameraOutputTarget {
    pub fn new(window: &AndroidNativeWindow) -> CameraResult<Self> {
        // See: https://developer.android.com/ndk/reference/group/camera#acameraoutputtarget_create
        let mut handle = null_mut();
        let status = unsafe { ACameraOutputTarget_create(window.handle, &mut handle) };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }
        Ok(Self { handle })
    }
}
