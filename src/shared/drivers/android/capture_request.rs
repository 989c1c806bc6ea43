// This is free and unencumbered software released into the public domain.

use super::{AndroidCameraDevice, CameraOutputTarget, CameraResult};
use core::ptr::null_mut;
use ndk_sys::{
    ACameraDevice_createCaptureRequest, ACameraDevice_request_template, ACaptureRequest,
    ACaptureRequest_addTarget, ACaptureRequest_free, ACaptureRequest_setEntry_float,
    ACaptureRequest_setEntry_i32, ACaptureRequest_setEntry_i64, ACaptureRequest_setEntry_u8,
    acamera_metadata_tag, camera_status_t,
};

#[derive(Debug)]
pub struct AndroidCaptureRequest {
    pub(crate) handle: *mut ACaptureRequest,
}

impl Drop for AndroidCaptureRequest {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACaptureRequest_free(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl AndroidCaptureRequest {
    /// A request built from the device's still-capture template.
    pub fn still(device: &AndroidCameraDevice) -> CameraResult<Self> {
        let mut handle = null_mut();
        let status = unsafe {
            ACameraDevice_createCaptureRequest(
                device.handle,
                ACameraDevice_request_template::TEMPLATE_STILL_CAPTURE,
                &mut handle,
            )
        };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }
        Ok(Self { handle })
    }

    pub fn add_target(&mut self, target: &CameraOutputTarget) -> CameraResult {
        let status = unsafe { ACaptureRequest_addTarget(self.handle, target.handle) };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }
        Ok(())
    }

    pub fn set_u8(&mut self, tag: acamera_metadata_tag, value: u8) -> CameraResult {
        check(unsafe { ACaptureRequest_setEntry_u8(self.handle, tag.0 as u32, 1, &value) })
    }

    pub fn set_i32(&mut self, tag: acamera_metadata_tag, value: i32) -> CameraResult {
        check(unsafe { ACaptureRequest_setEntry_i32(self.handle, tag.0 as u32, 1, &value) })
    }

    pub fn set_i64(&mut self, tag: acamera_metadata_tag, value: i64) -> CameraResult {
        check(unsafe { ACaptureRequest_setEntry_i64(self.handle, tag.0 as u32, 1, &value) })
    }

    pub fn set_f32(&mut self, tag: acamera_metadata_tag, value: f32) -> CameraResult {
        check(unsafe { ACaptureRequest_setEntry_float(self.handle, tag.0 as u32, 1, &value) })
    }
}

fn check(status: camera_status_t) -> CameraResult {
    if status != camera_status_t::ACAMERA_OK {
        return Err(status.into());
    }
    Ok(())
}
