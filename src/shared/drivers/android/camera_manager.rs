// This is free and unencumbered software released into the public domain.

use super::{AndroidCameraDevice, CameraMetadata, CameraResult};
use core::{ffi::CStr, ptr::null_mut};
use ndk_sys::{
    ACameraManager, ACameraManager_create, ACameraManager_delete,
    ACameraManager_deleteCameraIdList, ACameraManager_getCameraCharacteristics,
    ACameraManager_getCameraIdList, ACameraManager_openCamera, camera_status_t,
};
use scopeguard::defer;
use std::ffi::CString;

#[derive(Debug)]
pub struct CameraManager {
    pub(crate) handle: *mut ACameraManager,
}

// The NDK camera manager may be used from any thread.
unsafe impl Send for CameraManager {}

impl Drop for CameraManager {
    fn drop(&mut self) {
        unsafe {
            ACameraManager_delete(self.handle);
        }
        self.handle = null_mut();
    }
}

impl CameraManager {
    pub fn new() -> Self {
        Self {
            handle: unsafe { ACameraManager_create() },
        }
    }

    pub fn get_camera_ids(&self) -> CameraResult<Vec<String>> {
        let mut list_ptr = null_mut();
        let status = unsafe { ACameraManager_getCameraIdList(self.handle, &mut list_ptr) };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }

        defer! {
            unsafe { ACameraManager_deleteCameraIdList(list_ptr); }
        }

        let list = unsafe { &*list_ptr };
        if list.numCameras < 1 {
            return Ok(Vec::new());
        }

        let ids = unsafe { core::slice::from_raw_parts(list.cameraIds, list.numCameras as usize) };

        Ok(ids
            .iter()
            .map(|p| unsafe { CStr::from_ptr(*p) }.to_string_lossy().into_owned())
            .collect())
    }

    pub fn open_camera(&self, id: &str) -> CameraResult<AndroidCameraDevice> {
        // Camera ids never contain NUL; an id that does cannot be opened.
        let device_id = CString::new(id)
            .map_err(|_| camera_status_t::ACAMERA_ERROR_INVALID_PARAMETER)?;

        let mut device = AndroidCameraDevice::new(device_id);
        let status = unsafe {
            ACameraManager_openCamera(
                self.handle,
                device.device_id.as_ptr(),
                &mut *device.state_callbacks,
                &mut device.handle,
            )
        };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }

        Ok(device)
    }

    pub fn characteristics(&self, id: &str) -> CameraResult<CameraMetadata> {
        let device_id = CString::new(id)
            .map_err(|_| camera_status_t::ACAMERA_ERROR_INVALID_PARAMETER)?;

        let mut metadata = CameraMetadata { handle: null_mut() };
        let status = unsafe {
            ACameraManager_getCameraCharacteristics(
                self.handle,
                device_id.as_ptr(),
                &mut metadata.handle,
            )
        };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }

        Ok(metadata)
    }
}
