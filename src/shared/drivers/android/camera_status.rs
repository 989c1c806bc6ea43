// This is free and unencumbered software released into the public domain.

use crate::shared::CameraError;
use derive_more::Display;
use ndk_sys::camera_status_t;

pub type CameraResult<T = ()> = core::result::Result<T, CameraStatus>;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display("camera status {}", _0.0)]
pub struct CameraStatus(pub(crate) camera_status_t);

impl core::error::Error for CameraStatus {}

impl Default for CameraStatus {
    fn default() -> Self {
        CameraStatus(camera_status_t::ACAMERA_OK)
    }
}

impl From<camera_status_t> for CameraStatus {
    fn from(input: camera_status_t) -> Self {
        Self(input)
    }
}

impl From<CameraStatus> for CameraError {
    fn from(status: CameraStatus) -> Self {
        let reason = match status.0 {
            camera_status_t::ACAMERA_ERROR_PERMISSION_DENIED => "camera permission denied",
            camera_status_t::ACAMERA_ERROR_CAMERA_IN_USE
            | camera_status_t::ACAMERA_ERROR_MAX_CAMERA_IN_USE => {
                "camera is in use by another client"
            },
            camera_status_t::ACAMERA_ERROR_CAMERA_DISABLED => "camera disabled by policy",
            camera_status_t::ACAMERA_ERROR_CAMERA_DISCONNECTED => "camera disconnected",
            _ => "camera device error",
        };
        CameraError::unavailable_with(reason, status)
    }
}
