// This is free and unencumbered software released into the public domain.

use super::{AndroidCameraDevice, AndroidCaptureRequest, CameraResult, CaptureSessionOutputContainer};
use core::{ffi::c_void, ptr::null_mut};
use ndk_sys::{
    ACameraCaptureSession, ACameraCaptureSession_capture, ACameraCaptureSession_close,
    ACameraCaptureSession_stateCallbacks, ACameraDevice_createCaptureSession, camera_status_t,
};

#[derive(Debug)]
pub struct AndroidCaptureSession {
    handle: *mut ACameraCaptureSession,
    state_callbacks: Box<ACameraCaptureSession_stateCallbacks>,
}

impl Drop for AndroidCaptureSession {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACameraCaptureSession_close(self.handle) };
            self.handle = null_mut();
        }
    }
}

unsafe extern "C" fn on_ready(_context: *mut c_void, session: *mut ACameraCaptureSession) {
    tracing::trace!(?session, "capture session ready");
}

unsafe extern "C" fn on_active(_context: *mut c_void, session: *mut ACameraCaptureSession) {
    tracing::trace!(?session, "capture session active");
}

unsafe extern "C" fn on_closed(_context: *mut c_void, session: *mut ACameraCaptureSession) {
    tracing::trace!(?session, "capture session closed");
}

impl AndroidCaptureSession {
    pub fn open(
        device: &AndroidCameraDevice,
        outputs: &CaptureSessionOutputContainer,
    ) -> CameraResult<Self> {
        let mut result = Self {
            handle: null_mut(),
            state_callbacks: Box::new(ACameraCaptureSession_stateCallbacks {
                context: null_mut(),
                onClosed: Some(on_closed),
                onReady: Some(on_ready),
                onActive: Some(on_active),
            }),
        };
        let status = unsafe {
            ACameraDevice_createCaptureSession(
                device.handle,
                outputs.handle,
                &*result.state_callbacks,
                &mut result.handle,
            )
        };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }
        Ok(result)
    }

    /// Submits one request. Completion is observed through the request's
    /// output target.
    pub fn capture(&mut self, request: &AndroidCaptureRequest) -> CameraResult {
        let mut requests = request.handle;
        let status = unsafe {
            ACameraCaptureSession_capture(self.handle, null_mut(), 1, &mut requests, null_mut())
        };
        if status != camera_status_t::ACAMERA_OK {
            return Err(status.into());
        }
        Ok(())
    }
}
