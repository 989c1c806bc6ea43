// This is free and unencumbered software released into the public domain.

use super::{
    AIMAGE_FORMAT_JPEG, AndroidCameraDevice, AndroidCaptureRequest, AndroidCaptureSession,
    AndroidImage, AndroidImageReader, AndroidNativeWindow, CameraOutputTarget,
    CaptureSessionOutput, CaptureSessionOutputContainer,
};
use crate::shared::CameraError;
use std::{
    io,
    thread,
    time::{Duration, Instant},
};

const IMAGE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A capture session whose only output is a JPEG image reader.
///
/// Fields drop in declaration order, which closes the session before the
/// outputs and the reader it renders into are released.
#[derive(Debug)]
pub struct StillCapture {
    session: AndroidCaptureSession,
    _container: CaptureSessionOutputContainer,
    _output: CaptureSessionOutput,
    target: CameraOutputTarget,
    _window: AndroidNativeWindow,
    reader: AndroidImageReader,
}

// The NDK camera objects may be used from any thread.
unsafe impl Send for StillCapture {}

impl StillCapture {
    pub fn open(device: &AndroidCameraDevice, size: (u32, u32)) -> Result<Self, CameraError> {
        let reader = AndroidImageReader::new(size, AIMAGE_FORMAT_JPEG)
            .map_err(|e| CameraError::unavailable_with("cannot create image reader", e))?;
        let window = reader
            .get_window()
            .map_err(|e| CameraError::unavailable_with("cannot create image reader", e))?;
        let target = CameraOutputTarget::new(&window)?;
        let output = CaptureSessionOutput::new(&window)?;
        let mut container = CaptureSessionOutputContainer::new()?;
        container.add(&output)?;
        let session = AndroidCaptureSession::open(device, &container)?;
        Ok(Self {
            session,
            _container: container,
            _output: output,
            target,
            _window: window,
            reader,
        })
    }

    /// Submits `request` aimed at the reader and waits for its image.
    pub fn capture(
        &mut self,
        mut request: AndroidCaptureRequest,
        timeout: Duration,
    ) -> Result<AndroidImage, CameraError> {
        // Drop anything left over from an earlier request.
        drop(self.reader.acquire_latest_image()?);

        request
            .add_target(&self.target)
            .map_err(|e| CameraError::capture("preparing capture request", e))?;
        self.session
            .capture(&request)
            .map_err(|e| CameraError::capture("submitting capture request", e))?;

        let started = Instant::now();
        loop {
            if let Some(image) = self.reader.acquire_next_image()? {
                return Ok(image);
            }
            if started.elapsed() >= timeout {
                return Err(CameraError::capture(
                    "waiting for the captured image",
                    io::Error::new(io::ErrorKind::TimedOut, format!("no image after {timeout:?}")),
                ));
            }
            thread::sleep(IMAGE_POLL_INTERVAL);
        }
    }
}
