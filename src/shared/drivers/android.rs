// This is free and unencumbered software released into the public domain.

//! NDK Camera2 driver. Reads device ranges from the camera characteristics
//! and captures stills through a JPEG `AImageReader` session.

mod android_image;
pub use android_image::*;

mod camera_capture_session;
pub use camera_capture_session::*;

mod camera_device;
pub use camera_device::*;

mod camera_manager;
pub use camera_manager::*;

mod camera_metadata;
pub use camera_metadata::*;

mod camera_output_target;
pub use camera_output_target::*;

mod camera_status;
pub use camera_status::*;

mod capture_request;
pub use capture_request::*;

mod capture_session_output;
pub use capture_session_output::*;

mod capture_session_output_container;
pub use capture_session_output_container::*;

mod characteristics;
pub use characteristics::*;

mod image_reader;
pub use image_reader::*;

mod media_status;
pub use media_status::*;

mod native_window;
pub use native_window::*;

mod still_capture;
pub use still_capture::*;

use crate::shared::{
    CameraBackend, CameraConfiguration, CameraDriver, CameraError, ExifData, Frame, Parameter,
    ParameterRange, PluginConfig, ViewFinder, imaging,
};
use bytes::Bytes;
use image::ImageFormat;
use ndk_sys::{acamera_metadata_tag as tag, android_get_device_api_level};
use std::{any::Any, borrow::Cow, collections::HashMap, time::Duration};

#[link(name = "camera2ndk")]
unsafe extern "C" {}

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(5);

// ACAMERA_CONTROL_AE_MODE values.
const AE_MODE_OFF: u8 = 0;
const AE_MODE_ON: u8 = 1;

#[derive(Debug)]
pub struct AndroidCameraDriver {
    config: PluginConfig,
    manager: CameraManager,
    // Declared before `device` so the session closes first.
    still: Option<StillCapture>,
    device: Option<AndroidCameraDevice>,
    characteristics: Characteristics,
    lock_orientation: bool,
    view_finder: Option<ViewFinder>,
    settings: HashMap<Parameter, f64>,
}

impl AndroidCameraDriver {
    pub fn new(config: PluginConfig) -> Result<Self, CameraError> {
        let api_level = unsafe { android_get_device_api_level() };
        tracing::debug!(api_level, "android camera driver");
        Ok(Self {
            config,
            manager: CameraManager::new(),
            still: None,
            device: None,
            characteristics: Characteristics::default(),
            lock_orientation: false,
            view_finder: None,
            settings: HashMap::new(),
        })
    }

    fn select_camera(&self) -> Result<String, CameraError> {
        let ids = self.manager.get_camera_ids()?;
        tracing::debug!(cameras = ?ids, "camera ids");
        match self.config.device.as_deref() {
            Some(wanted) => ids
                .into_iter()
                .find(|id| id == wanted)
                .ok_or_else(|| CameraError::unavailable(format!("no camera with id {wanted}"))),
            None => ids
                .into_iter()
                .next()
                .ok_or_else(|| CameraError::unavailable("no camera device available")),
        }
    }

    /// Copies the stored settings into `request`. Shutter speed or ISO turn
    /// auto-exposure off; otherwise the device meters.
    fn apply_settings(&self, request: &mut AndroidCaptureRequest) -> CameraResult {
        let shutter = self.settings.get(&Parameter::ShutterSpeed);
        let iso = self.settings.get(&Parameter::Iso);
        if shutter.is_none() && iso.is_none() {
            request.set_u8(tag::ACAMERA_CONTROL_AE_MODE, AE_MODE_ON)?;
        } else {
            request.set_u8(tag::ACAMERA_CONTROL_AE_MODE, AE_MODE_OFF)?;
            if let Some(seconds) = shutter {
                let nanos = (seconds * 1e9).round() as i64;
                request.set_i64(tag::ACAMERA_SENSOR_EXPOSURE_TIME, nanos)?;
            }
            if let Some(iso) = iso {
                request.set_i32(tag::ACAMERA_SENSOR_SENSITIVITY, iso.round() as i32)?;
            }
        }
        if let Some(ev) = self.settings.get(&Parameter::ExposureCompensation) {
            if let Some(step) = self.characteristics.exposure_compensation_step() {
                request.set_i32(
                    tag::ACAMERA_CONTROL_AE_EXPOSURE_COMPENSATION,
                    (ev / step).round() as i32,
                )?;
            }
        }
        if let Some(f_number) = self.settings.get(&Parameter::Aperture) {
            request.set_f32(tag::ACAMERA_LENS_APERTURE, *f_number as f32)?;
        }
        Ok(())
    }
}

impl dogma::Named for AndroidCameraDriver {
    fn name(&self) -> Cow<'_, str> {
        "camera2".into()
    }
}

impl CameraDriver for AndroidCameraDriver {
    fn backend(&self) -> CameraBackend {
        CameraBackend::Android
    }

    fn open(
        &mut self,
        config: &CameraConfiguration,
        view_finder: ViewFinder,
    ) -> Result<(), CameraError> {
        let id = self.select_camera()?;
        let characteristics = Characteristics::read(&self.manager.characteristics(&id)?);
        let size = characteristics
            .jpeg_size
            .unwrap_or((self.config.width, self.config.height));
        tracing::debug!(camera_id = %id, ?size, ?characteristics, "opening camera");

        let device = self.manager.open_camera(&id)?;
        let still = StillCapture::open(&device, size)?;

        self.still = Some(still);
        self.device = Some(device);
        self.characteristics = characteristics;
        self.lock_orientation = config.lock_orientation.unwrap_or(false);
        self.view_finder = Some(view_finder);
        Ok(())
    }

    fn close(&mut self) -> Result<(), CameraError> {
        self.still = None;
        self.device = None;
        self.view_finder = None;
        self.settings.clear();
        Ok(())
    }

    fn set_view_finder(&mut self, view_finder: ViewFinder) -> Result<(), CameraError> {
        self.view_finder = Some(view_finder);
        Ok(())
    }

    fn range(&self, parameter: Parameter) -> Option<ParameterRange> {
        self.characteristics.range(parameter)
    }

    fn exposure_compensation_step(&self) -> Option<f64> {
        self.range(Parameter::ExposureCompensation)?;
        self.characteristics.exposure_compensation_step()
    }

    fn set_parameter(&mut self, parameter: Parameter, value: f64) -> Result<(), CameraError> {
        if self.range(parameter).is_none() {
            return Err(CameraError::not_implemented(parameter.setter()));
        }
        let value = match parameter {
            Parameter::Aperture => self
                .characteristics
                .nearest_aperture(value)
                .map_or(value, f64::from),
            _ => value,
        };
        self.settings.insert(parameter, value);
        Ok(())
    }

    fn take_picture(&mut self) -> Result<Frame, CameraError> {
        let device = self.device.as_ref().ok_or(CameraError::NoActiveSession)?;
        let mut request = AndroidCaptureRequest::still(device)
            .map_err(|e| CameraError::capture("creating capture request", e))?;
        self.apply_settings(&mut request)
            .map_err(|e| CameraError::capture("applying capture settings", e))?;

        let still = self.still.as_mut().ok_or(CameraError::NoActiveSession)?;
        let captured = still.capture(request, CAPTURE_TIMEOUT)?;
        let timestamp_ns = captured.get_timestamp()?;
        let picture =
            image::load_from_memory_with_format(captured.plane_data(0)?, ImageFormat::Jpeg)
                .map_err(|e| CameraError::capture("decoding captured picture", e))?;

        // Locked to the natural orientation: only the sensor is rotated.
        let picture = if self.lock_orientation {
            imaging::rotate(picture, self.characteristics.sensor_orientation)
        } else {
            picture
        };

        let rgb = picture.into_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(
            Frame::new_rgb8(Bytes::from(rgb.into_raw()), width, height, width * 3)
                .with_timestamp_ns(timestamp_ns.max(0) as u64),
        )
    }

    fn picture_metadata(&self) -> ExifData {
        ExifData {
            iso: self.settings.get(&Parameter::Iso).map(|v| v.round() as u32),
            shutter_speed: self.settings.get(&Parameter::ShutterSpeed).copied(),
            aperture: self.settings.get(&Parameter::Aperture).copied(),
            focal_length: self.characteristics.focal_lengths.first().map(|f| f64::from(*f)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
