// This is free and unencumbered software released into the public domain.

//! A software camera that renders a test pattern.
//!
//! It behaves like a device with the configured controls, which makes the
//! native path usable on hosts without camera hardware.

use crate::shared::{
    CameraBackend, CameraConfiguration, CameraDriver, CameraError, ExifData, Frame, Parameter,
    ParameterRange, PluginConfig, ViewFinder,
};
use bytes::Bytes;
use std::{any::Any, borrow::Cow, collections::HashMap};

/// The controls a synthetic device exposes. `None` means unsupported.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticCapabilities {
    pub shutter_speed: Option<(f64, f64)>,
    pub aperture: Option<(f64, f64)>,
    pub iso: Option<(f64, f64)>,
    pub exposure_compensation: Option<(f64, f64)>,
    pub exposure_compensation_step: f64,
    pub focal_length: Option<f64>,
}

impl Default for SyntheticCapabilities {
    fn default() -> Self {
        Self {
            shutter_speed: Some((1.0 / 8000.0, 30.0)),
            aperture: Some((1.8, 16.0)),
            iso: Some((50.0, 3200.0)),
            exposure_compensation: Some((-2.0, 2.0)),
            exposure_compensation_step: 1.0 / 3.0,
            focal_length: Some(4.25),
        }
    }
}

impl SyntheticCapabilities {
    /// A device with no adjustable controls at all.
    pub fn fixed() -> Self {
        Self {
            shutter_speed: None,
            aperture: None,
            iso: None,
            exposure_compensation: None,
            exposure_compensation_step: 1.0,
            focal_length: None,
        }
    }

    fn bounds(&self, parameter: Parameter) -> Option<(f64, f64)> {
        match parameter {
            Parameter::ShutterSpeed => self.shutter_speed,
            Parameter::Aperture => self.aperture,
            Parameter::Iso => self.iso,
            Parameter::ExposureCompensation => self.exposure_compensation,
        }
    }
}

#[derive(Debug)]
pub struct SyntheticCameraDriver {
    config: PluginConfig,
    capabilities: SyntheticCapabilities,
    busy: bool,
    permission_denied: bool,
    fail_capture: bool,
    active: Option<CameraConfiguration>,
    view_finder: Option<ViewFinder>,
    settings: HashMap<Parameter, f64>,
    pictures: u64,
}

impl SyntheticCameraDriver {
    pub fn new(config: PluginConfig) -> Self {
        Self::with_capabilities(config, SyntheticCapabilities::default())
    }

    pub fn with_capabilities(config: PluginConfig, capabilities: SyntheticCapabilities) -> Self {
        Self {
            config,
            capabilities,
            busy: false,
            permission_denied: false,
            fail_capture: false,
            active: None,
            view_finder: None,
            settings: HashMap::new(),
            pictures: 0,
        }
    }

    /// Makes `open` fail as if another client held the camera.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn set_permission_denied(&mut self, denied: bool) {
        self.permission_denied = denied;
    }

    pub fn set_fail_capture(&mut self, fail: bool) {
        self.fail_capture = fail;
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn configuration(&self) -> Option<&CameraConfiguration> {
        self.active.as_ref()
    }

    pub fn view_finder(&self) -> Option<ViewFinder> {
        self.view_finder
    }

    pub fn setting(&self, parameter: Parameter) -> Option<f64> {
        self.settings.get(&parameter).copied()
    }

    pub fn pictures_taken(&self) -> u64 {
        self.pictures
    }

    fn render(&self) -> Frame {
        let (width, height) = (self.config.width.max(1), self.config.height.max(1));
        let stride = width * 3;
        let shade = (self.pictures % 256) as u8;
        let mut data = Vec::with_capacity((stride * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 255 / width) as u8);
                data.push((y * 255 / height) as u8);
                data.push(shade);
            }
        }
        Frame::new_rgb8(Bytes::from(data), width, height, stride).with_timestamp_ns(self.pictures)
    }
}

impl dogma::Named for SyntheticCameraDriver {
    fn name(&self) -> Cow<'_, str> {
        "synthetic".into()
    }
}

impl CameraDriver for SyntheticCameraDriver {
    fn backend(&self) -> CameraBackend {
        CameraBackend::Synthetic
    }

    fn open(
        &mut self,
        config: &CameraConfiguration,
        view_finder: ViewFinder,
    ) -> Result<(), CameraError> {
        if self.permission_denied {
            return Err(CameraError::unavailable("camera permission denied"));
        }
        if self.busy {
            return Err(CameraError::unavailable("camera is in use by another client"));
        }
        self.active = Some(config.clone());
        self.view_finder = Some(view_finder);
        Ok(())
    }

    fn close(&mut self) -> Result<(), CameraError> {
        self.active = None;
        self.view_finder = None;
        self.settings.clear();
        Ok(())
    }

    fn set_view_finder(&mut self, view_finder: ViewFinder) -> Result<(), CameraError> {
        self.view_finder = Some(view_finder);
        Ok(())
    }

    fn range(&self, parameter: Parameter) -> Option<ParameterRange> {
        let (min, max) = self.capabilities.bounds(parameter)?;
        ParameterRange::new(min, max).ok()
    }

    fn exposure_compensation_step(&self) -> Option<f64> {
        self.capabilities
            .exposure_compensation
            .map(|_| self.capabilities.exposure_compensation_step)
    }

    fn set_parameter(&mut self, parameter: Parameter, value: f64) -> Result<(), CameraError> {
        if self.capabilities.bounds(parameter).is_none() {
            return Err(CameraError::not_implemented(parameter.setter()));
        }
        self.settings.insert(parameter, value);
        Ok(())
    }

    fn take_picture(&mut self) -> Result<Frame, CameraError> {
        if self.fail_capture {
            return Err(CameraError::capture(
                "reading sensor",
                std::io::Error::other("simulated sensor failure"),
            ));
        }
        self.pictures += 1;
        Ok(self.render())
    }

    fn picture_metadata(&self) -> ExifData {
        ExifData {
            iso: self.setting(Parameter::Iso).map(|v| v.round() as u32),
            shutter_speed: self.setting(Parameter::ShutterSpeed),
            aperture: self.setting(Parameter::Aperture),
            focal_length: self.capabilities.focal_length,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_configured_resolution() {
        let mut driver = SyntheticCameraDriver::new(PluginConfig::new(32, 16));
        let frame = driver.take_picture().unwrap();
        assert_eq!((frame.width, frame.height), (32, 16));
        assert_eq!(frame.data.len(), 32 * 16 * 3);
        assert_eq!(driver.pictures_taken(), 1);
    }

    #[test]
    fn busy_camera_is_unavailable() {
        let mut driver = SyntheticCameraDriver::new(PluginConfig::default());
        driver.set_busy(true);
        let err = driver
            .open(&CameraConfiguration::default(), ViewFinder::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::shared::ErrorKind::CameraUnavailable);
        assert!(!driver.is_open());
    }

    #[test]
    fn fixed_device_has_no_ranges() {
        let mut driver = SyntheticCameraDriver::with_capabilities(
            PluginConfig::default(),
            SyntheticCapabilities::fixed(),
        );
        for parameter in Parameter::ALL {
            assert_eq!(driver.range(parameter), None);
            assert!(driver.set_parameter(parameter, 1.0).is_err());
        }
        assert_eq!(driver.exposure_compensation_step(), None);
    }

    #[test]
    fn metadata_follows_settings() {
        let mut driver = SyntheticCameraDriver::new(PluginConfig::default());
        driver.set_parameter(Parameter::Iso, 400.0).unwrap();
        driver.set_parameter(Parameter::ShutterSpeed, 0.008).unwrap();
        let exif = driver.picture_metadata();
        assert_eq!(exif.iso, Some(400));
        assert_eq!(exif.shutter_speed, Some(0.008));
        assert_eq!(exif.aperture, None);
        assert_eq!(exif.focal_length, Some(4.25));
    }
}
