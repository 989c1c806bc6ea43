// This is free and unencumbered software released into the public domain.

use crate::shared::{
    Camera2Plugin, CameraConfiguration, CameraDriver, CameraError, CaptureRequest,
    DEFAULT_THUMBNAIL_QUALITY, ExifData, ExifRequest, ExposureCompensationInfo, Method, Parameter,
    ParameterRange, PluginConfig, Thumbnail, ThumbnailRequest, ViewFinder, ViewFinderSize,
    check_thumbnail_size, imaging,
};
use dogma::Named;
use std::{collections::HashMap, fs};
use tracing::{debug, info, warn};

#[derive(Debug)]
enum SessionState {
    Idle,
    Active {
        config: CameraConfiguration,
        view_finder: ViewFinder,
    },
}

/// The camera session over a platform driver.
///
/// Holds the camera between `start` and `stop` and remembers the last range
/// reported for each parameter, which bounds later `set*` calls.
pub struct NativeCamera {
    config: PluginConfig,
    driver: Box<dyn CameraDriver>,
    state: SessionState,
    known_ranges: HashMap<Parameter, ParameterRange>,
}

impl core::fmt::Debug for NativeCamera {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NativeCamera")
            .field("driver", &self.driver.name())
            .field("state", &self.state)
            .field("known_ranges", &self.known_ranges)
            .finish()
    }
}

impl NativeCamera {
    pub fn new(config: PluginConfig, driver: Box<dyn CameraDriver>) -> Self {
        Self {
            config,
            driver,
            state: SessionState::Idle,
            known_ranges: HashMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// The configuration the active session was started with.
    pub fn configuration(&self) -> Option<&CameraConfiguration> {
        match &self.state {
            SessionState::Active { config, .. } => Some(config),
            SessionState::Idle => None,
        }
    }

    pub fn view_finder(&self) -> Option<ViewFinder> {
        match &self.state {
            SessionState::Active { view_finder, .. } => Some(*view_finder),
            SessionState::Idle => None,
        }
    }

    pub fn driver_as<T: 'static>(&self) -> Option<&T> {
        self.driver.as_any().downcast_ref::<T>()
    }

    pub fn driver_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.driver.as_any_mut().downcast_mut::<T>()
    }

    fn require_session(&self) -> Result<(), CameraError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CameraError::NoActiveSession)
        }
    }

    fn remember(&mut self, parameter: Parameter, range: Option<ParameterRange>) {
        match range {
            Some(range) => self.known_ranges.insert(parameter, range),
            None => self.known_ranges.remove(&parameter),
        };
    }
}

impl Camera2Plugin for NativeCamera {
    fn start(&mut self, config: CameraConfiguration) -> Result<(), CameraError> {
        let view_finder = config.view_finder(&self.config)?;
        if self.is_active() {
            return Err(CameraError::AlreadyStarted);
        }
        self.driver.open(&config, view_finder)?;
        info!(driver = %self.driver.name(), ?view_finder, "camera session started");
        self.state = SessionState::Active {
            config,
            view_finder,
        };
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        if !self.is_active() {
            debug!("stop without an active session");
            return Ok(());
        }
        self.state = SessionState::Idle;
        self.known_ranges.clear();
        let closed = self.driver.close();
        info!(driver = %self.driver.name(), "camera session stopped");
        closed
    }

    fn set_view_finder_size(&mut self, size: ViewFinderSize) -> Result<(), CameraError> {
        self.require_session()?;
        let ViewFinderSize { width, height } = size;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(CameraError::invalid_config(format!(
                "view finder size must be positive, got {width}x{height}"
            )));
        }
        let density = self.config.display_density;
        let SessionState::Active { view_finder, .. } = &mut self.state else {
            return Err(CameraError::NoActiveSession);
        };
        let resized = ViewFinder {
            width: ((width * density).round() as u32).max(1),
            height: ((height * density).round() as u32).max(1),
            ..*view_finder
        };
        self.driver.set_view_finder(resized)?;
        *view_finder = resized;
        Ok(())
    }

    fn parameter_range(
        &mut self,
        parameter: Parameter,
    ) -> Result<Option<ParameterRange>, CameraError> {
        if !self.is_active() {
            return Ok(None);
        }
        let range = self.driver.range(parameter);
        self.remember(parameter, range);
        Ok(range)
    }

    fn set_parameter(&mut self, parameter: Parameter, value: f64) -> Result<(), CameraError> {
        self.require_session()?;
        if !value.is_finite() {
            return Err(CameraError::invalid_config(format!(
                "{parameter} must be a finite number"
            )));
        }
        if let Some(range) = self.known_ranges.get(&parameter) {
            if !range.contains(value) {
                return Err(CameraError::OutOfRange {
                    parameter,
                    value,
                    range: *range,
                });
            }
        }
        self.driver.set_parameter(parameter, value)?;
        debug!(%parameter, value, "parameter set");
        Ok(())
    }

    fn exposure_compensation_info(
        &mut self,
    ) -> Result<Option<ExposureCompensationInfo>, CameraError> {
        if !self.is_active() {
            return Ok(None);
        }
        let parameter = Parameter::ExposureCompensation;
        let info = match (
            self.driver.range(parameter),
            self.driver.exposure_compensation_step(),
        ) {
            (Some(range), Some(step)) => Some(ExposureCompensationInfo::new(range, step)?),
            _ => None,
        };
        self.remember(parameter, info.map(|info| info.range()));
        Ok(info)
    }

    fn capture(&mut self, request: CaptureRequest) -> Result<(), CameraError> {
        self.require_session()?;
        let thumbnail = request.thumbnail()?;

        let frame = self.driver.take_picture()?;
        let image = frame.to_image()?;

        let picture_path = self.config.resolve_path(&request.picture_path);
        imaging::write_picture(&image, &picture_path, &self.driver.picture_metadata())?;
        debug!(path = %picture_path.display(), "picture written");

        if let Some(spec) = thumbnail {
            let thumbnail_path = self.config.resolve_path(&spec.path);
            if let Err(err) = imaging::write_thumbnail(&image, &spec, &thumbnail_path) {
                if let Err(cleanup) = fs::remove_file(&picture_path) {
                    warn!(path = %picture_path.display(), %cleanup, "cannot remove picture");
                }
                return Err(err);
            }
            debug!(path = %thumbnail_path.display(), "thumbnail written");
        }
        Ok(())
    }

    fn picture_to_thumbnail(
        &mut self,
        request: ThumbnailRequest,
    ) -> Result<Thumbnail, CameraError> {
        picture_to_thumbnail(&self.config, &request)
    }

    fn exif_data(&mut self, request: ExifRequest) -> Result<ExifData, CameraError> {
        imaging::read_exif(&self.config.resolve_path(&request.path))
    }

    fn shutdown(&mut self) {
        if let Err(err) = self.stop() {
            warn!(%err, "closing camera on shutdown failed");
        }
    }
}

fn picture_to_thumbnail(
    config: &PluginConfig,
    request: &ThumbnailRequest,
) -> Result<Thumbnail, CameraError> {
    if request.picture.is_empty() {
        return Err(CameraError::invalid_config(format!(
            "{}: picture is required",
            Method::PictureToThumbnail
        )));
    }
    if request.width == 0 || request.height == 0 {
        return Err(CameraError::invalid_config("invalid width or height"));
    }
    check_thumbnail_size(request.width, request.height)?;
    let quality = request.quality.unwrap_or(DEFAULT_THUMBNAIL_QUALITY);
    if quality > 100 {
        return Err(CameraError::invalid_config(format!(
            "quality must be within 0-100, got {quality}"
        )));
    }

    let image = imaging::load_picture(&request.picture, &config.resolve_path(&request.picture))?;
    Ok(Thumbnail {
        thumbnail: imaging::thumbnail_base64(&image, request.width, request.height, quality)?,
    })
}
