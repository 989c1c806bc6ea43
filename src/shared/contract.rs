// This is free and unencumbered software released into the public domain.

//! The public contract of the `Camera2` plugin.
//!
//! Method names, option shapes and result shapes are defined here once and
//! shared by the bridge, the native camera and the fallback. Wire names are
//! camelCase and must stay identical across platforms.

use super::{CameraConfiguration, CameraError};
use derive_more::Display;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::str::FromStr;

/// The identifier the plugin is registered under with the host runtime.
pub const PLUGIN_NAME: &str = "Camera2";

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Method {
    #[display("echo")]
    Echo,
    #[display("start")]
    Start,
    #[display("stop")]
    Stop,
    #[display("setViewFinderSize")]
    SetViewFinderSize,
    #[display("getShutterSpeedRange")]
    GetShutterSpeedRange,
    #[display("setShutterSpeed")]
    SetShutterSpeed,
    #[display("getApertureRange")]
    GetApertureRange,
    #[display("setAperture")]
    SetAperture,
    #[display("getIsoRange")]
    GetIsoRange,
    #[display("setIso")]
    SetIso,
    #[display("getExposureCompensationInfo")]
    GetExposureCompensationInfo,
    #[display("setExposureCompensation")]
    SetExposureCompensation,
    #[display("capture")]
    Capture,
    #[display("pictureToThumbnail")]
    PictureToThumbnail,
    #[display("getExifData")]
    GetExifData,
}

impl Method {
    pub const ALL: [Method; 15] = [
        Method::Echo,
        Method::Start,
        Method::Stop,
        Method::SetViewFinderSize,
        Method::GetShutterSpeedRange,
        Method::SetShutterSpeed,
        Method::GetApertureRange,
        Method::SetAperture,
        Method::GetIsoRange,
        Method::SetIso,
        Method::GetExposureCompensationInfo,
        Method::SetExposureCompensation,
        Method::Capture,
        Method::PictureToThumbnail,
        Method::GetExifData,
    ];

    /// Whether the method fails with `NoActiveSession` outside a session.
    pub fn requires_session(self) -> bool {
        matches!(
            self,
            Method::SetViewFinderSize
                | Method::SetShutterSpeed
                | Method::SetAperture
                | Method::SetIso
                | Method::SetExposureCompensation
                | Method::Capture
        )
    }

    /// The resolved value's shape, in the host's notation.
    pub fn returns(self) -> &'static str {
        use Method::*;
        match self {
            Echo => "{ value: string }",
            Start | Stop | SetViewFinderSize | SetShutterSpeed | SetAperture | SetIso
            | SetExposureCompensation | Capture => "void",
            GetShutterSpeedRange | GetApertureRange | GetIsoRange => "ParameterRange | null",
            GetExposureCompensationInfo => "ExposureCompensationInfo | null",
            PictureToThumbnail => "{ thumbnail: string }",
            GetExifData => "ExifData",
        }
    }
}

impl FromStr for Method {
    type Err = CameraError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.to_string() == name)
            .ok_or_else(|| CameraError::UnknownMethod(name.to_string()))
    }
}

/// A numeric camera control.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Exposure time, in seconds.
    #[display("shutter speed")]
    ShutterSpeed,
    /// Lens f-number.
    #[display("aperture")]
    Aperture,
    #[display("ISO")]
    Iso,
    /// Exposure bias, in the units of its reported range.
    #[display("exposure compensation")]
    ExposureCompensation,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::ShutterSpeed,
        Parameter::Aperture,
        Parameter::Iso,
        Parameter::ExposureCompensation,
    ];

    pub fn getter(self) -> Method {
        match self {
            Parameter::ShutterSpeed => Method::GetShutterSpeedRange,
            Parameter::Aperture => Method::GetApertureRange,
            Parameter::Iso => Method::GetIsoRange,
            Parameter::ExposureCompensation => Method::GetExposureCompensationInfo,
        }
    }

    pub fn setter(self) -> Method {
        match self {
            Parameter::ShutterSpeed => Method::SetShutterSpeed,
            Parameter::Aperture => Method::SetAperture,
            Parameter::Iso => Method::SetIso,
            Parameter::ExposureCompensation => Method::SetExposureCompensation,
        }
    }
}

/// A closed interval `[min, max]` a parameter may take on the current device.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParameterRange {
    min: f64,
    max: f64,
}

impl ParameterRange {
    pub fn new(min: f64, max: f64) -> Result<Self, CameraError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(CameraError::invalid_config(format!(
                "invalid parameter range [{min}, {max}]"
            )));
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ExposureCompensationInfo {
    range: ParameterRange,
    step: f64,
}

impl ExposureCompensationInfo {
    pub fn new(range: ParameterRange, step: f64) -> Result<Self, CameraError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(CameraError::invalid_config(format!(
                "exposure compensation step must be positive, got {step}"
            )));
        }
        Ok(Self { range, step })
    }

    #[inline]
    pub fn range(&self) -> ParameterRange {
        self.range
    }

    /// The smallest adjustable increment.
    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EchoOptions {
    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewFinderSize {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub value: f64,
}

fn default_picture_path() -> String {
    "_tmp.jpg".to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    #[serde(default = "default_picture_path")]
    pub picture_path: String,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub thumbnail_width: Option<u32>,
    #[serde(default)]
    pub thumbnail_height: Option<u32>,
    #[serde(default)]
    pub thumbnail_quality: Option<u8>,
}

impl CaptureRequest {
    pub fn new(picture_path: impl Into<String>) -> Self {
        Self {
            picture_path: picture_path.into(),
            thumbnail_path: None,
            thumbnail_width: None,
            thumbnail_height: None,
            thumbnail_quality: None,
        }
    }

    pub fn with_thumbnail(mut self, path: impl Into<String>, width: u32, height: u32) -> Self {
        self.thumbnail_path = Some(path.into());
        self.thumbnail_width = Some(width);
        self.thumbnail_height = Some(height);
        self
    }

    pub fn with_thumbnail_quality(mut self, quality: u8) -> Self {
        self.thumbnail_quality = Some(quality);
        self
    }

    /// The thumbnail to derive, if the request names a path and both
    /// dimensions are positive.
    pub fn thumbnail(&self) -> Result<Option<ThumbnailSpec>, CameraError> {
        let (Some(path), Some(width), Some(height)) = (
            self.thumbnail_path.as_deref(),
            self.thumbnail_width,
            self.thumbnail_height,
        ) else {
            return Ok(None);
        };
        if width == 0 || height == 0 {
            return Ok(None);
        }
        check_thumbnail_size(width, height)?;
        let quality = self.thumbnail_quality.unwrap_or(DEFAULT_THUMBNAIL_QUALITY);
        if quality > 100 {
            return Err(CameraError::invalid_config(format!(
                "thumbnail quality must be within 0-100, got {quality}"
            )));
        }
        Ok(Some(ThumbnailSpec {
            path: path.to_string(),
            width,
            height,
            quality,
        }))
    }
}

pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 80;

/// Upper bound on the decoded RGB size of a thumbnail, matching the default
/// allocation limit of the `image` crate.
pub const MAX_THUMBNAIL_BYTES: u64 = 512 * 1024 * 1024;

/// Rejects thumbnail dimensions whose RGB buffer would exceed
/// [`MAX_THUMBNAIL_BYTES`].
pub fn check_thumbnail_size(width: u32, height: u32) -> Result<(), CameraError> {
    let bytes = u64::from(width) * u64::from(height) * 3;
    if bytes > MAX_THUMBNAIL_BYTES {
        return Err(CameraError::invalid_config(format!(
            "thumbnail {width}x{height} exceeds the {MAX_THUMBNAIL_BYTES} byte limit"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    /// Path to a readable image, or base64-encoded image data.
    pub picture: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub quality: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Base64-encoded JPEG.
    pub thumbnail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExifRequest {
    pub path: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExifData {
    pub iso: Option<u32>,
    /// Exposure time, in seconds.
    pub shutter_speed: Option<f64>,
    pub aperture: Option<f64>,
    /// Millimetres.
    pub focal_length: Option<f64>,
}

impl ExifData {
    pub fn is_empty(&self) -> bool {
        self.iso.is_none()
            && self.shutter_speed.is_none()
            && self.aperture.is_none()
            && self.focal_length.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoResult {
    pub value: String,
}

/// One call into the plugin, with its typed options.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Echo(EchoOptions),
    Start(CameraConfiguration),
    Stop,
    SetViewFinderSize(ViewFinderSize),
    GetShutterSpeedRange,
    SetShutterSpeed(ParameterValue),
    GetApertureRange,
    SetAperture(ParameterValue),
    GetIsoRange,
    SetIso(ParameterValue),
    GetExposureCompensationInfo,
    SetExposureCompensation(ParameterValue),
    Capture(CaptureRequest),
    PictureToThumbnail(ThumbnailRequest),
    GetExifData(ExifRequest),
}

impl Call {
    /// Builds a call from a host envelope: a method name and its options
    /// object. Absent (`null`) options are read as `{}`.
    pub fn from_envelope(method: &str, options: Value) -> Result<Self, CameraError> {
        let method: Method = method.parse()?;
        let options = match options {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Ok(match method {
            Method::Echo => Call::Echo(options_of(method, options)?),
            Method::Start => Call::Start(options_of(method, options)?),
            Method::Stop => Call::Stop,
            Method::SetViewFinderSize => Call::SetViewFinderSize(options_of(method, options)?),
            Method::GetShutterSpeedRange => Call::GetShutterSpeedRange,
            Method::SetShutterSpeed => Call::SetShutterSpeed(options_of(method, options)?),
            Method::GetApertureRange => Call::GetApertureRange,
            Method::SetAperture => Call::SetAperture(options_of(method, options)?),
            Method::GetIsoRange => Call::GetIsoRange,
            Method::SetIso => Call::SetIso(options_of(method, options)?),
            Method::GetExposureCompensationInfo => Call::GetExposureCompensationInfo,
            Method::SetExposureCompensation => {
                Call::SetExposureCompensation(options_of(method, options)?)
            },
            Method::Capture => Call::Capture(options_of(method, options)?),
            Method::PictureToThumbnail => Call::PictureToThumbnail(options_of(method, options)?),
            Method::GetExifData => Call::GetExifData(options_of(method, options)?),
        })
    }

    pub fn method(&self) -> Method {
        match self {
            Call::Echo(_) => Method::Echo,
            Call::Start(_) => Method::Start,
            Call::Stop => Method::Stop,
            Call::SetViewFinderSize(_) => Method::SetViewFinderSize,
            Call::GetShutterSpeedRange => Method::GetShutterSpeedRange,
            Call::SetShutterSpeed(_) => Method::SetShutterSpeed,
            Call::GetApertureRange => Method::GetApertureRange,
            Call::SetAperture(_) => Method::SetAperture,
            Call::GetIsoRange => Method::GetIsoRange,
            Call::SetIso(_) => Method::SetIso,
            Call::GetExposureCompensationInfo => Method::GetExposureCompensationInfo,
            Call::SetExposureCompensation(_) => Method::SetExposureCompensation,
            Call::Capture(_) => Method::Capture,
            Call::PictureToThumbnail(_) => Method::PictureToThumbnail,
            Call::GetExifData(_) => Method::GetExifData,
        }
    }
}

fn options_of<T: DeserializeOwned>(method: Method, options: Value) -> Result<T, CameraError> {
    serde_json::from_value(options)
        .map_err(|e| CameraError::invalid_config(format!("{method}: {e}")))
}

/// The resolved value of a call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Void,
    Echo(EchoResult),
    Range(Option<ParameterRange>),
    ExposureCompensation(Option<ExposureCompensationInfo>),
    Thumbnail(Thumbnail),
    Exif(ExifData),
}

/// The method surface shared by the native camera and the fallback.
///
/// Calls are made one at a time by the bridge worker, so implementations
/// take `&mut self` and need no locking of their own.
pub trait Camera2Plugin: Send {
    /// Identity operation, used as a liveness check.
    fn echo(&mut self, value: String) -> Result<String, CameraError> {
        Ok(value)
    }

    fn start(&mut self, config: CameraConfiguration) -> Result<(), CameraError>;

    fn stop(&mut self) -> Result<(), CameraError>;

    fn set_view_finder_size(&mut self, size: ViewFinderSize) -> Result<(), CameraError>;

    fn parameter_range(
        &mut self,
        parameter: Parameter,
    ) -> Result<Option<ParameterRange>, CameraError>;

    fn set_parameter(&mut self, parameter: Parameter, value: f64) -> Result<(), CameraError>;

    fn exposure_compensation_info(
        &mut self,
    ) -> Result<Option<ExposureCompensationInfo>, CameraError>;

    fn capture(&mut self, request: CaptureRequest) -> Result<(), CameraError>;

    fn picture_to_thumbnail(&mut self, request: ThumbnailRequest)
    -> Result<Thumbnail, CameraError>;

    fn exif_data(&mut self, request: ExifRequest) -> Result<ExifData, CameraError>;

    /// Called once when the owning bridge shuts down.
    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ErrorKind;
    use serde_json::json;

    #[test]
    fn method_names_round_trip_through_from_str() {
        for method in Method::ALL {
            assert_eq!(method.to_string().parse::<Method>().unwrap(), method);
        }
        assert_eq!(Method::SetViewFinderSize.to_string(), "setViewFinderSize");
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = Call::from_envelope("zoom", Value::Null).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownMethod);
    }

    #[test]
    fn null_options_read_as_empty_object() {
        let call = Call::from_envelope("start", Value::Null).unwrap();
        assert_eq!(call, Call::Start(CameraConfiguration::default()));
        let call = Call::from_envelope("echo", Value::Null).unwrap();
        assert_eq!(call, Call::Echo(EchoOptions::default()));
    }

    #[test]
    fn malformed_options_are_invalid_configuration() {
        let err = Call::from_envelope("setIso", json!({ "value": "high" })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        let err = Call::from_envelope("getExifData", json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        let err =
            Call::from_envelope("capture", json!({ "thumbnailWidth": -4 })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }

    #[test]
    fn every_method_builds_a_call_of_the_same_method() {
        let options = json!({
            "value": 1.0,
            "width": 10,
            "height": 10,
            "picture": "p.jpg",
            "path": "p.jpg",
        });
        for method in Method::ALL {
            let options = match method {
                Method::Echo => json!({ "value": "ping" }),
                _ => options.clone(),
            };
            let call = Call::from_envelope(&method.to_string(), options).unwrap();
            assert_eq!(call.method(), method);
        }
    }

    #[test]
    fn capture_request_defaults() {
        let call = Call::from_envelope("capture", json!({})).unwrap();
        let Call::Capture(request) = call else {
            panic!("expected a capture call");
        };
        assert_eq!(request.picture_path, "_tmp.jpg");
        assert_eq!(request.thumbnail().unwrap(), None);
    }

    #[test]
    fn thumbnail_needs_path_and_positive_dimensions() {
        let request = CaptureRequest::new("/tmp/a.jpg").with_thumbnail("/tmp/t.jpg", 64, 0);
        assert_eq!(request.thumbnail().unwrap(), None);

        let request = CaptureRequest::new("/tmp/a.jpg").with_thumbnail("/tmp/t.jpg", 64, 48);
        let spec = request.thumbnail().unwrap().unwrap();
        assert_eq!((spec.width, spec.height, spec.quality), (64, 48, 80));
    }

    #[test]
    fn oversized_thumbnails_are_invalid() {
        let request =
            CaptureRequest::new("/tmp/a.jpg").with_thumbnail("/tmp/t.jpg", u32::MAX, u32::MAX);
        let err = request.thumbnail().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);

        let request =
            CaptureRequest::new("/tmp/a.jpg").with_thumbnail("/tmp/t.jpg", 100_000, 100_000);
        assert!(request.thumbnail().is_err());

        assert!(check_thumbnail_size(8192, 8192).is_ok());
        assert!(check_thumbnail_size(16384, 16384).is_err());
    }

    #[test]
    fn ranges_reject_inverted_bounds() {
        assert!(ParameterRange::new(2.0, 1.0).is_err());
        assert!(ParameterRange::new(f64::NAN, 1.0).is_err());
        let range = ParameterRange::new(1.0, 1.0).unwrap();
        assert!(range.contains(1.0));
    }

    #[test]
    fn exposure_step_must_be_positive() {
        let range = ParameterRange::new(-2.0, 2.0).unwrap();
        assert!(ExposureCompensationInfo::new(range, 0.0).is_err());
        assert!(ExposureCompensationInfo::new(range, 1.0 / 3.0).is_ok());
    }

    #[test]
    fn replies_serialize_to_host_shapes() {
        let range = ParameterRange::new(100.0, 3200.0).unwrap();
        assert_eq!(serde_json::to_value(Reply::Void).unwrap(), Value::Null);
        assert_eq!(
            serde_json::to_value(Reply::Range(Some(range))).unwrap(),
            json!({ "min": 100.0, "max": 3200.0 })
        );
        assert_eq!(serde_json::to_value(Reply::Range(None)).unwrap(), Value::Null);
        assert_eq!(
            serde_json::to_value(Reply::Exif(ExifData {
                iso: Some(200),
                ..Default::default()
            }))
            .unwrap(),
            json!({ "iso": 200, "shutterSpeed": null, "aperture": null, "focalLength": null })
        );
    }
}
