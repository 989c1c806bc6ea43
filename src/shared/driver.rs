// This is free and unencumbered software released into the public domain.

use crate::shared::{
    CameraConfiguration, CameraError, ExifData, Frame, Parameter, ParameterRange, ViewFinder,
};
use derive_more::Display;
use std::{any::Any, str::FromStr};

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum CameraBackend {
    #[display("android")]
    Android,
    #[display("ffmpeg")]
    Ffmpeg,
    #[display("synthetic")]
    Synthetic,
}

impl FromStr for CameraBackend {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" | "camera2" => Ok(Self::Android),
            "ffmpeg" => Ok(Self::Ffmpeg),
            "synthetic" => Ok(Self::Synthetic),
            other => Err(CameraError::invalid_config(format!(
                "unknown camera backend: {other}"
            ))),
        }
    }
}

/// A platform camera, as seen by the session.
///
/// Drivers own the hardware between `open` and `close` and report their
/// failures as [`CameraError`]s; raw platform errors stay behind this trait
/// as error sources.
pub trait CameraDriver: dogma::Named + Send {
    fn backend(&self) -> CameraBackend;

    fn open(
        &mut self,
        config: &CameraConfiguration,
        view_finder: ViewFinder,
    ) -> Result<(), CameraError>;

    fn close(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn set_view_finder(&mut self, view_finder: ViewFinder) -> Result<(), CameraError>;

    /// The range the device supports for `parameter`, if it exposes one.
    fn range(&self, _parameter: Parameter) -> Option<ParameterRange> {
        None
    }

    fn exposure_compensation_step(&self) -> Option<f64> {
        None
    }

    fn set_parameter(&mut self, parameter: Parameter, _value: f64) -> Result<(), CameraError> {
        Err(CameraError::not_implemented(parameter.setter()))
    }

    fn take_picture(&mut self) -> Result<Frame, CameraError>;

    /// Exposure settings of the last picture, embedded into JPEG output.
    fn picture_metadata(&self) -> ExifData {
        ExifData::default()
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse() {
        assert_eq!("FFmpeg".parse::<CameraBackend>().unwrap(), CameraBackend::Ffmpeg);
        assert_eq!("camera2".parse::<CameraBackend>().unwrap(), CameraBackend::Android);
        assert_eq!(CameraBackend::Synthetic.to_string(), "synthetic");
        assert!("".parse::<CameraBackend>().is_err());
    }
}
