// This is free and unencumbered software released into the public domain.

use crate::shared::{
    Camera2Plugin, CameraConfiguration, CameraError, CaptureRequest, ExifData, ExifRequest,
    ExposureCompensationInfo, Method, Parameter, ParameterRange, Thumbnail, ThumbnailRequest,
    ViewFinderSize,
};

/// The plugin used where no camera driver exists. Only `echo` works; every
/// other method rejects with `NotImplemented` and touches nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct FallbackCamera;

impl Camera2Plugin for FallbackCamera {
    fn start(&mut self, _config: CameraConfiguration) -> Result<(), CameraError> {
        Err(CameraError::not_implemented(Method::Start))
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        Err(CameraError::not_implemented(Method::Stop))
    }

    fn set_view_finder_size(&mut self, _size: ViewFinderSize) -> Result<(), CameraError> {
        Err(CameraError::not_implemented(Method::SetViewFinderSize))
    }

    fn parameter_range(
        &mut self,
        parameter: Parameter,
    ) -> Result<Option<ParameterRange>, CameraError> {
        Err(CameraError::not_implemented(parameter.getter()))
    }

    fn set_parameter(&mut self, parameter: Parameter, _value: f64) -> Result<(), CameraError> {
        Err(CameraError::not_implemented(parameter.setter()))
    }

    fn exposure_compensation_info(
        &mut self,
    ) -> Result<Option<ExposureCompensationInfo>, CameraError> {
        Err(CameraError::not_implemented(
            Method::GetExposureCompensationInfo,
        ))
    }

    fn capture(&mut self, _request: CaptureRequest) -> Result<(), CameraError> {
        Err(CameraError::not_implemented(Method::Capture))
    }

    fn picture_to_thumbnail(
        &mut self,
        _request: ThumbnailRequest,
    ) -> Result<Thumbnail, CameraError> {
        Err(CameraError::not_implemented(Method::PictureToThumbnail))
    }

    fn exif_data(&mut self, _request: ExifRequest) -> Result<ExifData, CameraError> {
        Err(CameraError::not_implemented(Method::GetExifData))
    }
}
