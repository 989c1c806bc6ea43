// This is free and unencumbered software released into the public domain.

use crate::shared::CameraError;
use derive_more::Display;
use ndk_sys::media_status_t;

pub type MediaResult<T = ()> = core::result::Result<T, MediaStatus>;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display("media status {}", _0.0)]
pub struct MediaStatus(pub(crate) media_status_t);

impl core::error::Error for MediaStatus {}

impl Default for MediaStatus {
    fn default() -> Self {
        MediaStatus(media_status_t::AMEDIA_OK)
    }
}

impl From<media_status_t> for MediaStatus {
    fn from(input: media_status_t) -> Self {
        Self(input)
    }
}

impl From<MediaStatus> for CameraError {
    fn from(status: MediaStatus) -> Self {
        CameraError::capture("reading the captured image", status)
    }
}
