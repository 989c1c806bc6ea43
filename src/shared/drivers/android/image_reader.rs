// This is free and unencumbered software released into the public domain.

use super::{AndroidImage, AndroidNativeWindow, MediaResult};
use core::ptr::null_mut;
use ndk_sys::{
    AImage, AImageReader, AImageReader_acquireLatestImage, AImageReader_acquireNextImage,
    AImageReader_delete, AImageReader_getWindow, AImageReader_new, media_status_t,
};

/// `AIMAGE_FORMAT_JPEG` from `media/NdkImage.h`.
pub const AIMAGE_FORMAT_JPEG: i32 = 0x100;

#[derive(Debug)]
pub struct AndroidImageReader {
    pub(crate) handle: *mut AImageReader,
}

impl Drop for AndroidImageReader {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { AImageReader_delete(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl AndroidImageReader {
    pub fn new(dimensions: (u32, u32), format: i32) -> MediaResult<Self> {
        let (width, height) = dimensions;
        let mut handle = null_mut();
        let status =
            unsafe { AImageReader_new(width as _, height as _, format, 2, &mut handle) };
        if status != media_status_t::AMEDIA_OK {
            return Err(status.into());
        }
        Ok(Self { handle })
    }

    /// The surface the camera renders into.
    pub fn get_window(&self) -> MediaResult<AndroidNativeWindow> {
        let mut window = null_mut();
        let status = unsafe { AImageReader_getWindow(self.handle, &mut window) };
        if status != media_status_t::AMEDIA_OK {
            return Err(status.into());
        }
        Ok(AndroidNativeWindow::acquire(window))
    }

    /// The oldest queued image, or `None` while the reader is empty.
    pub fn acquire_next_image(&self) -> MediaResult<Option<AndroidImage>> {
        self.acquire(AImageReader_acquireNextImage)
    }

    pub fn acquire_latest_image(&self) -> MediaResult<Option<AndroidImage>> {
        self.acquire(AImageReader_acquireLatestImage)
    }

    fn acquire(
        &self,
        acquire: unsafe extern "C" fn(*mut AImageReader, *mut *mut AImage) -> media_status_t,
    ) -> MediaResult<Option<AndroidImage>> {
        let mut image = AndroidImage { handle: null_mut() };
        let status = unsafe { acquire(self.handle, &mut image.handle) };
        match status {
            media_status_t::AMEDIA_OK => Ok(Some(image)),
            media_status_t::AMEDIA_IMGREADER_NO_BUFFER_AVAILABLE => Ok(None),
            status => Err(status.into()),
        }
    }
}
