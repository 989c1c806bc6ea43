// This is free and unencumbered software released into the public domain.

use super::MediaResult;
use core::ptr::null_mut;
use ndk_sys::{AImage, AImage_delete, AImage_getPlaneData, AImage_getTimestamp, media_status_t};

#[derive(Debug)]
pub struct AndroidImage {
    pub(crate) handle: *mut AImage,
}

impl Drop for AndroidImage {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { AImage_delete(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl AndroidImage {
    pub fn get_timestamp(&self) -> MediaResult<i64> {
        let mut result = 0;
        let status = unsafe { AImage_getTimestamp(self.handle, &mut result) };
        if status != media_status_t::AMEDIA_OK {
            return Err(status.into());
        }
        Ok(result)
    }

    /// The bytes of `plane`. A JPEG image has a single plane holding the
    /// compressed stream.
    pub fn plane_data(&self, plane: i32) -> MediaResult<&[u8]> {
        let mut data = null_mut();
        let mut len = 0;
        let status = unsafe { AImage_getPlaneData(self.handle, plane, &mut data, &mut len) };
        if status != media_status_t::AMEDIA_OK {
            return Err(status.into());
        }
        if data.is_null() || len <= 0 {
            return Ok(&[]);
        }
        Ok(unsafe { core::slice::from_raw_parts(data, len as usize) })
    }
}
