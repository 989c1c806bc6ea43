// This is free and unencumbered software released into the public domain.

use core::{mem::zeroed, ptr::null_mut};
use ndk_sys::{
    ACameraMetadata, ACameraMetadata_const_entry, ACameraMetadata_free,
    ACameraMetadata_getConstEntry, ACameraMetadata_rational, acamera_metadata_tag,
    camera_status_t,
};

/// A value type stored in camera metadata, with its `ACAMERA_TYPE_*` code.
pub trait MetadataValue: Copy {
    const TYPE: u8;
}

impl MetadataValue for u8 {
    const TYPE: u8 = 0;
}

impl MetadataValue for i32 {
    const TYPE: u8 = 1;
}

impl MetadataValue for f32 {
    const TYPE: u8 = 2;
}

impl MetadataValue for i64 {
    const TYPE: u8 = 3;
}

impl MetadataValue for ACameraMetadata_rational {
    const TYPE: u8 = 5;
}

/// Static characteristics of one camera device.
#[derive(Debug)]
pub struct CameraMetadata {
    pub(crate) handle: *mut ACameraMetadata,
}

impl Drop for CameraMetadata {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ACameraMetadata_free(self.handle) };
            self.handle = null_mut();
        }
    }
}

impl CameraMetadata {
    /// The values stored under `tag`, or `None` when the device does not
    /// report it or reports it with another type.
    pub fn get<T: MetadataValue>(&self, tag: acamera_metadata_tag) -> Option<Vec<T>> {
        let mut entry: ACameraMetadata_const_entry = unsafe { zeroed() };
        let status =
            unsafe { ACameraMetadata_getConstEntry(self.handle, tag.0 as u32, &mut entry) };
        if status != camera_status_t::ACAMERA_OK || entry.type_ != T::TYPE || entry.count == 0 {
            return None;
        }
        // Every member of the entry's data union is a pointer to the first value.
        let data = unsafe { *(&entry.data as *const _ as *const *const T) };
        if data.is_null() {
            return None;
        }
        Some(unsafe { core::slice::from_raw_parts(data, entry.count as usize) }.to_vec())
    }

    pub fn pair<T: MetadataValue>(&self, tag: acamera_metadata_tag) -> Option<(T, T)> {
        match self.get::<T>(tag)?.as_slice() {
            [min, max, ..] => Some((*min, *max)),
            _ => None,
        }
    }

    pub fn rational(&self, tag: acamera_metadata_tag) -> Option<f64> {
        let value = *self.get::<ACameraMetadata_rational>(tag)?.first()?;
        (value.denominator != 0).then(|| value.numerator as f64 / value.denominator as f64)
    }
}
