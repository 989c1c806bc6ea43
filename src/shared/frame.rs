// This is free and unencumbered software released into the public domain.

use crate::shared::CameraError;
use bytes::Bytes;
use image::{DynamicImage, RgbImage};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// One still picture as delivered by a driver.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub pixel_format: PixelFormat,
    pub timestamp_ns: u64,
}

impl Frame {
    pub fn new_rgb8(data: Bytes, width: u32, height: u32, stride: u32) -> Self {
        Self {
            data,
            width,
            height,
            stride,
            pixel_format: PixelFormat::Rgb8,
            timestamp_ns: 0,
        }
    }

    pub fn with_timestamp_ns(mut self, ts: u64) -> Self {
        self.timestamp_ns = ts;
        self
    }

    /// Repacks the frame into a tightly packed RGB image.
    pub fn to_image(&self) -> Result<DynamicImage, CameraError> {
        let bpp = self.pixel_format.bytes_per_pixel();
        let row_len = self.width as usize * bpp;
        let stride = self.stride as usize;
        let needed = stride * self.height.saturating_sub(1) as usize + row_len;
        if self.width == 0 || self.height == 0 || stride < row_len || self.data.len() < needed {
            return Err(CameraError::capture(
                "converting frame",
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "{}x{} {:?} frame with stride {} has {} bytes",
                        self.width,
                        self.height,
                        self.pixel_format,
                        self.stride,
                        self.data.len()
                    ),
                ),
            ));
        }

        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for row in self.data.chunks(stride).take(self.height as usize) {
            match self.pixel_format {
                PixelFormat::Rgb8 => rgb.extend_from_slice(&row[..row_len]),
            }
        }

        RgbImage::from_raw(self.width, self.height, rgb)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| {
                CameraError::capture(
                    "converting frame",
                    std::io::Error::other("pixel buffer size mismatch"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_rows_are_repacked() {
        // 2x2 RGB, stride 8 (2 bytes of padding per row)
        let data = vec![
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let frame = Frame::new_rgb8(Bytes::from(data), 2, 2, 8);
        let image = frame.to_image().unwrap().to_rgb8();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(image.get_pixel(1, 1).0, [10, 11, 12]);
    }

    #[test]
    fn short_buffers_are_capture_failures() {
        let frame = Frame::new_rgb8(Bytes::from(vec![0u8; 10]), 4, 4, 12);
        let err = frame.to_image().unwrap_err();
        assert_eq!(err.kind(), crate::shared::ErrorKind::CaptureFailed);
    }
}
