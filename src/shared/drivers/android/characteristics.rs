// This is free and unencumbered software released into the public domain.

use super::{AIMAGE_FORMAT_JPEG, CameraMetadata};
use crate::shared::{Parameter, ParameterRange};
use ndk_sys::acamera_metadata_tag as tag;

/// What one device reports about its manual controls and still output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Characteristics {
    /// Sensor exposure time bounds, in nanoseconds.
    pub exposure_time_ns: Option<(i64, i64)>,
    pub sensitivity: Option<(i32, i32)>,
    pub apertures: Vec<f32>,
    pub focal_lengths: Vec<f32>,
    /// Auto-exposure compensation bounds, in steps.
    pub ae_compensation: Option<(i32, i32)>,
    /// Size of one compensation step, in EV.
    pub ae_compensation_step: Option<f64>,
    /// Clockwise rotation of the sensor image relative to the device's
    /// natural orientation, in degrees.
    pub sensor_orientation: u32,
    pub jpeg_size: Option<(u32, u32)>,
}

impl Characteristics {
    pub fn read(metadata: &CameraMetadata) -> Self {
        Self {
            exposure_time_ns: metadata.pair(tag::ACAMERA_SENSOR_INFO_EXPOSURE_TIME_RANGE),
            sensitivity: metadata.pair(tag::ACAMERA_SENSOR_INFO_SENSITIVITY_RANGE),
            apertures: metadata
                .get(tag::ACAMERA_LENS_INFO_AVAILABLE_APERTURES)
                .unwrap_or_default(),
            focal_lengths: metadata
                .get(tag::ACAMERA_LENS_INFO_AVAILABLE_FOCAL_LENGTHS)
                .unwrap_or_default(),
            ae_compensation: metadata.pair(tag::ACAMERA_CONTROL_AE_COMPENSATION_RANGE),
            ae_compensation_step: metadata.rational(tag::ACAMERA_CONTROL_AE_COMPENSATION_STEP),
            sensor_orientation: metadata
                .get::<i32>(tag::ACAMERA_SENSOR_ORIENTATION)
                .and_then(|v| v.first().copied())
                .map_or(0, |degrees| degrees.rem_euclid(360) as u32),
            jpeg_size: metadata
                .get::<i32>(tag::ACAMERA_SCALER_AVAILABLE_STREAM_CONFIGURATIONS)
                .and_then(|configs| largest_jpeg_output(&configs)),
        }
    }

    /// The range reported to callers. Exposure compensation is expressed
    /// in EV; a device reporting `[0, 0]` steps has no compensation.
    pub fn range(&self, parameter: Parameter) -> Option<ParameterRange> {
        let (min, max) = match parameter {
            Parameter::ShutterSpeed => {
                let (min, max) = self.exposure_time_ns?;
                (min as f64 / 1e9, max as f64 / 1e9)
            },
            Parameter::Iso => {
                let (min, max) = self.sensitivity?;
                (f64::from(min), f64::from(max))
            },
            Parameter::Aperture => {
                let min = self.apertures.iter().copied().reduce(f32::min)?;
                let max = self.apertures.iter().copied().reduce(f32::max)?;
                (f64::from(min), f64::from(max))
            },
            Parameter::ExposureCompensation => {
                let (min, max) = self.ae_compensation.filter(|&(min, max)| min < max)?;
                let step = self.exposure_compensation_step()?;
                (f64::from(min) * step, f64::from(max) * step)
            },
        };
        ParameterRange::new(min, max).ok()
    }

    pub fn exposure_compensation_step(&self) -> Option<f64> {
        self.ae_compensation_step.filter(|step| step.is_finite() && *step > 0.0)
    }

    /// The reported aperture closest to `f_number`.
    pub fn nearest_aperture(&self, f_number: f64) -> Option<f32> {
        self.apertures.iter().copied().min_by(|a, b| {
            let da = (f64::from(*a) - f_number).abs();
            let db = (f64::from(*b) - f_number).abs();
            da.total_cmp(&db)
        })
    }
}

/// Picks the largest JPEG output size from
/// `(format, width, height, is_input)` stream configuration quadruples.
pub fn largest_jpeg_output(configs: &[i32]) -> Option<(u32, u32)> {
    configs
        .chunks_exact(4)
        .filter(|c| c[0] == AIMAGE_FORMAT_JPEG && c[3] == 0 && c[1] > 0 && c[2] > 0)
        .map(|c| (c[1] as u32, c[2] as u32))
        .max_by_key(|&(w, h)| u64::from(w) * u64::from(h))
}
