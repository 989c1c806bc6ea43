// This is free and unencumbered software released into the public domain.

use super::{
    Camera2Plugin, CameraBackend, CameraDriver, CameraError, FallbackCamera, NativeCamera,
    PluginConfig, SyntheticCameraDriver,
};
use dogma::Named;
use tracing::{info, warn};

cfg_if::cfg_if! {
    if #[cfg(all(
        feature = "ffmpeg",
        any(target_os = "macos", target_os = "linux", target_os = "windows")
    ))] {
        fn open_ffmpeg(config: &PluginConfig) -> Result<Box<dyn CameraDriver>, CameraError> {
            Ok(Box::new(super::drivers::ffmpeg::FfmpegCameraDriver::new(
                config.clone(),
            )))
        }
    } else {
        fn open_ffmpeg(_config: &PluginConfig) -> Result<Box<dyn CameraDriver>, CameraError> {
            Err(CameraError::unavailable("ffmpeg backend is not available in this build"))
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(feature = "android", target_os = "android"))] {
        fn open_android(config: &PluginConfig) -> Result<Box<dyn CameraDriver>, CameraError> {
            Ok(Box::new(super::drivers::android::AndroidCameraDriver::new(
                config.clone(),
            )?))
        }
    } else {
        fn open_android(_config: &PluginConfig) -> Result<Box<dyn CameraDriver>, CameraError> {
            Err(CameraError::unavailable("android backend is not available in this build"))
        }
    }
}

/// Selects the camera driver for `config`.
///
/// An explicit backend is honored or fails. Otherwise the Android driver is
/// preferred, then ffmpeg.
pub fn open_driver(config: &PluginConfig) -> Result<Box<dyn CameraDriver>, CameraError> {
    match config.backend {
        Some(CameraBackend::Synthetic) => {
            Ok(Box::new(SyntheticCameraDriver::new(config.clone())))
        },
        Some(CameraBackend::Ffmpeg) => open_ffmpeg(config),
        Some(CameraBackend::Android) => open_android(config),
        None => {
            if cfg!(all(feature = "android", target_os = "android")) {
                return open_android(config);
            }
            if cfg!(all(
                feature = "ffmpeg",
                any(target_os = "macos", target_os = "linux", target_os = "windows")
            )) {
                return open_ffmpeg(config);
            }
            Err(CameraError::unavailable(
                "no suitable camera backend available",
            ))
        },
    }
}

/// Opens the plugin for this platform. Without a driver this is the
/// fallback, which answers everything but `echo` with `NotImplemented`.
pub fn open_plugin(config: &PluginConfig) -> Box<dyn Camera2Plugin> {
    match open_driver(config) {
        Ok(driver) => {
            info!(backend = %driver.backend(), driver = %driver.name(), "using native camera");
            Box::new(NativeCamera::new(config.clone(), driver))
        },
        Err(err) => {
            warn!(%err, "no camera driver; using fallback");
            Box::new(FallbackCamera)
        },
    }
}
