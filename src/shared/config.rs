// This is free and unencumbered software released into the public domain.

use crate::shared::{CameraBackend, CameraError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Plugin-wide settings, fixed when the plugin is opened.
#[derive(Clone, Debug, PartialEq)]
pub struct PluginConfig {
    pub backend: Option<CameraBackend>,
    pub device: Option<String>,
    /// Resolution of captured pictures.
    pub width: u32,
    pub height: u32,
    /// Display size in pixels, used when `start` omits width or height.
    pub display_width: u32,
    pub display_height: u32,
    /// Pixels per density-independent unit.
    pub display_density: f64,
    /// Relative file paths resolve against this directory.
    pub storage_root: Option<PathBuf>,
    pub diagnostics: bool,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            backend: None,
            device: None,
            width: 640,
            height: 480,
            display_width: 1080,
            display_height: 1920,
            display_density: 1.0,
            storage_root: None,
            diagnostics: false,
        }
    }
}

impl PluginConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Reads `CAMERA2_*` variables from the process environment.
    pub fn from_env() -> Result<Self, CameraError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self, CameraError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "CAMERA2_BACKEND" => config.backend = Some(value.parse()?),
                "CAMERA2_DEVICE" => config.device = Some(value.to_string()),
                "CAMERA2_STORAGE_ROOT" => config.storage_root = Some(PathBuf::from(value)),
                "CAMERA2_DIAGNOSTICS" => {
                    config.diagnostics = matches!(value, "1" | "true" | "yes" | "on")
                },
                _ => {},
            }
        }
        Ok(config)
    }

    pub fn with_backend(mut self, backend: CameraBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn with_display(mut self, width: u32, height: u32, density: f64) -> Self {
        self.display_width = width;
        self.display_height = height;
        self.display_density = if density.is_finite() && density > 0.0 {
            density
        } else {
            1.0
        };
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = Some(root.into());
        self
    }

    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match &self.storage_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Options of `start`. Every field is optional; absent means platform default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfiguration {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub padding_bottom: Option<f64>,
    pub to_back: Option<bool>,
    #[serde(rename = "lockAndroidOrientation", alias = "lockOrientation")]
    pub lock_orientation: Option<bool>,
}

impl CameraConfiguration {
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_padding_bottom(mut self, padding: f64) -> Self {
        self.padding_bottom = Some(padding);
        self
    }

    pub fn with_to_back(mut self, to_back: bool) -> Self {
        self.to_back = Some(to_back);
        self
    }

    pub fn with_lock_orientation(mut self, lock: bool) -> Self {
        self.lock_orientation = Some(lock);
        self
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        for (name, value) in [
            ("x", self.x),
            ("y", self.y),
            ("paddingBottom", self.padding_bottom),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(CameraError::invalid_config(format!(
                        "{name} must be a non-negative number, got {v}"
                    )));
                }
            }
        }
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(CameraError::invalid_config(format!(
                        "{name} must be a positive number, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Computes the on-screen view finder. Provided values are scaled by the
    /// display density; missing sizes take the display size, and the bottom
    /// padding is taken off the height.
    pub fn view_finder(&self, plugin: &PluginConfig) -> Result<ViewFinder, CameraError> {
        self.validate()?;
        let density = plugin.display_density;
        let scale = |v: f64| (v * density).round();

        let padding = self.padding_bottom.map(scale).unwrap_or(0.0);
        let width = self
            .width
            .map(scale)
            .unwrap_or(plugin.display_width as f64);
        let height = self
            .height
            .map(scale)
            .unwrap_or(plugin.display_height as f64)
            - padding;

        if width < 1.0 || height < 1.0 {
            return Err(CameraError::invalid_config(format!(
                "view finder would be {width}x{height} after padding"
            )));
        }

        Ok(ViewFinder {
            x: self.x.map(scale).unwrap_or(0.0) as u32,
            y: self.y.map(scale).unwrap_or(0.0) as u32,
            width: width as u32,
            height: height as u32,
        })
    }
}

/// The view finder rectangle in display pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ViewFinder {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
