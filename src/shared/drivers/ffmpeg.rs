// This is free and unencumbered software released into the public domain.

use crate::shared::{
    CameraBackend, CameraConfiguration, CameraDriver, CameraError, Frame, PluginConfig,
    ViewFinder,
};
use bytes::Bytes;
use std::{
    any::Any,
    borrow::Cow,
    env,
    io::Read,
    process::{Child, Command, Stdio},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Grabs single frames from the platform capture device through `ffmpeg`.
///
/// The device exposes no exposure controls through this path, so every
/// range is absent and setters report `NotImplemented`.
pub struct FfmpegCameraDriver {
    config: PluginConfig,
    view_finder: Option<ViewFinder>,
    child: Option<Child>,
}

impl core::fmt::Debug for FfmpegCameraDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FfmpegCameraDriver")
            .field("config", &self.config)
            .field("view_finder", &self.view_finder)
            .field("child", &self.child.as_ref().map(|_| "<child>"))
            .finish()
    }
}

impl FfmpegCameraDriver {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            config,
            view_finder: None,
            child: None,
        }
    }

    #[inline]
    fn now_ns_best_effort() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    fn check_installed() -> Result<(), CameraError> {
        let status = Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| CameraError::unavailable_with("ffmpeg could not be started", e))?;
        if status.success() {
            Ok(())
        } else {
            Err(CameraError::unavailable(format!("ffmpeg -version exited with {status}")))
        }
    }

    fn stop_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            #[cfg(unix)]
            {
                unsafe {
                    let _ = libc::kill(child.id() as i32, libc::SIGTERM);
                }
                let start = std::time::Instant::now();
                while start.elapsed() < Duration::from_millis(900) {
                    if let Ok(Some(_)) = child.try_wait() {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl dogma::Named for FfmpegCameraDriver {
    fn name(&self) -> Cow<'_, str> {
        "ffmpeg".into()
    }
}

impl CameraDriver for FfmpegCameraDriver {
    fn backend(&self) -> CameraBackend {
        CameraBackend::Ffmpeg
    }

    fn open(
        &mut self,
        _config: &CameraConfiguration,
        view_finder: ViewFinder,
    ) -> Result<(), CameraError> {
        Self::check_installed()?;
        #[cfg(target_os = "linux")]
        {
            let device = get_input_device(self.config.device.as_deref().unwrap_or("0").trim());
            if !std::path::Path::new(&device).exists() {
                return Err(CameraError::unavailable(format!("no capture device at {device}")));
            }
        }
        self.view_finder = Some(view_finder);
        Ok(())
    }

    fn close(&mut self) -> Result<(), CameraError> {
        self.stop_child();
        self.view_finder = None;
        Ok(())
    }

    fn set_view_finder(&mut self, view_finder: ViewFinder) -> Result<(), CameraError> {
        self.view_finder = Some(view_finder);
        Ok(())
    }

    fn take_picture(&mut self) -> Result<Frame, CameraError> {
        let mut child = spawn_grabber(&self.config)?;
        let stdout = child.stdout.take();
        self.child = Some(child);

        let Some(mut stdout) = stdout else {
            self.stop_child();
            return Err(CameraError::capture(
                "reading ffmpeg output",
                std::io::Error::other("ffmpeg stdout not piped"),
            ));
        };

        let width = self.config.width;
        let height = self.config.height;
        let stride = width.saturating_mul(3);
        let mut buf = vec![0u8; (stride as usize).saturating_mul(height as usize)];

        let read = stdout.read_exact(&mut buf);
        self.stop_child();
        read.map_err(|e| CameraError::capture("reading ffmpeg output", e))?;

        Ok(Frame::new_rgb8(Bytes::from(buf), width, height, stride)
            .with_timestamp_ns(Self::now_ns_best_effort()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for FfmpegCameraDriver {
    fn drop(&mut self) {
        self.stop_child();
    }
}

fn spawn_grabber(config: &PluginConfig) -> Result<Child, CameraError> {
    let device = config.device.as_deref().unwrap_or("").trim();
    let input_device = get_input_device(device);

    const INPUT_FRAMERATE: u32 = 30;

    let mut ffargs: Vec<String> = vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-nostats".into(),
        "-f".into(),
        ffmpeg_format().into(),
        "-loglevel".into(),
        "error".into(),
        "-video_size".into(),
        format!("{}x{}", config.width, config.height),
        "-framerate".into(),
        INPUT_FRAMERATE.to_string(),
    ];

    #[cfg(target_os = "macos")]
    {
        ffargs.push("-pixel_format".into());
        ffargs.push("0rgb".into());
    }

    ffargs.extend([
        "-i".into(),
        input_device,
        "-frames:v".into(),
        "1".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-f".into(),
        "rawvideo".into(),
        "pipe:1".into(),
    ]);

    let stderr = if config.diagnostics || env::var_os("CAMERA2_FFMPEG_STDERR").is_some() {
        Stdio::inherit()
    } else {
        Stdio::null()
    };

    Command::new("ffmpeg")
        .args(&ffargs)
        .stdout(Stdio::piped())
        .stderr(stderr)
        .spawn()
        .map_err(|e| CameraError::capture("spawning ffmpeg", e))
}

#[cfg(target_os = "macos")]
fn ffmpeg_format() -> &'static str {
    "avfoundation"
}

#[cfg(target_os = "linux")]
fn ffmpeg_format() -> &'static str {
    "v4l2"
}

#[cfg(target_os = "windows")]
fn ffmpeg_format() -> &'static str {
    "dshow"
}

#[cfg(target_os = "macos")]
fn get_input_device(device: &str) -> String {
    let d = device.strip_prefix("avf:").unwrap_or(device);
    if d.is_empty() { "0".to_string() } else { d.to_string() }
}

#[cfg(target_os = "linux")]
fn get_input_device(device: &str) -> String {
    let d = device.strip_prefix("file:").unwrap_or(device);
    if d.is_empty() {
        "/dev/video0".to_string()
    } else if d.chars().all(|c| c.is_ascii_digit()) {
        format!("/dev/video{d}")
    } else {
        d.to_string()
    }
}

#[cfg(target_os = "windows")]
fn get_input_device(device: &str) -> String {
    let d = device.strip_prefix("dshow:").unwrap_or(device);
    if d.is_empty() {
        "video=default".to_string()
    } else {
        d.to_string()
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn linux_device_names() {
        assert_eq!(get_input_device(""), "/dev/video0");
        assert_eq!(get_input_device("2"), "/dev/video2");
        assert_eq!(get_input_device("file:/dev/video5"), "/dev/video5");
    }

    #[test]
    fn exposes_no_controls() {
        use crate::shared::{Method, Parameter};
        let mut driver = FfmpegCameraDriver::new(PluginConfig::default());
        assert_eq!(driver.range(Parameter::Iso), None);
        let err = driver.set_parameter(Parameter::Iso, 100.0).unwrap_err();
        assert_eq!(err.method(), Some(Method::SetIso));
    }
}
