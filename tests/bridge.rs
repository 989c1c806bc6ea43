// This is free and unencumbered software released into the public domain.

use base64::{Engine, engine::general_purpose::STANDARD};
use camera2_plugin::shared::{
    Bridge, CameraBackend, ErrorKind, ExifData, FallbackCamera, Method, NativeCamera,
    PluginConfig, Rejection, Request, Response, SyntheticCameraDriver, imaging,
};
use image::{DynamicImage, RgbImage};
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

fn synthetic(root: &Path) -> Bridge {
    let config = PluginConfig::new(64, 48)
        .with_backend(CameraBackend::Synthetic)
        .with_storage_root(root);
    Bridge::open(&config)
}

fn resolved(bridge: &Bridge, method: &str, options: Value) -> Value {
    match bridge.handle(Request::new(method, options)) {
        Response::Resolved { value } => value,
        Response::Rejected { error } => panic!("{method} rejected: {error:?}"),
    }
}

fn rejected(bridge: &Bridge, method: &str, options: Value) -> Rejection {
    match bridge.handle(Request::new(method, options)) {
        Response::Rejected { error } => error,
        Response::Resolved { value } => panic!("{method} resolved with {value}"),
    }
}

fn sample_jpeg() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(48, 32, |x, y| {
        image::Rgb([(x * 5) as u8, (y * 7) as u8, 90])
    }));
    imaging::encode_jpeg(&image, 90).unwrap()
}

fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap_or_else(|| panic!("{value} is not a number"));
    assert!((actual - expected).abs() < 1e-6, "{actual} != {expected}");
}

#[test]
fn ranges_are_absent_once_stopped() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());

    resolved(&bridge, "start", json!({ "width": 100, "height": 200 }));
    let range = resolved(&bridge, "getShutterSpeedRange", Value::Null);
    assert_close(&range["min"], 1.0 / 8000.0);
    assert_close(&range["max"], 30.0);

    resolved(&bridge, "stop", Value::Null);
    assert!(resolved(&bridge, "getShutterSpeedRange", Value::Null).is_null());
    assert!(resolved(&bridge, "getExposureCompensationInfo", Value::Null).is_null());
}

#[test]
fn capture_writes_picture_and_thumbnail() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());
    resolved(&bridge, "start", json!({}));

    let value = resolved(
        &bridge,
        "capture",
        json!({
            "picturePath": "shot.jpg",
            "thumbnailPath": "shot_thumb.jpg",
            "thumbnailWidth": 32,
            "thumbnailHeight": 24,
        }),
    );
    assert!(value.is_null());

    assert_eq!(
        image::image_dimensions(dir.path().join("shot.jpg")).unwrap(),
        (64, 48)
    );
    assert_eq!(
        image::image_dimensions(dir.path().join("shot_thumb.jpg")).unwrap(),
        (32, 24)
    );
}

#[test]
fn capture_without_thumbnail_writes_only_the_picture() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());
    resolved(&bridge, "start", json!({}));

    resolved(&bridge, "capture", json!({ "picturePath": "only.jpg" }));
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec!["only.jpg"]);
}

#[test]
fn captured_pictures_carry_the_current_settings() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());
    resolved(&bridge, "start", json!({}));
    resolved(&bridge, "getIsoRange", Value::Null);
    resolved(&bridge, "setIso", json!({ "value": 400 }));
    resolved(&bridge, "setShutterSpeed", json!({ "value": 0.004 }));
    resolved(&bridge, "capture", json!({ "picturePath": "tagged.jpg" }));

    let exif = resolved(&bridge, "getExifData", json!({ "path": "tagged.jpg" }));
    assert_eq!(exif["iso"], 400);
    assert_close(&exif["shutterSpeed"], 0.004);
    assert!(exif["aperture"].is_null());
    assert_close(&exif["focalLength"], 4.25);
}

#[test]
fn exif_fields_are_absent_when_untagged() {
    let dir = TempDir::new().unwrap();
    let plain = dir.path().join("plain.jpg");
    std::fs::write(&plain, sample_jpeg()).unwrap();
    let partial = dir.path().join("partial.jpg");
    let tags = ExifData {
        aperture: Some(2.8),
        ..ExifData::default()
    };
    std::fs::write(&partial, imaging::embed_exif(&sample_jpeg(), &tags).unwrap()).unwrap();

    let bridge = synthetic(dir.path());
    let exif = resolved(&bridge, "getExifData", json!({ "path": "plain.jpg" }));
    assert_eq!(
        exif,
        json!({ "iso": null, "shutterSpeed": null, "aperture": null, "focalLength": null })
    );

    let exif = resolved(&bridge, "getExifData", json!({ "path": "partial.jpg" }));
    assert!(exif["iso"].is_null());
    assert_close(&exif["aperture"], 2.8);
}

#[test]
fn exif_fields_are_read_when_tagged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("full.jpg");
    let tags = ExifData {
        iso: Some(200),
        shutter_speed: Some(1.0 / 250.0),
        aperture: Some(2.8),
        focal_length: Some(4.25),
    };
    std::fs::write(&path, imaging::embed_exif(&sample_jpeg(), &tags).unwrap()).unwrap();

    let bridge = synthetic(dir.path());
    let exif = resolved(
        &bridge,
        "getExifData",
        json!({ "path": path.to_str().unwrap() }),
    );
    assert_eq!(exif["iso"], 200);
    assert_close(&exif["shutterSpeed"], 0.004);
    assert_close(&exif["aperture"], 2.8);
    assert_close(&exif["focalLength"], 4.25);
}

#[test]
fn unreadable_pictures_fail_to_decode() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
    let bridge = synthetic(dir.path());

    let error = rejected(&bridge, "getExifData", json!({ "path": "notes.txt" }));
    assert_eq!(error.kind, ErrorKind::DecodeFailed);
    let error = rejected(&bridge, "getExifData", json!({ "path": "missing.jpg" }));
    assert_eq!(error.kind, ErrorKind::DecodeFailed);
}

#[test]
fn thumbnails_from_files_and_base64() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("source.jpg"), sample_jpeg()).unwrap();
    let bridge = synthetic(dir.path());

    for picture in ["source.jpg".to_string(), STANDARD.encode(sample_jpeg())] {
        let value = resolved(
            &bridge,
            "pictureToThumbnail",
            json!({ "picture": picture, "width": 12, "height": 8, "quality": 70 }),
        );
        let bytes = STANDARD
            .decode(value["thumbnail"].as_str().unwrap())
            .unwrap();
        let thumbnail = image::load_from_memory(&bytes).unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (12, 8));
    }

    let error = rejected(
        &bridge,
        "pictureToThumbnail",
        json!({ "picture": "source.jpg", "width": 0, "height": 8 }),
    );
    assert_eq!(error.kind, ErrorKind::InvalidConfiguration);
    let error = rejected(
        &bridge,
        "pictureToThumbnail",
        json!({ "picture": "@@not-an-image@@", "width": 4, "height": 4 }),
    );
    assert_eq!(error.kind, ErrorKind::DecodeFailed);
}

#[test]
fn fallback_rejects_everything_but_echo() {
    let bridge = Bridge::new(Box::new(FallbackCamera));
    let options = json!({
        "value": 1,
        "width": 10,
        "height": 10,
        "picture": "x.jpg",
        "path": "x.jpg",
    });

    for method in Method::ALL.into_iter().filter(|m| *m != Method::Echo) {
        let error = rejected(&bridge, &method.to_string(), options.clone());
        assert_eq!(error.kind, ErrorKind::NotImplemented);
        assert_eq!(error.method, method.to_string());
        assert_eq!(
            error.message,
            format!("Method {method} is not implemented on this platform")
        );
    }
}

#[test]
fn echo_returns_its_input_on_both_paths() {
    let dir = TempDir::new().unwrap();
    for bridge in [synthetic(dir.path()), Bridge::new(Box::new(FallbackCamera))] {
        assert_eq!(
            resolved(&bridge, "echo", json!({ "value": "hello" })),
            json!({ "value": "hello" })
        );
        assert_eq!(
            resolved(&bridge, "echo", json!({ "value": "" })),
            json!({ "value": "" })
        );
    }
}

#[test]
fn stop_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());

    resolved(&bridge, "stop", Value::Null);
    resolved(&bridge, "start", json!({}));
    resolved(&bridge, "stop", Value::Null);
    resolved(&bridge, "stop", Value::Null);
    resolved(&bridge, "start", json!({}));
}

#[test]
fn setters_honor_range_endpoints() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());
    resolved(&bridge, "start", json!({}));

    let range = resolved(&bridge, "getIsoRange", Value::Null);
    assert_eq!(range, json!({ "min": 50.0, "max": 3200.0 }));
    resolved(&bridge, "setIso", json!({ "value": 50 }));
    resolved(&bridge, "setIso", json!({ "value": 3200 }));

    for value in [49.5, 3200.5] {
        let error = rejected(&bridge, "setIso", json!({ "value": value }));
        assert_eq!(error.kind, ErrorKind::OutOfRange);
        assert!(error.message.contains("ISO"), "{}", error.message);
    }

    let info = resolved(&bridge, "getExposureCompensationInfo", Value::Null);
    assert_close(&info["step"], 1.0 / 3.0);
    resolved(&bridge, "setExposureCompensation", json!({ "value": -2 }));
    let error = rejected(&bridge, "setExposureCompensation", json!({ "value": 2.5 }));
    assert_eq!(error.kind, ErrorKind::OutOfRange);
}

#[test]
fn session_calls_require_start() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());

    let calls = [
        ("setViewFinderSize", json!({ "width": 10, "height": 10 })),
        ("setShutterSpeed", json!({ "value": 0.01 })),
        ("setAperture", json!({ "value": 2.8 })),
        ("setIso", json!({ "value": 100 })),
        ("setExposureCompensation", json!({ "value": 0 })),
        ("capture", json!({ "picturePath": "never.jpg" })),
    ];
    for (method, options) in calls {
        let error = rejected(&bridge, method, options);
        assert_eq!(error.kind, ErrorKind::NoActiveSession, "{method}");
    }
    assert!(!dir.path().join("never.jpg").exists());
}

#[test]
fn second_start_is_rejected_and_keeps_the_session() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());
    resolved(&bridge, "start", json!({ "width": 320, "height": 240 }));

    let error = rejected(&bridge, "start", json!({ "width": 640, "height": 480 }));
    assert_eq!(error.kind, ErrorKind::AlreadyStarted);
    assert!(!resolved(&bridge, "getApertureRange", Value::Null).is_null());
}

#[test]
fn invalid_configuration_leaves_the_session_idle() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());

    let error = rejected(&bridge, "start", json!({ "width": -1 }));
    assert_eq!(error.kind, ErrorKind::InvalidConfiguration);
    let error = rejected(&bridge, "start", json!({ "height": 100, "paddingBottom": 100 }));
    assert_eq!(error.kind, ErrorKind::InvalidConfiguration);

    let error = rejected(&bridge, "setIso", json!({ "value": 100 }));
    assert_eq!(error.kind, ErrorKind::NoActiveSession);
}

#[test]
fn unknown_methods_are_rejected() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());

    let error = rejected(&bridge, "setZoom", json!({ "value": 2 }));
    assert_eq!(error.kind, ErrorKind::UnknownMethod);
    assert_eq!(error.method, "setZoom");
}

#[test]
fn unavailable_camera_is_reported() {
    let config = PluginConfig::new(16, 16);
    let mut driver = SyntheticCameraDriver::new(config.clone());
    driver.set_busy(true);
    let bridge = Bridge::new(Box::new(NativeCamera::new(config, Box::new(driver))));

    let error = rejected(&bridge, "start", json!({}));
    assert_eq!(error.kind, ErrorKind::CameraUnavailable);
    let error = rejected(&bridge, "capture", json!({}));
    assert_eq!(error.kind, ErrorKind::NoActiveSession);
}

#[test]
fn failed_capture_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let config = PluginConfig::new(16, 16).with_storage_root(dir.path());
    let mut driver = SyntheticCameraDriver::new(config.clone());
    driver.set_fail_capture(true);
    let bridge = Bridge::new(Box::new(NativeCamera::new(config, Box::new(driver))));

    resolved(&bridge, "start", json!({}));
    let error = rejected(&bridge, "capture", json!({ "picturePath": "broken.jpg" }));
    assert_eq!(error.kind, ErrorKind::CaptureFailed);
    assert!(!dir.path().join("broken.jpg").exists());
}

#[test]
fn session_independent_methods_ignore_the_session() {
    let dir = TempDir::new().unwrap();
    let source = DynamicImage::ImageRgb8(RgbImage::from_fn(48, 32, |x, y| {
        image::Rgb([(x * 5) as u8, (y * 7) as u8, 90])
    }));
    let tags = ExifData {
        iso: Some(200),
        shutter_speed: Some(1.0 / 60.0),
        aperture: Some(2.8),
        focal_length: Some(4.25),
    };
    imaging::write_picture(&source, &dir.path().join("tagged.jpg"), &tags).unwrap();
    let bridge = synthetic(dir.path());

    let thumbnail_options = json!({ "picture": "tagged.jpg", "width": 16, "height": 12 });
    let exif_options = json!({ "path": "tagged.jpg" });

    let idle_thumbnail = resolved(&bridge, "pictureToThumbnail", thumbnail_options.clone());
    let idle_exif = resolved(&bridge, "getExifData", exif_options.clone());
    assert_eq!(idle_exif["iso"], 200);

    resolved(&bridge, "start", json!({}));
    let active_thumbnail = resolved(&bridge, "pictureToThumbnail", thumbnail_options);
    let active_exif = resolved(&bridge, "getExifData", exif_options);
    resolved(&bridge, "stop", Value::Null);

    assert_eq!(idle_thumbnail, active_thumbnail);
    assert_eq!(idle_exif, active_exif);
}

#[test]
fn failed_thumbnail_rejects_the_whole_capture() {
    let dir = TempDir::new().unwrap();
    let bridge = synthetic(dir.path());
    resolved(&bridge, "start", json!({}));

    let error = rejected(
        &bridge,
        "capture",
        json!({
            "picturePath": "shot.jpg",
            "thumbnailPath": "nodir/t.jpg",
            "thumbnailWidth": 8,
            "thumbnailHeight": 8,
        }),
    );
    assert_eq!(error.kind, ErrorKind::CaptureFailed);
    assert!(!dir.path().join("shot.jpg").exists());
    assert!(!dir.path().join("nodir/t.jpg").exists());

    let error = rejected(
        &bridge,
        "capture",
        json!({
            "picturePath": "huge.jpg",
            "thumbnailPath": "huge_thumb.jpg",
            "thumbnailWidth": 100000,
            "thumbnailHeight": 100000,
        }),
    );
    assert_eq!(error.kind, ErrorKind::InvalidConfiguration);
    assert!(!dir.path().join("huge.jpg").exists());

    resolved(&bridge, "capture", json!({ "picturePath": "shot.jpg" }));
    assert!(dir.path().join("shot.jpg").is_file());
}
