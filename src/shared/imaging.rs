// This is free and unencumbered software released into the public domain.

//! Picture files: encoding, thumbnails and EXIF tags.
//!
//! Everything here is independent of the camera session.

use crate::shared::{CameraError, ExifData, ThumbnailSpec};
use base64::{Engine, engine::general_purpose::STANDARD};
use exif::{Field, In, Rational, Tag, Value, experimental::Writer};
use image::{
    DynamicImage, ImageFormat, ImageReader, codecs::jpeg::JpegEncoder, imageops::FilterType,
};
use std::{
    fs::File,
    io::{self, BufReader, Cursor, Write},
    path::Path,
};
use tempfile::NamedTempFile;

const PICTURE_QUALITY: u8 = 95;
const EXIF_HEADER: &[u8] = b"Exif\0\0";

pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    image.to_rgb8().write_with_encoder(encoder)?;
    Ok(out)
}

/// Scales `image` to exactly `width` x `height`.
pub fn thumbnail(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    image.resize_exact(width, height, FilterType::Triangle)
}

/// Turns `image` clockwise by `degrees`. Angles that are not a multiple of
/// 90 leave it as is.
pub fn rotate(image: DynamicImage, degrees: u32) -> DynamicImage {
    match degrees % 360 {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    }
}

/// Writes the full picture, in the format named by the extension (JPEG
/// otherwise). JPEG output carries `metadata` as EXIF tags.
pub fn write_picture(
    image: &DynamicImage,
    path: &Path,
    metadata: &ExifData,
) -> Result<(), CameraError> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
    write_atomically(path, |file| {
        if format == ImageFormat::Jpeg {
            let mut bytes = encode_jpeg(image, PICTURE_QUALITY)
                .map_err(|e| CameraError::capture("encoding picture", e))?;
            if !metadata.is_empty() {
                bytes = embed_exif(&bytes, metadata)
                    .map_err(|e| CameraError::capture("writing picture metadata", e))?;
            }
            file.write_all(&bytes)
                .map_err(|e| CameraError::capture("writing picture", e))
        } else {
            image
                .write_to(file.as_file_mut(), format)
                .map_err(|e| CameraError::capture("writing picture", e))
        }
    })
}

pub fn write_thumbnail(
    image: &DynamicImage,
    spec: &ThumbnailSpec,
    path: &Path,
) -> Result<(), CameraError> {
    write_atomically(path, |file| {
        let bytes = encode_jpeg(&thumbnail(image, spec.width, spec.height), spec.quality)
            .map_err(|e| CameraError::capture("encoding thumbnail", e))?;
        file.write_all(&bytes)
            .map_err(|e| CameraError::capture("writing thumbnail", e))
    })
}

/// Runs `write` against a temporary file next to `path` and moves it into
/// place once complete. On failure `path` is left as it was.
fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut NamedTempFile) -> Result<(), CameraError>,
) -> Result<(), CameraError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file =
        NamedTempFile::new_in(dir).map_err(|e| CameraError::capture("creating output file", e))?;
    write(&mut file)?;
    file.persist(path)
        .map_err(|e| CameraError::capture("moving output into place", e.error))?;
    Ok(())
}

/// Loads the source of `pictureToThumbnail`: a file when `path` exists,
/// otherwise `picture` read as base64 (optionally a `data:` URL).
pub fn load_picture(picture: &str, path: &Path) -> Result<DynamicImage, CameraError> {
    if path.is_file() {
        return decode_file(path);
    }

    let payload = match picture.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => picture,
    };
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(payload.as_bytes()).map_err(|_| {
        CameraError::decode(
            path.display().to_string(),
            io::Error::new(io::ErrorKind::NotFound, "not a readable file or base64 image"),
        )
    })?;
    image::load_from_memory(&bytes).map_err(|e| CameraError::decode("<base64 data>", e))
}

fn decode_file(path: &Path) -> Result<DynamicImage, CameraError> {
    let name = || path.display().to_string();
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| CameraError::decode(name(), e))?
        .decode()
        .map_err(|e| CameraError::decode(name(), e))
}

/// Base64 of a JPEG thumbnail of `image`.
pub fn thumbnail_base64(
    image: &DynamicImage,
    width: u32,
    height: u32,
    quality: u8,
) -> Result<String, CameraError> {
    let bytes = encode_jpeg(&thumbnail(image, width, height), quality)
        .map_err(|e| CameraError::decode("<thumbnail>", e))?;
    Ok(STANDARD.encode(bytes))
}

/// Reads exposure tags from the image at `path`. Missing tags, or a missing
/// or unreadable EXIF block, leave the fields empty; a file that is not an
/// image at all is `DecodeFailed`.
pub fn read_exif(path: &Path) -> Result<ExifData, CameraError> {
    let name = || path.display().to_string();
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| CameraError::decode(name(), e))?
        .into_dimensions()
        .map_err(|e| CameraError::decode(name(), e))?;

    let file = File::open(path).map_err(|e| CameraError::decode(name(), e))?;
    let exif = match exif::Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(ExifData::default()),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring unreadable EXIF block");
            return Ok(ExifData::default());
        },
    };

    let field = |tag| exif.get_field(tag, In::PRIMARY);
    Ok(ExifData {
        iso: field(Tag::PhotographicSensitivity).and_then(|f| f.value.get_uint(0)),
        shutter_speed: field(Tag::ExposureTime).and_then(number),
        aperture: field(Tag::FNumber).and_then(number),
        focal_length: field(Tag::FocalLength).and_then(number),
    })
}

fn number(field: &Field) -> Option<f64> {
    let value = match &field.value {
        Value::Rational(v) => v.first().map(|r| r.to_f64()),
        other => other.get_uint(0).map(f64::from),
    };
    value.filter(|v| v.is_finite())
}

/// Encodes `data` as a little-endian TIFF structure for an APP1 segment.
pub fn exif_tiff(data: &ExifData) -> Result<Vec<u8>, exif::Error> {
    let mut fields = Vec::new();
    let mut push = |tag, value| {
        fields.push(Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        })
    };

    if let Some(iso) = data.iso {
        push(
            Tag::PhotographicSensitivity,
            Value::Short(vec![iso.min(u16::MAX as u32) as u16]),
        );
    }
    if let Some(r) = data.shutter_speed.and_then(exposure_rational) {
        push(Tag::ExposureTime, Value::Rational(vec![r]));
    }
    if let Some(r) = data.aperture.and_then(|v| fixed_rational(v, 10)) {
        push(Tag::FNumber, Value::Rational(vec![r]));
    }
    if let Some(r) = data.focal_length.and_then(|v| fixed_rational(v, 100)) {
        push(Tag::FocalLength, Value::Rational(vec![r]));
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, true)?;
    Ok(buf.into_inner())
}

/// Exposure times below a second are stored as `1/n` when `n` is whole.
fn exposure_rational(seconds: f64) -> Option<Rational> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let inverse = 1.0 / seconds;
    if seconds < 1.0 && (inverse - inverse.round()).abs() < 1e-6 && inverse <= u32::MAX as f64 {
        return Some(Rational {
            num: 1,
            denom: inverse.round() as u32,
        });
    }
    fixed_rational(seconds, 1_000_000)
}

fn fixed_rational(value: f64, denom: u32) -> Option<Rational> {
    let num = (value * denom as f64).round();
    (value.is_finite() && num >= 0.0 && num <= u32::MAX as f64).then(|| Rational {
        num: num as u32,
        denom,
    })
}

/// Inserts an EXIF APP1 segment right after the JPEG start-of-image marker.
pub fn embed_exif(jpeg: &[u8], data: &ExifData) -> Result<Vec<u8>, exif::Error> {
    if !jpeg.starts_with(&[0xFF, 0xD8]) {
        return Err(exif::Error::InvalidFormat("not a JPEG stream"));
    }
    let tiff = exif_tiff(data)?;
    let segment_len = 2 + EXIF_HEADER.len() + tiff.len();
    let segment_len = u16::try_from(segment_len)
        .map_err(|_| exif::Error::TooBig("EXIF segment exceeds 64 KiB"))?;

    let mut out = Vec::with_capacity(jpeg.len() + segment_len as usize + 2);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    Ok(out)
}
