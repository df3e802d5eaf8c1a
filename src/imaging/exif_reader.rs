//! EXIF extraction on top of `kamadak-exif`.
//!
//! Only the primary IFD is consulted. Values are normalized on the way out:
//!
//! | Field | EXIF tag | Normalization |
//! |---|---|---|
//! | orientation | `Orientation` | integer 1–8 |
//! | taken_at | `DateTimeOriginal` | `YYYY:MM:DD HH:MM:SS` → ISO-8601 |
//! | make / model / lens | `Make` / `Model` / `LensModel` | trimmed, NULs stripped, empty → `None` |
//! | iso | `PhotographicSensitivity` | first value |
//! | aperture / focal_length / exposure_time | `FNumber` / `FocalLength` / `ExposureTime` | rational → `f64` |
//! | gps | `GPSLatitude(Ref)` / `GPSLongitude(Ref)` | DMS → signed decimal degrees |

use super::backend::{ExifData, GpsCoordinates};
use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the EXIF block of an image file.
///
/// Returns `None` when the file can't be opened or carries no EXIF data.
pub fn read_exif(path: &Path) -> Option<ExifData> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader).ok()?;
    Some(extract(&exif))
}

/// Map the fields we care about out of a parsed EXIF block.
pub fn extract(exif: &Exif) -> ExifData {
    ExifData {
        orientation: uint_field(exif, Tag::Orientation),
        taken_at: ascii_field(exif, Tag::DateTimeOriginal).and_then(|s| exif_datetime_to_iso(&s)),
        make: ascii_field(exif, Tag::Make),
        model: ascii_field(exif, Tag::Model),
        lens: ascii_field(exif, Tag::LensModel),
        iso: uint_field(exif, Tag::PhotographicSensitivity),
        aperture: rational_field(exif, Tag::FNumber),
        focal_length: rational_field(exif, Tag::FocalLength),
        exposure_time: rational_field(exif, Tag::ExposureTime),
        gps: gps_coordinates(exif),
    }
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts.first().and_then(|bytes| clean_ascii(bytes)),
        _ => None,
    }
}

fn uint_field(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn rational_field(exif: &Exif, tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let value = match &field.value {
        Value::Rational(values) => values.first().map(|r| r.to_f64()),
        Value::SRational(values) => values.first().map(|r| r.to_f64()),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn gps_coordinates(exif: &Exif) -> Option<GpsCoordinates> {
    let lat = gps_axis(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
    let lon = gps_axis(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
    Some(GpsCoordinates { lat, lon })
}

fn gps_axis(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let parts: Vec<f64> = match &field.value {
        Value::Rational(values) => values.iter().map(|r| r.to_f64()).collect(),
        _ => return None,
    };
    let reference = ascii_field(exif, ref_tag);
    dms_to_degrees(&parts, reference.as_deref())
}

/// Convert degrees/minutes/seconds to signed decimal degrees.
///
/// `S` and `W` references produce negative values. Missing minutes or
/// seconds count as zero; an empty or non-finite input yields `None`.
pub fn dms_to_degrees(parts: &[f64], reference: Option<&str>) -> Option<f64> {
    let degrees = *parts.first()?;
    let minutes = parts.get(1).copied().unwrap_or(0.0);
    let seconds = parts.get(2).copied().unwrap_or(0.0);
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    if !value.is_finite() {
        return None;
    }
    let negative = reference
        .map(|r| r.trim().eq_ignore_ascii_case("S") || r.trim().eq_ignore_ascii_case("W"))
        .unwrap_or(false);
    Some(if negative { -value } else { value })
}

/// Decode an EXIF ASCII value: strip trailing NULs and whitespace.
pub fn clean_ascii(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Convert EXIF's `YYYY:MM:DD HH:MM:SS` into `YYYY-MM-DDTHH:MM:SS`.
///
/// EXIF timestamps carry no zone, so the result is a local (naive) time.
pub fn exif_datetime_to_iso(value: &str) -> Option<String> {
    let parsed = NaiveDateTime::parse_from_str(value.trim(), "%Y:%m:%d %H:%M:%S").ok()?;
    Some(parsed.format("%Y-%m-%dT%H:%M:%S").to_string())
}
