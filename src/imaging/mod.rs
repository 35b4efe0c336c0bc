//! Image processors, encoders and analysers built on the `image` crate.
//!
//! These are the collaborators the CLI registers on its [`App`](af_job::App).
//! Decoding and encoding are CPU-bound and run on tokio's blocking pool.

mod analysers;
mod encoders;
mod processors;

pub use analysers::{analysers, ImageAnalyser};
pub use encoders::{encoders, ImageEncoder};
pub use processors::{processors, ImageProcessor, Operation};

use std::io::Cursor;

use af_core::config::ResizeFilter;
use af_core::{Error, Result};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde_json::Value;

/// Run CPU-heavy image work off the async runtime.
async fn blocking<T, F>(operation: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(format!("{operation}: spawn_blocking join error: {e}")))?
}

fn decode(operation: &str, data: &[u8]) -> Result<(DynamicImage, ImageFormat)> {
    let format = image::guess_format(data).unwrap_or(ImageFormat::Png);
    let img = image::load_from_memory(data)
        .map_err(|e| Error::processing(operation, format!("failed to decode image: {e}")))?;
    Ok((img, format))
}

/// Encode `img` as `format`, converting pixel layouts the target cannot hold.
fn encode(operation: &str, img: &DynamicImage, format: ImageFormat, jpeg_quality: u8) -> Result<Bytes> {
    let mut buf = Cursor::new(Vec::new());
    let written = match format {
        ImageFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut buf,
                jpeg_quality.clamp(1, 100),
            );
            rgb.write_with_encoder(encoder)
        }
        ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, format),
        _ => img.write_to(&mut buf, format),
    };
    written.map_err(|e| Error::processing(operation, format!("failed to encode image: {e}")))?;
    Ok(Bytes::from(buf.into_inner()))
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Triangle => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Gaussian => FilterType::Gaussian,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

/// Read the `index`th parameter as a non-negative integer.
///
/// Numeric strings are accepted so hand-written recipes can quote values.
fn u32_param(operation: &str, params: &[Value], index: usize, label: &str) -> Result<u32> {
    let value = params
        .get(index)
        .ok_or_else(|| Error::invalid_params(operation, format!("missing {label}")))?;
    let number = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    number
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            Error::invalid_params(
                operation,
                format!("{label} must be a non-negative integer, got {value}"),
            )
        })
}

/// Canonical lowercase name for a format ("png", "jpg", ...).
fn format_name(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("unknown")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A `width`x`height` PNG with a horizontal red gradient.
    pub fn png(width: u32, height: u32) -> Bytes {
        let img = image::RgbImage::from_fn(width, height, |x, _| {
            image::Rgb([(x * 255 / width.max(1)) as u8, 0, 0])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        Bytes::from(buf.into_inner())
    }
}
