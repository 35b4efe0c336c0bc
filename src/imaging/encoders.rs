use std::sync::Arc;

use af_core::config::ImagingConfig;
use af_core::{Error, Result};
use af_job::{Artifact, Encoder, Encoders};
use async_trait::async_trait;
use bytes::Bytes;
use image::ImageFormat;
use serde_json::Value;

use super::{blocking, decode, encode, format_name, u32_param};

/// Re-encodes any decodable image into one target format.
///
/// JPEG takes an optional quality parameter (1-100); other formats take
/// none.
#[derive(Debug, Clone)]
pub struct ImageEncoder {
    format: ImageFormat,
    default_quality: u8,
}

impl ImageEncoder {
    pub fn new(format: ImageFormat, config: &ImagingConfig) -> Self {
        Self {
            format,
            default_quality: config.jpeg_quality,
        }
    }

    fn quality(&self, params: &[Value]) -> Result<u8> {
        let name = format_name(self.format);
        if params.is_empty() {
            return Ok(self.default_quality);
        }
        if self.format != ImageFormat::Jpeg {
            return Err(Error::invalid_params(name, "this format takes no parameters"));
        }
        match u32_param(name, params, 0, "quality")? {
            q @ 1..=100 => Ok(q as u8),
            other => Err(Error::invalid_params(
                name,
                format!("quality must be 1-100, got {other}"),
            )),
        }
    }
}

#[async_trait]
impl Encoder for ImageEncoder {
    async fn encode(&self, artifact: &Artifact, params: &[Value]) -> Result<Bytes> {
        let quality = self.quality(params)?;
        let target = self.format;
        let data = artifact.data().clone();
        let name = format_name(target);
        blocking(name, move || {
            let (img, source) = decode(name, &data)?;
            tracing::debug!("Encoding {} as {name}", format_name(source));
            encode(name, &img, target, quality)
        })
        .await
    }
}

/// Formats the encoder registry accepts, by name.
const FORMATS: [(&str, ImageFormat); 6] = [
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tiff", ImageFormat::Tiff),
];

/// Registry with an [`ImageEncoder`] for each supported format.
pub fn encoders(config: &ImagingConfig) -> Encoders {
    let mut registry = Encoders::new();
    for (name, format) in FORMATS {
        registry.register(name, Arc::new(ImageEncoder::new(format, config)));
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::test_support::png;
    use af_job::params;
    use assert_matches::assert_matches;

    async fn encode_as(format: &str, params: Vec<Value>) -> Result<Bytes> {
        encoders(&ImagingConfig::default())
            .encode(&Artifact::new(png(16, 16)), format, &params)
            .await
    }

    #[tokio::test]
    async fn encodes_each_format() {
        for (name, format) in FORMATS {
            let out = encode_as(name, params![]).await.unwrap();
            assert_eq!(image::guess_format(&out).unwrap(), format, "{name}");
        }
    }

    #[tokio::test]
    async fn jpeg_quality_changes_output() {
        let low = encode_as("jpg", params![5]).await.unwrap();
        let high = encode_as("jpg", params![100]).await.unwrap();
        assert!(low.len() < high.len());
    }

    #[tokio::test]
    async fn rejects_bad_parameters() {
        assert_matches!(
            encode_as("jpg", params![0]).await,
            Err(Error::InvalidParams { .. })
        );
        assert_matches!(
            encode_as("png", params![9]).await,
            Err(Error::InvalidParams { .. })
        );
    }

    #[tokio::test]
    async fn unknown_format() {
        assert_matches!(
            encode_as("heic", params![]).await,
            Err(Error::UnknownEncoder(_))
        );
    }
}
