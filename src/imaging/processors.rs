use std::sync::Arc;

use af_core::config::ImagingConfig;
use af_core::{Error, Result};
use af_job::{Artifact, Processor, Processors};
use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use serde_json::Value;

use super::{blocking, decode, encode, filter_type, u32_param};

/// The image operations available as processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `thumbnail(width, height)`: fit inside the box, keeping aspect ratio.
    Thumbnail,
    /// `resize(width, height)`: exact size.
    Resize,
    /// `crop(x, y, width, height)`.
    Crop,
    /// `greyscale()`.
    Greyscale,
    /// `rotate(degrees)` with degrees one of 90, 180, 270.
    Rotate,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Thumbnail,
        Operation::Resize,
        Operation::Crop,
        Operation::Greyscale,
        Operation::Rotate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Thumbnail => "thumbnail",
            Operation::Resize => "resize",
            Operation::Crop => "crop",
            Operation::Greyscale => "greyscale",
            Operation::Rotate => "rotate",
        }
    }
}

/// Decodes the artifact, applies one [`Operation`], and re-encodes in the
/// source format.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    operation: Operation,
    config: ImagingConfig,
}

impl ImageProcessor {
    pub fn new(operation: Operation, config: ImagingConfig) -> Self {
        Self { operation, config }
    }

    fn checked_dimensions(&self, params: &[Value]) -> Result<(u32, u32)> {
        let name = self.operation.name();
        let width = u32_param(name, params, 0, "width")?;
        let height = u32_param(name, params, 1, "height")?;
        let max = self.config.max_dimension;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(Error::invalid_params(
                name,
                format!("{width}x{height} is outside 1..={max}"),
            ));
        }
        Ok((width, height))
    }

    fn run(&self, img: DynamicImage, params: &[Value]) -> Result<DynamicImage> {
        let name = self.operation.name();
        match self.operation {
            Operation::Thumbnail => {
                let (width, height) = self.checked_dimensions(params)?;
                Ok(img.resize(width, height, filter_type(self.config.filter)))
            }
            Operation::Resize => {
                let (width, height) = self.checked_dimensions(params)?;
                Ok(img.resize_exact(width, height, filter_type(self.config.filter)))
            }
            Operation::Crop => {
                let x = u32_param(name, params, 0, "x")?;
                let y = u32_param(name, params, 1, "y")?;
                let (width, height) = self.checked_dimensions(params.get(2..).unwrap_or(&[]))?;
                let fits = x.checked_add(width).is_some_and(|r| r <= img.width())
                    && y.checked_add(height).is_some_and(|b| b <= img.height());
                if !fits {
                    return Err(Error::invalid_params(
                        name,
                        format!(
                            "{width}x{height}+{x}+{y} exceeds {}x{} image",
                            img.width(),
                            img.height()
                        ),
                    ));
                }
                Ok(img.crop_imm(x, y, width, height))
            }
            Operation::Greyscale => Ok(img.grayscale()),
            Operation::Rotate => match u32_param(name, params, 0, "degrees")? {
                90 => Ok(img.rotate90()),
                180 => Ok(img.rotate180()),
                270 => Ok(img.rotate270()),
                other => Err(Error::invalid_params(
                    name,
                    format!("degrees must be 90, 180 or 270, got {other}"),
                )),
            },
        }
    }
}

#[async_trait]
impl Processor for ImageProcessor {
    async fn process(&self, artifact: &Artifact, params: &[Value]) -> Result<Bytes> {
        let this = self.clone();
        let data = artifact.data().clone();
        let params = params.to_vec();
        blocking(self.operation.name(), move || {
            let name = this.operation.name();
            let (img, format) = decode(name, &data)?;
            let (in_width, in_height) = (img.width(), img.height());
            let out = this.run(img, &params)?;
            tracing::debug!(
                "{name}: {in_width}x{in_height} -> {}x{}",
                out.width(),
                out.height()
            );
            encode(name, &out, format, this.config.jpeg_quality)
        })
        .await
    }
}

/// Registry with every [`Operation`] registered under its name.
pub fn processors(config: &ImagingConfig) -> Processors {
    let mut registry = Processors::new();
    for operation in Operation::ALL {
        registry.register(
            operation.name(),
            Arc::new(ImageProcessor::new(operation, config.clone())),
        );
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::test_support::png;
    use af_job::params;
    use assert_matches::assert_matches;
    use image::{GenericImageView, ImageFormat};

    async fn run(operation: Operation, input: Bytes, params: Vec<Value>) -> Result<DynamicImage> {
        let processor = ImageProcessor::new(operation, ImagingConfig::default());
        let out = processor.process(&Artifact::new(input), &params).await?;
        Ok(image::load_from_memory(&out).unwrap())
    }

    #[tokio::test]
    async fn thumbnail_keeps_aspect_ratio() {
        let img = run(Operation::Thumbnail, png(200, 100), params![100, 100])
            .await
            .unwrap();
        assert_eq!(img.dimensions(), (100, 50));
    }

    #[tokio::test]
    async fn resize_is_exact() {
        let img = run(Operation::Resize, png(200, 100), params![30, 40])
            .await
            .unwrap();
        assert_eq!(img.dimensions(), (30, 40));
    }

    #[tokio::test]
    async fn crop_within_bounds() {
        let img = run(Operation::Crop, png(50, 50), params![10, 10, 20, 5])
            .await
            .unwrap();
        assert_eq!(img.dimensions(), (20, 5));
    }

    #[tokio::test]
    async fn crop_out_of_bounds_is_rejected() {
        assert_matches!(
            run(Operation::Crop, png(50, 50), params![40, 0, 20, 20]).await,
            Err(Error::InvalidParams { .. })
        );
    }

    #[tokio::test]
    async fn rotate_swaps_dimensions() {
        let img = run(Operation::Rotate, png(30, 10), params![90]).await.unwrap();
        assert_eq!(img.dimensions(), (10, 30));
        assert_matches!(
            run(Operation::Rotate, png(30, 10), params![45]).await,
            Err(Error::InvalidParams { .. })
        );
    }

    #[tokio::test]
    async fn greyscale_keeps_format() {
        let processor = ImageProcessor::new(Operation::Greyscale, ImagingConfig::default());
        let out = processor
            .process(&Artifact::new(png(8, 8)), &[])
            .await
            .unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.color(), image::ColorType::L8);
    }

    #[tokio::test]
    async fn dimensions_are_bounded_by_config() {
        let config = ImagingConfig {
            max_dimension: 64,
            ..ImagingConfig::default()
        };
        let processor = ImageProcessor::new(Operation::Resize, config);
        let artifact = Artifact::new(png(8, 8));
        assert_matches!(
            processor.process(&artifact, &params![65, 10]).await,
            Err(Error::InvalidParams { .. })
        );
        assert_matches!(
            processor.process(&artifact, &params![0, 10]).await,
            Err(Error::InvalidParams { .. })
        );
    }

    #[test]
    fn registry_has_every_operation() {
        let registry = processors(&ImagingConfig::default());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["crop", "greyscale", "resize", "rotate", "thumbnail"]);
    }
}
