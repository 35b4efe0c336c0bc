use std::io::Cursor;
use std::sync::Arc;

use af_core::{Error, Result};
use af_job::{Analyser, Analysers, Artifact};
use async_trait::async_trait;
use image::ImageReader;
use serde_json::{json, Value};

use super::{blocking, format_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
    Width,
    Height,
    AspectRatio,
    Format,
    Size,
    Dimensions,
}

impl Property {
    const ALL: [Property; 6] = [
        Property::Width,
        Property::Height,
        Property::AspectRatio,
        Property::Format,
        Property::Size,
        Property::Dimensions,
    ];

    fn name(&self) -> &'static str {
        match self {
            Property::Width => "width",
            Property::Height => "height",
            Property::AspectRatio => "aspect_ratio",
            Property::Format => "format",
            Property::Size => "size",
            Property::Dimensions => "dimensions",
        }
    }
}

/// Reports one property of an image artifact as JSON.
///
/// Only the image header is read; pixel data is never decoded.
#[derive(Debug, Clone)]
pub struct ImageAnalyser {
    property: Property,
}

struct Header {
    format: &'static str,
    width: u32,
    height: u32,
}

fn read_header(operation: &'static str, data: &[u8]) -> Result<Header> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::processing(operation, e))?;
    let format = reader
        .format()
        .map(format_name)
        .ok_or_else(|| Error::processing(operation, "unrecognised image format"))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| Error::processing(operation, format!("failed to read dimensions: {e}")))?;
    Ok(Header {
        format,
        width,
        height,
    })
}

#[async_trait]
impl Analyser for ImageAnalyser {
    async fn analyse(&self, artifact: &Artifact, _params: &[Value]) -> Result<Value> {
        let len = artifact.len();
        if self.property == Property::Size {
            return Ok(json!(len));
        }

        let property = self.property;
        let data = artifact.data().clone();
        let header = blocking(property.name(), move || read_header(property.name(), &data)).await?;

        Ok(match property {
            Property::Width => json!(header.width),
            Property::Height => json!(header.height),
            Property::AspectRatio => {
                if header.height == 0 {
                    Value::Null
                } else {
                    json!(header.width as f64 / header.height as f64)
                }
            }
            Property::Format => json!(header.format),
            Property::Dimensions => json!({ "width": header.width, "height": header.height }),
            Property::Size => json!(len),
        })
    }
}

/// Registry of every image property analyser.
pub fn analysers() -> Analysers {
    let mut registry = Analysers::new();
    for property in Property::ALL {
        registry.register(property.name(), Arc::new(ImageAnalyser { property }));
    }
    registry
}
