//! Pixel work for variant derivation.

use super::plan::{plan, Placement};
use super::{ImageResizer, ResizeError};
use crate::variant::{OutputEncoding, VariantDefinition};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use tracing::trace;

/// Resizer backed by the `image` crate.
///
/// Output canvases are 8-bit RGB; alpha in the source is discarded.
#[derive(Debug, Clone, Copy)]
pub struct Resizer {
    filter: FilterType,
}

impl Default for Resizer {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl Resizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    fn scale(&self, image: &RgbImage, width: u32, height: u32) -> RgbImage {
        if image.dimensions() == (width, height) {
            image.clone()
        } else {
            imageops::resize(image, width, height, self.filter)
        }
    }

    /// Scale and compose the canvas for `def`.
    ///
    /// Crops are cut from the source before scaling, so no buffer larger
    /// than the source or the canvas is allocated.
    pub fn render(&self, def: &VariantDefinition, source: &RgbImage) -> Result<RgbImage, ResizeError> {
        let plan = plan(def, source.dimensions())?;
        let (cw, ch) = plan.canvas;

        let canvas = match plan.placement {
            Placement::Crop { original, .. } => {
                let region = imageops::crop_imm(
                    source,
                    original.x,
                    original.y,
                    original.width,
                    original.height,
                )
                .to_image();
                self.scale(&region, cw, ch)
            }
            Placement::Fill { dest } => {
                let mut canvas = RgbImage::from_pixel(cw, ch, def.fill_color().to_rgb());
                let placed = self.scale(source, dest.width, dest.height);
                imageops::overlay(&mut canvas, &placed, dest.x as i64, dest.y as i64);
                canvas
            }
            Placement::Stretch => self.scale(source, cw, ch),
        };

        trace!(
            variant = def.name(),
            source = ?plan.source,
            intermediate = ?plan.intermediate,
            "variant rendered"
        );
        Ok(canvas)
    }

    /// Encode `canvas` in the variant's format.
    pub fn encode(&self, def: &VariantDefinition, canvas: &RgbImage) -> Result<Bytes, ResizeError> {
        let mut buffer = Vec::new();
        let (width, height) = canvas.dimensions();

        match def.encoding() {
            OutputEncoding::Jpeg => {
                let mut encoder =
                    JpegEncoder::new_with_quality(&mut buffer, def.quality().clamp(1, 100));
                encoder
                    .encode(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| ResizeError::Encode(e.to_string()))?;
            }
            OutputEncoding::Png => {
                PngEncoder::new(&mut buffer)
                    .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| ResizeError::Encode(e.to_string()))?;
            }
        }

        Ok(Bytes::from(buffer))
    }
}

/// Decode arbitrary image bytes into an RGB buffer.
fn decode_rgb(data: &[u8]) -> Result<RgbImage, ResizeError> {
    image::load_from_memory(data)
        .map(|img| img.to_rgb8())
        .map_err(|e| ResizeError::Decode(e.to_string()))
}

impl ImageResizer for Resizer {
    fn derive(&self, def: &VariantDefinition, original: &[u8]) -> Result<Bytes, ResizeError> {
        if def.is_canonical() {
            return Err(ResizeError::Passthrough(def.name().to_string()));
        }
        let source = decode_rgb(original)?;
        let canvas = self.render(def, &source)?;
        self.encode(def, &canvas)
    }
}
