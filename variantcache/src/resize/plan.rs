//! Pure resize geometry.
//!
//! Given source dimensions and a variant, decide the intermediate scaled
//! size and how it is placed on the output canvas. No pixels are touched
//! here.

use super::ResizeError;
use crate::variant::{ScaleMode, VariantDefinition};

/// A rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// How the scaled intermediate becomes the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Keep `source` of the intermediate, which is `original` of the source
    /// image, and stretch it over the whole canvas
    Crop { source: Rect, original: Rect },
    /// Draw the intermediate into `dest`, fill color elsewhere
    Fill { dest: Rect },
    /// Intermediate already has canvas size
    Stretch,
}

/// Complete recipe for one derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub source: (u32, u32),
    pub intermediate: (u32, u32),
    pub canvas: (u32, u32),
    pub placement: Placement,
}

/// True when the target box is at least as wide, relative to its height,
/// as the source.
pub fn target_is_wider(target: (u32, u32), source: (u32, u32)) -> bool {
    let target_ratio = target.0 as f64 / target.1 as f64;
    let source_ratio = source.0 as f64 / source.1 as f64;
    target_ratio >= source_ratio
}

/// `value * numerator / denominator`, at least 1.
fn scale_dimension(value: u32, numerator: u32, denominator: u32) -> u64 {
    (value as u64 * numerator as u64 / denominator as u64).max(1)
}

/// Narrow scaled dimensions to `u32`.
fn to_dimensions(width: u64, height: u64) -> Result<(u32, u32), ResizeError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(ResizeError::TooLarge { width, height }),
    }
}

/// Scale `source` so its width becomes `width`, keeping the aspect ratio.
fn match_width(source: (u32, u32), width: u32) -> Result<(u32, u32), ResizeError> {
    to_dimensions(width as u64, scale_dimension(source.1, width, source.0))
}

/// Scale `source` so its height becomes `height`, keeping the aspect ratio.
fn match_height(source: (u32, u32), height: u32) -> Result<(u32, u32), ResizeError> {
    to_dimensions(scale_dimension(source.0, height, source.1), height as u64)
}

/// Centred span of `source_len` covering what `span` covers of `scaled_len`.
fn source_span(span: u32, scaled_len: u32, source_len: u32) -> (u32, u32) {
    let len = scale_dimension(span, source_len, scaled_len).min(source_len as u64) as u32;
    ((source_len - len) / 2, len)
}

/// Build the plan for deriving `def` from a `source`-sized image.
///
/// # Errors
///
/// - [`ResizeError::Passthrough`] for a zero-dimension variant
/// - [`ResizeError::EmptySource`] if the source has a zero dimension
/// - [`ResizeError::TooLarge`] if the intermediate overflows `u32`
pub fn plan(def: &VariantDefinition, source: (u32, u32)) -> Result<ResizePlan, ResizeError> {
    let target = (def.width(), def.height());
    if target.0 == 0 || target.1 == 0 {
        return Err(ResizeError::Passthrough(def.name().to_string()));
    }
    if source.0 == 0 || source.1 == 0 {
        return Err(ResizeError::EmptySource {
            width: source.0,
            height: source.1,
        });
    }

    let wider = target_is_wider(target, source);
    let mode = def.scale_mode();

    let intermediate = match mode {
        ScaleMode::Crop if wider => match_width(source, target.0)?,
        ScaleMode::Fill if !wider => match_width(source, target.0)?,
        ScaleMode::Crop | ScaleMode::Fill => match_height(source, target.1)?,
        ScaleMode::Skew => target,
    };

    let width_offset = intermediate.0.abs_diff(target.0) / 2;
    let height_offset = intermediate.1.abs_diff(target.1) / 2;

    let placement = match mode {
        ScaleMode::Crop => {
            let kept = Rect {
                x: width_offset,
                y: height_offset,
                width: intermediate.0 - 2 * width_offset.min(intermediate.0 / 2),
                height: intermediate.1 - 2 * height_offset.min(intermediate.1 / 2),
            };
            let (x, width) = source_span(kept.width, intermediate.0, source.0);
            let (y, height) = source_span(kept.height, intermediate.1, source.1);
            Placement::Crop {
                source: kept,
                original: Rect { x, y, width, height },
            }
        }
        ScaleMode::Fill => Placement::Fill {
            dest: Rect {
                x: width_offset,
                y: height_offset,
                width: target.0 - 2 * width_offset.min(target.0 / 2),
                height: target.1 - 2 * height_offset.min(target.1 / 2),
            },
        },
        ScaleMode::Skew => Placement::Stretch,
    };

    Ok(ResizePlan {
        source,
        intermediate,
        canvas: target,
        placement,
    })
}
