//! Variant definition value types.

use image::{ImageFormat, Rgb};
use std::fmt;
use std::str::FromStr;

/// Dimension value meaning "do not resize".
///
/// A variant whose width and height are both `PASSTHROUGH` stores the
/// upstream image untouched. Exactly one variant in a catalog carries it
/// (the canonical variant); every other variant must have both dimensions
/// non-zero.
pub const PASSTHROUGH: u32 = 0;

/// How the source image is fitted into the variant's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleMode {
    /// Cover the whole box, keeping the aspect ratio, and cut the overflow.
    Crop,
    /// Fit inside the box, keeping the aspect ratio, and paint the margins.
    Fill,
    /// Stretch to the box, ignoring the aspect ratio.
    Skew,
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleMode::Crop => write!(f, "crop"),
            ScaleMode::Fill => write!(f, "fill"),
            ScaleMode::Skew => write!(f, "skew"),
        }
    }
}

impl FromStr for ScaleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crop" => Ok(ScaleMode::Crop),
            "fill" => Ok(ScaleMode::Fill),
            "skew" => Ok(ScaleMode::Skew),
            other => Err(format!("unknown scale mode '{}'", other)),
        }
    }
}

/// Output image format of a derived variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputEncoding {
    Jpeg,
    Png,
}

impl OutputEncoding {
    /// MIME type served for this encoding.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputEncoding::Jpeg => "image/jpeg",
            OutputEncoding::Png => "image/png",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputEncoding::Jpeg => "jpg",
            OutputEncoding::Png => "png",
        }
    }

    /// Matching `image` crate format.
    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputEncoding::Jpeg => ImageFormat::Jpeg,
            OutputEncoding::Png => ImageFormat::Png,
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputEncoding::Jpeg => write!(f, "jpeg"),
            OutputEncoding::Png => write!(f, "png"),
        }
    }
}

impl FromStr for OutputEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputEncoding::Jpeg),
            "png" => Ok(OutputEncoding::Png),
            other => Err(format!("unknown encoding '{}'", other)),
        }
    }
}

/// RGB color painted into the margins of FILL variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FillColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FillColor {
    pub const WHITE: FillColor = FillColor::new(0xff, 0xff, 0xff);
    pub const RED: FillColor = FillColor::new(0xff, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for FillColor {
    type Err = String;

    /// Parses `#rrggbb` or `0xrrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| format!("color '{}' must start with '#' or '0x'", trimmed))?;

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color '{}' must have six hex digits", trimmed));
        }

        let value = u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
        Ok(FillColor::new(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ))
    }
}

/// A named, immutable image derivation policy.
///
/// Built once when the catalog is assembled and only read afterwards.
/// Names are compared case-insensitively and stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDefinition {
    name: String,
    width: u32,
    height: u32,
    quality: u8,
    fill_color: FillColor,
    encoding: OutputEncoding,
    scale_mode: ScaleMode,
}

impl VariantDefinition {
    /// Create a variant with JPEG output at quality 90, white fill and FILL mode.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            width,
            height,
            quality: 90,
            fill_color: FillColor::WHITE,
            encoding: OutputEncoding::Jpeg,
            scale_mode: ScaleMode::Fill,
        }
    }

    /// Create the passthrough variant that stores the upstream image as-is.
    pub fn canonical(name: impl Into<String>) -> Self {
        Self::new(name, PASSTHROUGH, PASSTHROUGH).with_quality(100)
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_fill_color(mut self, color: FillColor) -> Self {
        self.fill_color = color;
        self
    }

    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_scale_mode(mut self, mode: ScaleMode) -> Self {
        self.scale_mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn fill_color(&self) -> FillColor {
        self.fill_color
    }

    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    /// Returns true for the passthrough variant (both dimensions `PASSTHROUGH`).
    pub fn is_canonical(&self) -> bool {
        self.width == PASSTHROUGH && self.height == PASSTHROUGH
    }

    /// Case-insensitive name comparison.
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for VariantDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_canonical() {
            write!(f, "{} (passthrough)", self.name)
        } else {
            write!(
                f,
                "{} {}x{} {} q{} {} fill {}",
                self.name,
                self.width,
                self.height,
                self.scale_mode,
                self.quality,
                self.encoding,
                self.fill_color
            )
        }
    }
}
