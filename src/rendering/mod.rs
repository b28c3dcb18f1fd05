//! Card face rendering
//!
//! A face is turned into pixels in three steps: [`layout`] places the
//! record's fields on the card, [`paint`] flattens the layout into device
//! space drawing commands and [`raster`] executes those commands into a PNG.
//! The pipeline only sees the [`Rasterizer`] trait, so any other backend
//! (a real browser, a test stub) can be plugged in instead.

pub mod font;
pub mod layout;
pub mod paint;
pub mod raster;

pub use layout::{CardTemplate, FaceLayout};
pub use raster::SoftwareRasterizer;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// One printable side of the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    /// Contact details and logo
    Front,
    /// QR code of the vCard
    Back,
}

impl Face {
    /// Both faces in print order
    pub const ALL: [Face; 2] = [Face::Front, Face::Back];

    /// Suffix used in archive entry names
    pub fn slug(self) -> &'static str {
        match self {
            Face::Front => "vorne",
            Face::Back => "hinten",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Face::Front => f.write_str("front"),
            Face::Back => f.write_str("back"),
        }
    }
}

/// What shows through wherever the layout paints nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    White,
    Transparent,
}

impl Background {
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Background::White => [255, 255, 255, 255],
            Background::Transparent => [0, 0, 0, 0],
        }
    }
}

/// Options passed to a rasterizer for a single capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Device pixels per layout pixel
    pub scale: f32,
    pub background: Background,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: Background::White,
        }
    }
}

/// A captured face as PNG bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Bitmap {
    /// Encode an RGBA buffer as PNG.
    pub fn from_rgba(image: &image::RgbaImage) -> Result<Self> {
        use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};

        let mut png_data = Vec::new();
        PngEncoder::new(&mut png_data).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ColorType::Rgba8,
        )?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            png_data,
        })
    }

    /// Decode the PNG payload back into pixels.
    pub fn decode(&self) -> Result<image::DynamicImage> {
        if self.png_data.is_empty() {
            return Err(Error::Render(format!(
                "bitmap {}x{} has no image data",
                self.width, self.height
            )));
        }
        Ok(image::load_from_memory_with_format(
            &self.png_data,
            image::ImageFormat::Png,
        )?)
    }

    /// Hex SHA-256 of the PNG bytes
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png_data))
    }
}

/// Turns a face layout into a bitmap.
///
/// Implementations must be deterministic in the sense that matters for
/// printing: the same layout and options always produce an image of the same
/// dimensions. Assets referenced by the layout that cannot be loaded must be
/// reported as [`Error::AssetLoad`] rather than silently left out.
pub trait Rasterizer: Send + Sync {
    fn render(&self, layout: &FaceLayout, options: &RenderOptions) -> Result<Bitmap>;
}
