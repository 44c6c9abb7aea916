//! Color related types and functions.

use crate::Vector3;
use colorsys::{Hsl, Rgb};

/// Float RGB color.
///
/// Channels are nominally within `[0; 1]`, but intermediate lighting results may exceed that
/// range. Values are only clamped when quantized into [`Rgba`].
pub type Color = Vector3;

/// Quantized color, the form in which colors reach a raster surface.
///
/// Channels are bytes, alpha stays a float. Two colors that quantize to the same bytes compare
/// equal, which is what lets the state cache skip redundant style writes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 1.0,
    };

    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };

    pub fn opaque(color: Color) -> Self {
        Self::with_alpha(color, 1.0)
    }

    pub fn with_alpha(color: Color, a: f32) -> Self {
        Self {
            r: quantize_channel(color.x),
            g: quantize_channel(color.y),
            b: quantize_channel(color.z),
            a,
        }
    }

    /// Converts back into float color, dropping alpha.
    pub fn color(&self) -> Color {
        Color::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

// Float to int casts saturate, so out of range and NaN values land on 0 or 255.
fn quantize_channel(v: f32) -> u8 {
    libm::floorf(v * 255.0) as u8
}

/// Builds a color from a `0xRRGGBB` value.
pub fn from_hex(hex: u32) -> Color {
    Color::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Packs a color into a `0xRRGGBB` value.
pub fn to_hex(color: Color) -> u32 {
    let [r, g, b] = [color.x, color.y, color.z].map(|v| libm::roundf(v * 255.0) as u8 as u32);
    r << 16 | g << 8 | b
}

/// Builds a color from hue (degrees), saturation and lightness (both percentages).
pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Color {
    let hsl = Hsl::new(hue as f64, saturation as f64, lightness as f64, None);
    let rgb = Rgb::from(&hsl);
    Color::new(
        (rgb.red() / 255.0) as f32,
        (rgb.green() / 255.0) as f32,
        (rgb.blue() / 255.0) as f32,
    )
}

/// Converts a color into hue (degrees), saturation and lightness (percentages).
pub fn to_hsl(color: Color) -> (f32, f32, f32) {
    let rgb = Rgb::new(
        color.x as f64 * 255.0,
        color.y as f64 * 255.0,
        color.z as f64 * 255.0,
        None,
    );
    let hsl = Hsl::from(&rgb);
    (
        hsl.hue() as f32,
        hsl.saturation() as f32,
        hsl.lightness() as f32,
    )
}
