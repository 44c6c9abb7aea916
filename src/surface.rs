//! Raster surface abstraction.
//!
//! The renderer never touches pixels itself. Everything it produces is expressed as calls on a
//! [`RasterSurface`], which mirrors the immediate mode 2D drawing contexts found in browsers
//! and vector graphics libraries: paths, fills, strokes, affine transforms, pattern fills and
//! rectangle clears.

use crate::{color::Rgba, texture::Image, Vector2};

/// 2D affine transform.
///
/// Maps `(x, y)` to `(a * x + c * y + e, b * x + d * y + f)`, the same layout that
/// `setTransform`-style APIs take.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct AffineTransform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn apply(&self, p: Vector2) -> Vector2 {
        Vector2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Returns `self * other`, i.e. `other` is applied first.
    pub fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }
}

/// Opaque handle to a pattern created by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternHandle(pub u32);

/// Tiling mode of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum PatternRepeat {
    Repeat,
    RepeatX,
    RepeatY,
    NoRepeat,
}

impl PatternRepeat {
    pub fn from_axes(repeat_x: bool, repeat_y: bool) -> Self {
        match (repeat_x, repeat_y) {
            (true, true) => Self::Repeat,
            (true, false) => Self::RepeatX,
            (false, true) => Self::RepeatY,
            (false, false) => Self::NoRepeat,
        }
    }
}

/// Two stop linear gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearGradient {
    pub start: Vector2,
    pub end: Vector2,
    pub start_color: Rgba,
    pub end_color: Rgba,
}

/// Fill or stroke source.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum Style {
    Color(Rgba),
    Pattern(PatternHandle),
    LinearGradient(LinearGradient),
}

impl From<Rgba> for Style {
    fn from(v: Rgba) -> Self {
        Self::Color(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum LineJoin {
    #[default]
    Round,
    Bevel,
    Miter,
}

/// How new pixels combine with the ones already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum CompositeOperation {
    SourceOver,
    Lighter,
    Darker,
}

/// A 2D drawing target.
///
/// Implementations are expected to behave like an immediate mode canvas context: attribute
/// setters change state for subsequent operations, `save`/`restore` push and pop the transform
/// and clip, and path operations build a single current path.
///
/// The trait is object safe, so that sprite programs can draw through `&mut dyn RasterSurface`.
pub trait RasterSurface {
    /// Current backing size in pixels.
    fn size(&self) -> (u32, u32);

    /// Recreates the backing store with a new size.
    ///
    /// All drawing attributes are assumed to be reset afterwards.
    fn resize(&mut self, width: u32, height: u32);

    /// Updates the size the surface is presented at, in display units.
    fn set_display_size(&mut self, _width: f32, _height: f32) {}

    fn set_fill_style(&mut self, style: &Style);
    fn set_stroke_style(&mut self, style: &Style);
    fn set_line_width(&mut self, width: f32);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_line_dash(&mut self, segments: &[f32]);
    fn set_global_alpha(&mut self, alpha: f32);
    fn set_composite_operation(&mut self, op: CompositeOperation);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    /// Intersects the clip region with the current path.
    fn clip(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    /// Replaces the current transform.
    fn set_transform(&mut self, transform: &AffineTransform);
    /// Multiplies the current transform by `transform`.
    fn transform(&mut self, transform: &AffineTransform);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);
    fn scale(&mut self, x: f32, y: f32);

    /// Draws an image with its top left corner at `(x, y)` in the current transform.
    fn draw_image(&mut self, image: &Image, x: f32, y: f32);
    /// Resets pixels of the rectangle to transparent black.
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Registers an image as a tiling fill source.
    fn create_pattern(&mut self, image: &Image, repeat: PatternRepeat) -> PatternHandle;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn composition_applies_right_operand_first() {
        let translate = AffineTransform::new(1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
        let scale = AffineTransform::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);

        let p = translate.then(&scale).apply(Vector2::new(1.0, 1.0));
        assert_relative_eq!(p, Vector2::new(12.0, 2.0));

        let p = scale.then(&translate).apply(Vector2::new(1.0, 1.0));
        assert_relative_eq!(p, Vector2::new(22.0, 2.0));
    }

    #[test]
    fn repeat_mode_from_wrap_axes() {
        assert_eq!(PatternRepeat::from_axes(true, true), PatternRepeat::Repeat);
        assert_eq!(PatternRepeat::from_axes(true, false), PatternRepeat::RepeatX);
        assert_eq!(PatternRepeat::from_axes(false, true), PatternRepeat::RepeatY);
        assert_eq!(PatternRepeat::from_axes(false, false), PatternRepeat::NoRepeat);
    }
}
