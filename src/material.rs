//! Materials.
//!
//! A material decides how an element is painted: which color, which texture, filled or
//! stroked. Materials are plain data, the renderer never mutates them.

use crate::{
    color::Color,
    surface::{CompositeOperation, LineCap, LineJoin, RasterSurface},
    texture::Texture,
};
use alloc::sync::Arc;

/// Blending mode of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum Blending {
    #[default]
    Normal,
    Additive,
    Subtractive,
}

impl Blending {
    pub fn composite_operation(self) -> CompositeOperation {
        match self {
            Self::Normal => CompositeOperation::SourceOver,
            Self::Additive => CompositeOperation::Lighter,
            Self::Subtractive => CompositeOperation::Darker,
        }
    }
}

/// Where per-element colors come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum VertexColors {
    #[default]
    None,
    /// Faces multiply the material color by the face color.
    Face,
    /// Lines blend between their two vertex colors.
    Vertex,
}

/// Outline rendering of a face.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct Wireframe {
    pub enabled: bool,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl Default for Wireframe {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 1.0,
            cap: LineCap::Round,
            join: LineJoin::Round,
        }
    }
}

/// Parameters shared by basic, lambert and phong meshes.
#[derive(Debug, Clone)]
pub struct MeshMaterial {
    pub color: Color,
    /// Only used by lit kinds.
    pub emissive: Color,
    pub map: Option<Texture>,
    pub env_map: Option<Texture>,
    pub vertex_colors: VertexColors,
    pub wireframe: Wireframe,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            color: Color::new(1.0, 1.0, 1.0),
            emissive: Color::zeros(),
            map: None,
            env_map: None,
            vertex_colors: VertexColors::None,
            wireframe: Wireframe::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct LineMaterial {
    pub color: Color,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub vertex_colors: VertexColors,
}

impl Default for LineMaterial {
    fn default() -> Self {
        Self {
            color: Color::new(1.0, 1.0, 1.0),
            width: 1.0,
            cap: LineCap::Round,
            join: LineJoin::Round,
            vertex_colors: VertexColors::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct DashedLineMaterial {
    pub line: LineMaterial,
    pub dash_size: f32,
    pub gap_size: f32,
}

impl Default for DashedLineMaterial {
    fn default() -> Self {
        Self {
            line: LineMaterial::default(),
            dash_size: 3.0,
            gap_size: 1.0,
        }
    }
}

/// Rectangular sprite, either flat colored or showing a texture.
#[derive(Debug, Clone)]
pub struct SpriteMaterial {
    pub color: Color,
    pub map: Option<Texture>,
    /// Rotation in radians.
    pub rotation: f32,
    /// Multiplies the flat color by the sum of all scene lights.
    ///
    /// This is a cheap approximation that ignores light direction and distance.
    pub lights: bool,
}

impl Default for SpriteMaterial {
    fn default() -> Self {
        Self {
            color: Color::new(1.0, 1.0, 1.0),
            map: None,
            rotation: 0.0,
            lights: false,
        }
    }
}

/// Callback drawing a sprite in its unit space.
pub type SpriteProgramFn = dyn Fn(&mut dyn RasterSurface) + Send + Sync;

/// Sprite drawn by user code.
///
/// The program runs with the surface transformed so that the sprite spans `[-0.5; 0.5]` on both
/// axes, and with fill and stroke styles set to `color`.
#[derive(Clone)]
pub struct SpriteProgram {
    pub color: Color,
    pub rotation: f32,
    pub program: Arc<SpriteProgramFn>,
}

impl SpriteProgram {
    pub fn new(program: impl Fn(&mut dyn RasterSurface) + Send + Sync + 'static) -> Self {
        Self {
            color: Color::new(1.0, 1.0, 1.0),
            rotation: 0.0,
            program: Arc::new(program),
        }
    }
}

impl core::fmt::Debug for SpriteProgram {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpriteProgram")
            .field("color", &self.color)
            .field("rotation", &self.rotation)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum MaterialKind {
    /// Unlit flat color or texture.
    Basic(MeshMaterial),
    /// Diffuse lit, evaluated once per face.
    Lambert(MeshMaterial),
    /// Drawn identically to [`MaterialKind::Lambert`], there is no per pixel specular term.
    Phong(MeshMaterial),
    /// Grayscale of the face depth between camera near and far planes.
    Depth(Wireframe),
    /// View space face normal as color.
    Normal(Wireframe),
    SpriteBitmap(SpriteMaterial),
    SpriteProgram(SpriteProgram),
    LineBasic(LineMaterial),
    LineDashed(DashedLineMaterial),
}

#[derive(Debug, Clone)]
pub struct Material {
    pub opacity: f32,
    pub blending: Blending,
    /// Pixels by which face edges are pushed outwards to hide seams between neighbours.
    pub overdraw: f32,
    pub kind: MaterialKind,
}

impl Material {
    pub fn new(kind: MaterialKind) -> Self {
        Self {
            opacity: 1.0,
            blending: Blending::Normal,
            overdraw: 0.0,
            kind,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_blending(mut self, blending: Blending) -> Self {
        self.blending = blending;
        self
    }

    pub fn with_overdraw(mut self, overdraw: f32) -> Self {
        self.overdraw = overdraw;
        self
    }

    /// Whether the material can not produce any visible output.
    pub fn is_invisible(&self) -> bool {
        self.opacity == 0.0
    }
}

impl From<MaterialKind> for Material {
    fn from(kind: MaterialKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blending_modes_map_to_composite_operations() {
        assert_eq!(
            Blending::Normal.composite_operation(),
            CompositeOperation::SourceOver
        );
        assert_eq!(
            Blending::Additive.composite_operation(),
            CompositeOperation::Lighter
        );
        assert_eq!(
            Blending::Subtractive.composite_operation(),
            CompositeOperation::Darker
        );
    }

    #[test]
    fn zero_opacity_is_invisible() {
        let m = Material::new(MaterialKind::Basic(Default::default()));
        assert!(!m.is_invisible());
        assert!(m.with_opacity(0.0).is_invisible());
    }
}
