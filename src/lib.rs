//! # canvasrend
//!
//! `canvasrend` is a `no_std` compatible 3D rendering core for targets that only offer a 2D
//! drawing context. It takes an already projected, depth sorted list of primitives and paints
//! them back to front (painter's algorithm) using nothing but paths, fills, strokes and affine
//! transforms.
//!
//! Each frame goes through these stages:
//!
//! - Clear of the region damaged by the previous frame.
//! - Projection, delegated to a [`Projector`].
//! - Per element clipping, conversion to pixel space and dispatch to a sprite, line or face
//!   routine. Faces are lit once per face, and textured with a per-triangle affine transform.
//!
//! All drawing goes through a [`RasterSurface`](surface::RasterSurface). Redundant attribute
//! writes are filtered out before they reach it.
//!
//! Entrypoint to rendering is the [`Renderer`] struct.
//!
//! ## Example
//!
//! Please see [`demos/sample.rs`](demos/sample.rs) for usage sample.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;

use nalgebra as na;

pub mod color;
use color::{Color, Rgba};
pub mod config;
use config::RendererConfig;
pub mod damage;
use damage::{Box2, DamageTracker};
mod draw;
pub mod error;
use error::RenderError;
pub mod extra;
pub mod light;
use light::{Light, LightAggregate};
pub mod material;
use material::{Blending, Material};
pub mod state;
use state::ContextState;
pub mod surface;
use surface::{AffineTransform, RasterSurface, Style};
pub mod texture;
use texture::PatternCache;

pub type Transform = na::Transform3<f32>;
pub type Vector2 = na::Vector2<f32>;
pub type Vector3 = na::Vector3<f32>;
pub type Vector4 = na::Vector4<f32>;
pub type Matrix3 = na::Matrix3<f32>;
pub type Matrix4 = na::Matrix4<f32>;

/// Describes camera point of view.
///
/// Only the parts the rasterizer needs are kept: the view matrix, used to bring normals into
/// view space, and the clip distances, used by depth shading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct Camera {
    /// World to view transformation.
    pub world_inverse: Matrix4,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(world_inverse: Matrix4, near: f32, far: f32) -> Self {
        Self {
            world_inverse,
            near,
            far,
        }
    }

    /// Checks the camera and computes its normal matrix.
    ///
    /// The normal matrix is the inverse transpose of the upper 3x3 part of the view matrix.
    pub fn normal_matrix(&self) -> Result<Matrix3, RenderError> {
        if !(self.near.is_finite() && self.far.is_finite() && self.near < self.far) {
            return Err(RenderError::InvalidClipRange {
                near: self.near,
                far: self.far,
            });
        }

        if self.world_inverse.iter().any(|v| !v.is_finite()) {
            return Err(RenderError::NonFiniteView);
        }

        self.world_inverse
            .fixed_view::<3, 3>(0, 0)
            .into_owned()
            .try_inverse()
            .map(|m| m.transpose())
            .ok_or(RenderError::SingularView)
    }
}

/// A projected vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderableVertex {
    pub position_world: Vector3,
    /// Normalized device coordinates in `xyz`, clip space `w` in `w`.
    pub position_screen: Vector4,
}

impl RenderableVertex {
    pub fn new(position_world: Vector3, position_screen: Vector4) -> Self {
        Self {
            position_world,
            position_screen,
        }
    }

    /// Vertex at normalized screen coordinates, with a world position at the origin.
    pub fn screen(x: f32, y: f32, z: f32) -> Self {
        Self::new(Vector3::zeros(), Vector4::new(x, y, z, 1.0))
    }
}

/// A camera facing rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderableSprite {
    /// Normalized screen position of the center.
    pub position: Vector4,
    /// Size in normalized screen units.
    pub scale: Vector2,
    pub material: Option<usize>,
}

impl RenderableSprite {
    pub fn new(position: Vector4, scale: Vector2, material: usize) -> Self {
        Self {
            position,
            scale,
            material: Some(material),
        }
    }
}

/// A line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderableLine {
    pub v1: RenderableVertex,
    pub v2: RenderableVertex,
    pub vertex_colors: [Color; 2],
    pub material: Option<usize>,
}

impl RenderableLine {
    pub fn new(v1: RenderableVertex, v2: RenderableVertex, material: usize) -> Self {
        Self {
            v1,
            v2,
            vertex_colors: [Color::new(1.0, 1.0, 1.0); 2],
            material: Some(material),
        }
    }
}

/// A triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderableFace {
    pub v1: RenderableVertex,
    pub v2: RenderableVertex,
    pub v3: RenderableVertex,
    /// World space face normal, unit length.
    pub normal_model: Vector3,
    /// World space vertex normals, unit length.
    pub vertex_normals_model: [Vector3; 3],
    /// Face color, used with [`VertexColors::Face`](material::VertexColors::Face).
    pub color: Color,
    pub uvs: [Vector2; 3],
    pub material: Option<usize>,
}

impl RenderableFace {
    /// Creates a face with a normal derived from the world positions and default attributes.
    pub fn new(
        v1: RenderableVertex,
        v2: RenderableVertex,
        v3: RenderableVertex,
        material: usize,
    ) -> Self {
        let e1 = v2.position_world - v1.position_world;
        let e2 = v3.position_world - v1.position_world;
        let normal = e1
            .cross(&e2)
            .try_normalize(0.0)
            .unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0));

        Self {
            v1,
            v2,
            v3,
            normal_model: normal,
            vertex_normals_model: [normal; 3],
            color: Color::new(1.0, 1.0, 1.0),
            uvs: [
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(0.0, 1.0),
            ],
            material: Some(material),
        }
    }

    pub fn vertices(&self) -> [&RenderableVertex; 3] {
        [&self.v1, &self.v2, &self.v3]
    }
}

/// General renderable primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderableElement {
    Sprite(RenderableSprite),
    Line(RenderableLine),
    Face(RenderableFace),
}

impl RenderableElement {
    /// Material index into [`RenderList::materials`].
    pub fn material(&self) -> Option<usize> {
        match self {
            Self::Sprite(s) => s.material,
            Self::Line(l) => l.material,
            Self::Face(f) => f.material,
        }
    }
}

impl From<RenderableSprite> for RenderableElement {
    fn from(v: RenderableSprite) -> Self {
        Self::Sprite(v)
    }
}

impl From<RenderableLine> for RenderableElement {
    fn from(v: RenderableLine) -> Self {
        Self::Line(v)
    }
}

impl From<RenderableFace> for RenderableElement {
    fn from(v: RenderableFace) -> Self {
        Self::Face(v)
    }
}

/// Everything drawn in one frame.
///
/// `elements` are in paint order, back to front. Light order does not matter.
#[derive(Debug, Clone, Copy)]
pub struct RenderList<'a> {
    pub elements: &'a [RenderableElement],
    pub lights: &'a [Light],
    pub materials: &'a [Material],
}

/// Turns a scene into a [`RenderList`].
///
/// Projection, culling of off-screen objects and depth sorting are the projector's
/// responsibility. The renderer paints elements in exactly the order they are returned.
pub trait Projector {
    type Scene: ?Sized;

    fn project_scene<'a>(
        &'a mut self,
        scene: &Self::Scene,
        camera: &Camera,
        sort_objects: bool,
        sort_elements: bool,
    ) -> RenderList<'a>;
}

/// Owned, already projected frame contents.
///
/// Acts as a pass-through [`Projector`] for callers that project on their own.
#[derive(Debug, Clone, Default)]
pub struct RenderData {
    pub elements: Vec<RenderableElement>,
    pub lights: Vec<Light>,
    pub materials: Vec<Material>,
}

impl RenderData {
    pub fn as_list(&self) -> RenderList<'_> {
        RenderList {
            elements: &self.elements,
            lights: &self.lights,
            materials: &self.materials,
        }
    }

    /// Adds a material, returning its index.
    pub fn add_material(&mut self, material: impl Into<Material>) -> usize {
        self.materials.push(material.into());
        self.materials.len() - 1
    }

    pub fn push(&mut self, element: impl Into<RenderableElement>) {
        self.elements.push(element.into());
    }
}

impl Projector for RenderData {
    type Scene = ();

    fn project_scene<'a>(&'a mut self, _: &(), _: &Camera, _: bool, _: bool) -> RenderList<'a> {
        self.as_list()
    }
}

/// Drawing statistics of the last frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameInfo {
    pub vertices: usize,
    pub faces: usize,
}

/// Output viewport, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Per frame values derived from the camera.
struct Frame<'a> {
    lights: &'a [Light],
    normal_matrix: Matrix3,
    near: f32,
    far: f32,
}

impl<'a> Frame<'a> {
    fn new(list: &RenderList<'a>, normal_matrix: Matrix3, camera: &Camera) -> Self {
        Self {
            lights: list.lights,
            normal_matrix,
            near: camera.near,
            far: camera.far,
        }
    }
}

/// Immediate mode renderer.
///
/// Owns the surface it draws to. The typical flow of each frame is a single
/// [`Renderer::render`] call, which clears what the previous frame painted (unless auto clear
/// is disabled), and then paints the new frame.
///
/// Between frames, coordinates handed in through the [`RenderList`] are never modified, so
/// the same list may be drawn any number of times.
#[derive(Debug)]
pub struct Renderer<S> {
    surface: S,
    config: RendererConfig,
    clear_alpha: f32,
    canvas_width: u32,
    canvas_height: u32,
    half_width: f32,
    half_height: f32,
    viewport: Viewport,
    state: ContextState,
    damage: DamageTracker,
    lights: LightAggregate,
    patterns: PatternCache,
    info: FrameInfo,
}

fn half(v: u32) -> f32 {
    (v / 2) as f32
}

impl<S: RasterSurface> Renderer<S> {
    pub fn new(surface: S) -> Self {
        Self::with_config(surface, RendererConfig::default())
    }

    /// Creates a renderer drawing to the surface at its current size.
    pub fn with_config(surface: S, config: RendererConfig) -> Self {
        let (canvas_width, canvas_height) = surface.size();

        log::info!("canvas renderer created ({canvas_width}x{canvas_height})");

        Self {
            surface,
            clear_alpha: config.initial_clear_alpha(),
            config,
            canvas_width,
            canvas_height,
            half_width: half(canvas_width),
            half_height: half(canvas_height),
            viewport: Viewport {
                x: 0.0,
                y: 0.0,
                width: canvas_width as f32,
                height: canvas_height as f32,
            },
            state: ContextState::default(),
            damage: DamageTracker::new(half(canvas_width), half(canvas_height)),
            lights: LightAggregate::default(),
            patterns: PatternCache::default(),
            info: FrameInfo::default(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.config.pixel_ratio
    }

    /// Sets the device pixel ratio. Takes effect on the next [`Renderer::set_size`].
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        self.config.pixel_ratio = ratio;
    }

    pub fn set_auto_clear(&mut self, auto_clear: bool) {
        self.config.auto_clear = auto_clear;
    }

    pub fn set_sorting(&mut self, sort_objects: bool, sort_elements: bool) {
        self.config.sort_objects = sort_objects;
        self.config.sort_elements = sort_elements;
    }

    /// Resizes the surface to `width` x `height` display units.
    ///
    /// The backing size is scaled by the pixel ratio. With `update_style` the surface is also
    /// asked to present itself at the unscaled size. Resets the viewport to the full surface
    /// and, through it, the surface state cache.
    pub fn set_size(&mut self, width: u32, height: u32, update_style: bool) {
        let ratio = self.config.pixel_ratio;
        self.canvas_width = (width as f32 * ratio) as u32;
        self.canvas_height = (height as f32 * ratio) as u32;
        self.half_width = half(self.canvas_width);
        self.half_height = half(self.canvas_height);

        log::info!(
            "resizing surface to {}x{}",
            self.canvas_width,
            self.canvas_height
        );

        self.surface.resize(self.canvas_width, self.canvas_height);

        if update_style {
            self.surface.set_display_size(width as f32, height as f32);
        }

        self.damage.resize(self.half_width, self.half_height);

        self.set_viewport(0.0, 0.0, width as f32, height as f32);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Sets the viewport in display units, and forgets all cached surface state.
    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.state.invalidate();

        let ratio = self.config.pixel_ratio;
        self.viewport = Viewport {
            x: x * ratio,
            y: y * ratio,
            width: width * ratio,
            height: height * ratio,
        };
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Sets the clear color and marks the whole surface for the next clear.
    pub fn set_clear_color(&mut self, color: Color, alpha: f32) {
        self.config.clear_color = color;
        self.clear_alpha = alpha;
        self.damage.damage_all();
    }

    pub fn set_clear_color_hex(&mut self, hex: u32, alpha: f32) {
        self.set_clear_color(color::from_hex(hex), alpha)
    }

    pub fn set_clear_color_hsl(&mut self, hue: f32, saturation: f32, lightness: f32, alpha: f32) {
        self.set_clear_color(color::from_hsl(hue, saturation, lightness), alpha)
    }

    pub fn clear_color(&self) -> Color {
        self.config.clear_color
    }

    pub fn clear_alpha(&self) -> f32 {
        self.clear_alpha
    }

    /// Statistics of the last rendered frame.
    pub fn info(&self) -> FrameInfo {
        self.info
    }

    pub fn damage(&self) -> &DamageTracker {
        &self.damage
    }

    pub fn patterns(&self) -> &PatternCache {
        &self.patterns
    }

    /// Clears the region painted since the last clear.
    ///
    /// Semi transparent clear colors first erase the region, then paint the clear color over it.
    pub fn clear(&mut self) {
        let Some(rect) = self.damage.take_clear_rect() else {
            return;
        };

        let (x, y, w, h) = (
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
        );

        if self.clear_alpha < 1.0 {
            self.surface.clear_rect(x, y, w, h);
        }

        if self.clear_alpha > 0.0 {
            self.state.set_blending(&mut self.surface, Blending::Normal);
            self.state.set_opacity(&mut self.surface, 1.0);
            self.state.set_fill_style(
                &mut self.surface,
                Style::Color(Rgba::with_alpha(self.config.clear_color, self.clear_alpha)),
            );
            self.surface.fill_rect(x, y, w, h);
        }
    }

    /// Projects and draws a scene.
    ///
    /// An invalid camera aborts the frame before anything is touched.
    pub fn render<P: Projector>(
        &mut self,
        projector: &mut P,
        scene: &P::Scene,
        camera: &Camera,
    ) -> Result<FrameInfo, RenderError> {
        let normal_matrix = self.begin_frame(camera)?;

        let list = projector.project_scene(
            scene,
            camera,
            self.config.sort_objects,
            self.config.sort_elements,
        );

        let frame = Frame::new(&list, normal_matrix, camera);
        self.draw_list(&frame, &list);

        Ok(self.end_frame())
    }

    /// Draws an already projected frame.
    pub fn render_list(
        &mut self,
        list: RenderList<'_>,
        camera: &Camera,
    ) -> Result<FrameInfo, RenderError> {
        let normal_matrix = self.begin_frame(camera)?;

        let frame = Frame::new(&list, normal_matrix, camera);
        self.draw_list(&frame, &list);

        Ok(self.end_frame())
    }

    /// Validates the camera and prepares the surface, returning the camera normal matrix.
    fn begin_frame(&mut self, camera: &Camera) -> Result<Matrix3, RenderError> {
        let normal_matrix = camera.normal_matrix().map_err(|e| {
            log::error!("refusing to render: {e}");
            e
        })?;

        if self.config.auto_clear {
            self.clear();
        }

        self.info = FrameInfo::default();

        let (cw, ch) = (self.canvas_width as f32, self.canvas_height as f32);
        let vp = self.viewport;

        // Centered origin, y pointing up, scaled into the viewport.
        self.surface.set_transform(&AffineTransform::new(
            vp.width / cw,
            0.0,
            0.0,
            -vp.height / ch,
            vp.x,
            ch - vp.y,
        ));
        self.surface.translate(self.half_width, self.half_height);

        Ok(normal_matrix)
    }

    fn end_frame(&mut self) -> FrameInfo {
        self.surface.set_transform(&AffineTransform::IDENTITY);

        log::trace!(
            "frame done: {} faces, {} vertices",
            self.info.faces,
            self.info.vertices
        );

        self.info
    }

    fn to_pixels(&self, p: &Vector4) -> Vector2 {
        Vector2::new(p.x * self.half_width, p.y * self.half_height)
    }

    fn draw_list(&mut self, frame: &Frame<'_>, list: &RenderList<'_>) {
        self.lights.accumulate(list.lights);

        for element in list.elements {
            let Some(material) = element.material().and_then(|i| list.materials.get(i)) else {
                continue;
            };

            if material.is_invisible() {
                continue;
            }

            let mut elem_box = Box2::EMPTY;

            match element {
                RenderableElement::Sprite(sprite) => {
                    let anchor = self.to_pixels(&sprite.position);
                    self.render_sprite(anchor, sprite, material, &mut elem_box);
                }
                RenderableElement::Line(line) => {
                    let v = [&line.v1, &line.v2].map(|v| self.to_pixels(&v.position_screen));

                    elem_box = Box2::from_points(&v);

                    if self.damage.clip_box().intersects(&elem_box) {
                        self.render_line(&v, line, material, &mut elem_box);
                    }
                }
                RenderableElement::Face(face) => {
                    let verts = face.vertices();

                    if verts
                        .iter()
                        .any(|v| !(-1.0..=1.0).contains(&v.position_screen.z))
                    {
                        continue;
                    }

                    let mut v = verts.map(|v| self.to_pixels(&v.position_screen));

                    if material.overdraw > 0.0 {
                        expand_edge(&mut v, 0, 1, material.overdraw);
                        expand_edge(&mut v, 1, 2, material.overdraw);
                        expand_edge(&mut v, 2, 0, material.overdraw);
                    }

                    elem_box = Box2::from_points(&v);

                    if self.damage.clip_box().intersects(&elem_box) {
                        self.render_face(frame, &v, face, material, &mut elem_box);
                    }
                }
            }

            self.damage.add(&elem_box);
        }
    }
}

/// Pushes both endpoints of edge `(i, j)` outwards along the edge direction by `pixels`.
fn expand_edge(v: &mut [Vector2; 3], i: usize, j: usize, pixels: f32) {
    let Some(dir) = (v[j] - v[i]).try_normalize(0.0) else {
        return;
    };

    let delta = dir * pixels;
    v[j] += delta;
    v[i] -= delta;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn overdraw_pushes_edges_apart() {
        let mut v = [
            Vector2::new(0.0, 0.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(0.0, 10.0),
        ];
        expand_edge(&mut v, 0, 1, 0.5);
        assert_relative_eq!(v[0], Vector2::new(-0.5, 0.0));
        assert_relative_eq!(v[1], Vector2::new(10.5, 0.0));
    }

    #[test]
    fn overdraw_ignores_collapsed_edges() {
        let mut v = [Vector2::new(1.0, 1.0); 3];
        expand_edge(&mut v, 0, 1, 0.5);
        assert_eq!(v, [Vector2::new(1.0, 1.0); 3]);
    }

    #[test]
    fn camera_validation() {
        let ok = Camera::new(Matrix4::identity(), 0.1, 100.0);
        assert_relative_eq!(ok.normal_matrix().unwrap(), Matrix3::identity());

        let inverted = Camera::new(Matrix4::identity(), 10.0, 1.0);
        assert!(matches!(
            inverted.normal_matrix(),
            Err(RenderError::InvalidClipRange { .. })
        ));

        let nan = Camera::new(Matrix4::from_element(f32::NAN), 0.1, 1.0);
        assert_eq!(nan.normal_matrix(), Err(RenderError::NonFiniteView));

        let flat = Camera::new(Matrix4::zeros(), 0.1, 1.0);
        assert_eq!(flat.normal_matrix(), Err(RenderError::SingularView));
    }

    #[test]
    fn face_normal_from_winding() {
        let face = RenderableFace::new(
            RenderableVertex::new(Vector3::new(0.0, 0.0, 0.0), Vector4::zeros()),
            RenderableVertex::new(Vector3::new(1.0, 0.0, 0.0), Vector4::zeros()),
            RenderableVertex::new(Vector3::new(0.0, 1.0, 0.0), Vector4::zeros()),
            0,
        );
        assert_relative_eq!(face.normal_model, Vector3::new(0.0, 0.0, 1.0));
    }

    #[cfg(feature = "serde-all")]
    #[test]
    fn scene_types_derive_serde() {
        fn serde_both<T: serde::Serialize + serde::de::DeserializeOwned>() {}

        serde_both::<Camera>();
        serde_both::<RenderableFace>();
        serde_both::<RenderableLine>();
        serde_both::<Light>();
        serde_both::<Box2>();
        serde_both::<RendererConfig>();
        serde_both::<extra::DrawCommand>();
    }
}
