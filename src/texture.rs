//! Textures, fill patterns and affine texture mapping.
//!
//! Textured triangles are drawn by filling the triangle path with a tiling pattern, under a
//! transform that maps texel space onto the screen triangle. The transform is affine, so the
//! mapping is only exact for triangles that face the camera. Steep or large triangles show
//! the usual affine warping.

use crate::{
    color::Rgba,
    error::PatternError,
    state::ContextState,
    surface::{AffineTransform, PatternHandle, PatternRepeat, RasterSurface, Style},
    Vector2,
};
use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::sync::atomic::{AtomicU32, Ordering};

/// RGBA8 bitmap, rows stored top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Image {
    /// Wraps pixel data.
    ///
    /// Returns `None` if `pixels` is not exactly `width * height * 4` bytes long, or if that
    /// size does not fit in `usize`.
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Option<Self> {
        let pixels = pixels.into();
        let len = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (pixels.len() == len).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image filled with a single color.
    pub fn solid(width: u32, height: u32, color: Rgba) -> Self {
        let a = libm::roundf(color.a * 255.0) as u8;
        let count = width as usize * height as usize;
        let pixels: Vec<u8> = core::iter::repeat_n([color.r, color.g, color.b, a], count)
            .flatten()
            .collect();
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Copy of the image with row order reversed.
    ///
    /// Texture space has `v` pointing up, while surfaces store rows top down.
    pub fn flipped_vertically(&self) -> Self {
        let stride = self.width as usize * 4;
        let pixels: Vec<u8> = if stride == 0 {
            Vec::new()
        } else {
            self.pixels
                .chunks_exact(stride)
                .rev()
                .flatten()
                .copied()
                .collect()
        };

        Self {
            width: self.width,
            height: self.height,
            pixels: pixels.into(),
        }
    }
}

/// Stable texture identity, used as the pattern cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureId(pub u32);

impl TextureId {
    /// Allocates a process wide unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl core::fmt::Display for TextureId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum Wrapping {
    Repeat,
    #[default]
    ClampToEdge,
    MirroredRepeat,
}

/// How texture coordinates of a face are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum Mapping {
    /// Per-vertex UVs of the element.
    #[default]
    Uv,
    /// UVs derived from view space vertex normals, for environment maps.
    SphericalReflection,
}

/// Storage format of the texture data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureFormat {
    #[default]
    Rgba8,
    /// GPU compressed blocks. Can not be drawn.
    Compressed,
    /// Raw data without bitmap dimensions. Never drawn.
    Data,
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub id: TextureId,
    pub image: Option<Image>,
    pub format: TextureFormat,
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    pub offset: Vector2,
    pub repeat: Vector2,
    pub mapping: Mapping,
    generation: u64,
}

impl Texture {
    pub fn new(image: Option<Image>) -> Self {
        Self {
            id: TextureId::next(),
            image,
            format: TextureFormat::Rgba8,
            wrap_s: Wrapping::default(),
            wrap_t: Wrapping::default(),
            offset: Vector2::zeros(),
            repeat: Vector2::new(1.0, 1.0),
            mapping: Mapping::default(),
            generation: 0,
        }
    }

    /// Content version. Cached patterns built from an older version are rebuilt on next use.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signals that the image or wrapping changed.
    pub fn needs_update(&mut self) {
        self.generation += 1;
    }

    pub fn set_image(&mut self, image: Image) {
        self.image = Some(image);
        self.needs_update();
    }

    /// Loaded, non-empty image, if any.
    pub fn loaded_image(&self) -> Option<&Image> {
        self.image.as_ref().filter(|i| !i.is_empty())
    }

    /// Converts normalized UVs into texel space, honoring offset and repeat.
    pub fn texel(&self, uv: Vector2) -> Vector2 {
        let (w, h) = self
            .image
            .as_ref()
            .map_or((0.0, 0.0), |i| (i.width() as f32, i.height() as f32));
        let offset = self.offset.component_div(&self.repeat);
        let size = Vector2::new(w * self.repeat.x, h * self.repeat.y);
        (uv + offset).component_mul(&size)
    }
}

/// Solves for the affine transform taking each `uv[i]` onto `screen[i]`.
///
/// Returns `None` when the UV triangle is degenerate.
pub fn solve_affine(screen: &[Vector2; 3], uv: &[Vector2; 3]) -> Option<AffineTransform> {
    let [p0, p1, p2] = *screen;
    let [t0, t1, t2] = *uv;

    let (d1, d2) = (p1 - p0, p2 - p0);
    let (e1, e2) = (t1 - t0, t2 - t0);

    let det = e1.x * e2.y - e2.x * e1.y;

    if det == 0.0 {
        return None;
    }

    let idet = 1.0 / det;

    let a = (e2.y * d1.x - e1.y * d2.x) * idet;
    let b = (e2.y * d1.y - e1.y * d2.y) * idet;
    let c = (e1.x * d2.x - e2.x * d1.x) * idet;
    let d = (e1.x * d2.y - e2.x * d1.y) * idet;

    let e = p0.x - a * t0.x - c * t0.y;
    let f = p0.y - b * t0.x - d * t0.y;

    Some(AffineTransform::new(a, b, c, d, e, f))
}

#[derive(Debug)]
struct PatternEntry {
    generation: u64,
    pattern: Option<PatternHandle>,
}

/// Patterns created from textures, keyed by texture identity.
///
/// Entries are never evicted. A texture whose generation moved past the one recorded in its
/// entry is rebuilt on next use.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: BTreeMap<TextureId, PatternEntry>,
}

impl PatternCache {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the pattern of a texture, building it first if needed.
    ///
    /// `None` means the texture can not currently be drawn as a pattern.
    pub fn pattern<S: RasterSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        texture: &Texture,
    ) -> Option<PatternHandle> {
        let generation = texture.generation();

        let stale = self
            .entries
            .get(&texture.id)
            .is_none_or(|e| e.generation != generation);

        if stale {
            let pattern = match build_pattern(surface, texture) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::debug!("pattern unavailable: {e}");
                    None
                }
            };
            self.entries
                .insert(texture.id, PatternEntry { generation, pattern });
        }

        self.entries.get(&texture.id).and_then(|e| e.pattern)
    }

    /// Fills the current path, which must be the triangle `screen`, with `texture` mapped by
    /// `uvs`.
    ///
    /// Without a usable pattern the path is filled opaque black. A degenerate UV triangle
    /// leaves the path unfilled.
    pub fn fill_triangle<S: RasterSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        state: &mut ContextState,
        screen: &[Vector2; 3],
        uvs: &[Vector2; 3],
        texture: &Texture,
    ) {
        if texture.format == TextureFormat::Data {
            return;
        }

        let Some(pattern) = self.pattern(surface, texture) else {
            state.set_fill_style(surface, Style::Color(Rgba::BLACK));
            surface.fill();
            return;
        };

        state.set_fill_style(surface, Style::Pattern(pattern));

        let texels = uvs.map(|uv| texture.texel(uv));

        let Some(transform) = solve_affine(screen, &texels) else {
            return;
        };

        surface.save();
        surface.transform(&transform);
        surface.fill();
        surface.restore();
    }
}

fn build_pattern<S: RasterSurface + ?Sized>(
    surface: &mut S,
    texture: &Texture,
) -> Result<PatternHandle, PatternError> {
    match texture.format {
        TextureFormat::Rgba8 => {}
        TextureFormat::Compressed => return Err(PatternError::Compressed(texture.id)),
        TextureFormat::Data => return Err(PatternError::RawData(texture.id)),
    }

    let image = texture
        .loaded_image()
        .ok_or(PatternError::Unloaded(texture.id))?;

    let repeat = PatternRepeat::from_axes(
        texture.wrap_s == Wrapping::Repeat,
        texture.wrap_t == Wrapping::Repeat,
    );

    log::debug!(
        "building pattern for texture {} ({}x{}, {:?})",
        texture.id,
        image.width(),
        image.height(),
        repeat
    );

    Ok(surface.create_pattern(&image.flipped_vertically(), repeat))
}

/// Draws `image` clipped to the triangle `screen`, mapped by normalized `uvs`.
///
/// The current path must be the triangle.
pub fn clip_image<S: RasterSurface + ?Sized>(
    surface: &mut S,
    screen: &[Vector2; 3],
    uvs: &[Vector2; 3],
    image: &Image,
) {
    let size = Vector2::new(
        image.width().saturating_sub(1) as f32,
        image.height().saturating_sub(1) as f32,
    );
    let texels = uvs.map(|uv| uv.component_mul(&size));

    let Some(transform) = solve_affine(screen, &texels) else {
        return;
    };

    surface.save();
    surface.transform(&transform);
    surface.clip();
    surface.draw_image(image, 0.0, 0.0);
    surface.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extra::{DrawCommand, RecordingSurface};
    use approx::assert_relative_eq;

    fn checker() -> Image {
        #[rustfmt::skip]
        let pixels: [u8; 16] = [
            255, 0, 0, 255,   0, 255, 0, 255,
            0, 0, 255, 255,   255, 255, 255, 255,
        ];
        Image::new(2, 2, &pixels[..]).unwrap()
    }

    #[test]
    fn image_size_must_match_pixels() {
        assert!(Image::new(2, 2, &[0u8; 15][..]).is_none());
        assert!(Image::new(u32::MAX, u32::MAX, &[0u8; 0][..]).is_none());
        assert!(Image::new(0, 0, &[0u8; 0][..]).is_some());

        let solid = Image::solid(3, 2, Rgba::BLACK);
        assert_eq!(solid.pixels().len(), 24);
        assert!(solid.pixels().chunks(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn solver_reproduces_vertices() {
        let screen = [
            Vector2::new(100.0, 100.0),
            Vector2::new(200.0, 100.0),
            Vector2::new(150.0, 50.0),
        ];
        let uv = [
            Vector2::new(0.0, 0.0),
            Vector2::new(64.0, 3.0),
            Vector2::new(10.0, 48.0),
        ];

        let t = solve_affine(&screen, &uv).unwrap();

        for (s, u) in screen.iter().zip(uv.iter()) {
            let p = t.apply(*u);
            assert_relative_eq!(p, *s, max_relative = 1e-5);
        }
    }

    #[test]
    fn degenerate_uvs_have_no_solution() {
        let screen = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
        ];
        let uv = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(2.0, 2.0),
        ];
        assert!(solve_affine(&screen, &uv).is_none());
    }

    #[test]
    fn texel_scaling_honors_offset_and_repeat() {
        let mut texture = Texture::new(Some(Image::solid(64, 32, Rgba::WHITE)));
        texture.repeat = Vector2::new(2.0, 1.0);
        texture.offset = Vector2::new(0.5, 0.25);

        let t = texture.texel(Vector2::new(0.5, 0.5));
        assert_relative_eq!(t, Vector2::new((0.5 + 0.25) * 128.0, (0.5 + 0.25) * 32.0));
    }

    #[test]
    fn flip_reverses_rows() {
        let flipped = checker().flipped_vertically();
        assert_eq!(&flipped.pixels()[..8], &checker().pixels()[8..]);
        assert_eq!(&flipped.pixels()[8..], &checker().pixels()[..8]);
    }

    #[test]
    fn patterns_are_built_once_per_generation() {
        let mut surface = RecordingSurface::new(16, 16);
        let mut cache = PatternCache::default();
        let mut texture = Texture::new(Some(checker()));
        texture.wrap_s = Wrapping::Repeat;

        let first = cache.pattern(&mut surface, &texture).unwrap();
        let again = cache.pattern(&mut surface, &texture).unwrap();
        assert_eq!(first, again);
        assert_eq!(surface.patterns_created(), 1);
        assert!(matches!(
            surface.commands()[0],
            DrawCommand::CreatePattern {
                repeat: PatternRepeat::RepeatX,
                ..
            }
        ));

        texture.needs_update();
        let rebuilt = cache.pattern(&mut surface, &texture).unwrap();
        assert_ne!(first, rebuilt);
        assert_eq!(surface.patterns_created(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn unloaded_texture_becomes_drawable_after_update() {
        let mut surface = RecordingSurface::new(16, 16);
        let mut cache = PatternCache::default();
        let mut texture = Texture::new(None);

        assert!(cache.pattern(&mut surface, &texture).is_none());
        assert!(cache.pattern(&mut surface, &texture).is_none());

        texture.set_image(checker());
        assert!(cache.pattern(&mut surface, &texture).is_some());
    }

    #[test]
    fn compressed_texture_falls_back_to_black() {
        let mut surface = RecordingSurface::new(16, 16);
        let mut state = ContextState::default();
        let mut cache = PatternCache::default();
        let mut texture = Texture::new(Some(checker()));
        texture.format = TextureFormat::Compressed;

        let tri = [
            Vector2::new(0.0, 0.0),
            Vector2::new(4.0, 0.0),
            Vector2::new(0.0, 4.0),
        ];
        let uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
        ];
        cache.fill_triangle(&mut surface, &mut state, &tri, &uvs, &texture);

        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::SetFillStyle(Style::Color(Rgba::BLACK)),
                DrawCommand::Fill,
            ]
        );
    }

    #[test]
    fn raw_data_texture_is_skipped() {
        let mut surface = RecordingSurface::new(16, 16);
        let mut state = ContextState::default();
        let mut cache = PatternCache::default();
        let mut texture = Texture::new(Some(checker()));
        texture.format = TextureFormat::Data;

        let tri = [Vector2::zeros(), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
        cache.fill_triangle(&mut surface, &mut state, &tri, &tri, &texture);

        assert!(surface.commands().is_empty());
    }

    #[test]
    fn degenerate_uvs_skip_the_fill() {
        let mut surface = RecordingSurface::new(16, 16);
        let mut state = ContextState::default();
        let mut cache = PatternCache::default();
        let texture = Texture::new(Some(checker()));

        let tri = [Vector2::zeros(), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
        let uvs = [Vector2::zeros(); 3];
        cache.fill_triangle(&mut surface, &mut state, &tri, &uvs, &texture);

        assert!(!surface.commands().contains(&DrawCommand::Fill));
    }

    #[test]
    fn textured_fill_is_wrapped_in_transform() {
        let mut surface = RecordingSurface::new(16, 16);
        let mut state = ContextState::default();
        let mut cache = PatternCache::default();
        let texture = Texture::new(Some(checker()));

        let tri = [Vector2::zeros(), Vector2::new(8.0, 0.0), Vector2::new(0.0, 8.0)];
        let uvs = [Vector2::zeros(), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
        cache.fill_triangle(&mut surface, &mut state, &tri, &uvs, &texture);

        let cmds = surface.commands();
        let n = cmds.len();
        assert_eq!(cmds[n - 4], DrawCommand::Save);
        assert_eq!(
            cmds[n - 3],
            DrawCommand::Transform(AffineTransform::new(4.0, 0.0, 0.0, 4.0, 0.0, 0.0))
        );
        assert_eq!(cmds[n - 2], DrawCommand::Fill);
        assert_eq!(cmds[n - 1], DrawCommand::Restore);
    }

    #[test]
    fn clip_image_draws_through_clip() {
        let mut surface = RecordingSurface::new(16, 16);
        let image = Image::solid(5, 5, Rgba::WHITE);

        let tri = [Vector2::zeros(), Vector2::new(8.0, 0.0), Vector2::new(0.0, 8.0)];
        let uvs = [Vector2::zeros(), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)];
        clip_image(&mut surface, &tri, &uvs, &image);

        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::Save,
                DrawCommand::Transform(AffineTransform::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0)),
                DrawCommand::Clip,
                DrawCommand::DrawImage {
                    width: 5,
                    height: 5,
                    x: 0.0,
                    y: 0.0,
                },
                DrawCommand::Restore,
            ]
        );
    }
}
