//! Memoized surface attributes.

use crate::{
    material::Blending,
    surface::{LineCap, LineJoin, RasterSurface, Style},
};
use alloc::vec::Vec;

/// Last applied value of every mutable surface attribute.
///
/// Each setter forwards to the surface only when the requested value differs from the cached
/// one. `None` means the value on the surface is unknown, so the next request always goes
/// through.
#[derive(Debug, Default)]
pub struct ContextState {
    fill_style: Option<Style>,
    stroke_style: Option<Style>,
    line_width: Option<f32>,
    line_cap: Option<LineCap>,
    line_join: Option<LineJoin>,
    line_dash: Option<Vec<f32>>,
    global_alpha: Option<f32>,
    blending: Option<Blending>,
}

impl ContextState {
    /// Forgets every cached value.
    ///
    /// Must be called whenever the surface may have been recreated.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    pub fn set_fill_style<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, style: Style) {
        if self.fill_style != Some(style) {
            surface.set_fill_style(&style);
            self.fill_style = Some(style);
        }
    }

    pub fn set_stroke_style<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, style: Style) {
        if self.stroke_style != Some(style) {
            surface.set_stroke_style(&style);
            self.stroke_style = Some(style);
        }
    }

    pub fn set_line_width<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, width: f32) {
        if self.line_width != Some(width) {
            surface.set_line_width(width);
            self.line_width = Some(width);
        }
    }

    pub fn set_line_cap<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, cap: LineCap) {
        if self.line_cap != Some(cap) {
            surface.set_line_cap(cap);
            self.line_cap = Some(cap);
        }
    }

    pub fn set_line_join<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, join: LineJoin) {
        if self.line_join != Some(join) {
            surface.set_line_join(join);
            self.line_join = Some(join);
        }
    }

    pub fn set_line_dash<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, dash: &[f32]) {
        if self.line_dash.as_deref() != Some(dash) {
            surface.set_line_dash(dash);
            let cached = self.line_dash.get_or_insert_with(Vec::new);
            cached.clear();
            cached.extend_from_slice(dash);
        }
    }

    pub fn set_opacity<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, alpha: f32) {
        if self.global_alpha != Some(alpha) {
            surface.set_global_alpha(alpha);
            self.global_alpha = Some(alpha);
        }
    }

    pub fn set_blending<S: RasterSurface + ?Sized>(&mut self, surface: &mut S, blending: Blending) {
        if self.blending != Some(blending) {
            surface.set_composite_operation(blending.composite_operation());
            self.blending = Some(blending);
        }
    }

    pub fn fill_style(&self) -> Option<&Style> {
        self.fill_style.as_ref()
    }

    pub fn stroke_style(&self) -> Option<&Style> {
        self.stroke_style.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        color::Rgba,
        extra::{DrawCommand, RecordingSurface},
        surface::CompositeOperation,
    };

    #[test]
    fn repeated_values_issue_one_write() {
        let mut surface = RecordingSurface::new(8, 8);
        let mut state = ContextState::default();

        let red = Style::Color(Rgba {
            r: 255,
            g: 0,
            b: 0,
            a: 1.0,
        });

        state.set_fill_style(&mut surface, red);
        state.set_fill_style(&mut surface, red);
        state.set_line_width(&mut surface, 2.0);
        state.set_line_width(&mut surface, 2.0);
        state.set_opacity(&mut surface, 0.5);
        state.set_opacity(&mut surface, 0.5);
        state.set_blending(&mut surface, Blending::Additive);
        state.set_blending(&mut surface, Blending::Additive);

        assert_eq!(
            surface.commands(),
            &[
                DrawCommand::SetFillStyle(red),
                DrawCommand::SetLineWidth(2.0),
                DrawCommand::SetGlobalAlpha(0.5),
                DrawCommand::SetCompositeOperation(CompositeOperation::Lighter),
            ]
        );
    }

    #[test]
    fn dash_compares_contents() {
        let mut surface = RecordingSurface::new(8, 8);
        let mut state = ContextState::default();

        state.set_line_dash(&mut surface, &[3.0, 1.0]);
        state.set_line_dash(&mut surface, &[3.0, 1.0]);
        state.set_line_dash(&mut surface, &[2.0, 2.0]);
        state.set_line_dash(&mut surface, &[]);

        assert_eq!(surface.commands().len(), 3);
    }

    #[test]
    fn invalidation_forces_writes() {
        let mut surface = RecordingSurface::new(8, 8);
        let mut state = ContextState::default();

        state.set_line_cap(&mut surface, LineCap::Square);
        state.set_line_join(&mut surface, LineJoin::Bevel);
        state.invalidate();
        state.set_line_cap(&mut surface, LineCap::Square);
        state.set_line_join(&mut surface, LineJoin::Bevel);

        assert_eq!(surface.commands().len(), 4);
        assert!(state.fill_style().is_none());
    }
}
