//! A surface that records calls instead of drawing.

use crate::{
    surface::{
        AffineTransform, CompositeOperation, LineCap, LineJoin, PatternHandle, PatternRepeat,
        RasterSurface, Style,
    },
    texture::Image,
    Vector2,
};
use alloc::vec::Vec;

/// One call made on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum DrawCommand {
    Resize {
        width: u32,
        height: u32,
    },
    SetDisplaySize {
        width: f32,
        height: f32,
    },
    SetFillStyle(Style),
    SetStrokeStyle(Style),
    SetLineWidth(f32),
    SetLineCap(LineCap),
    SetLineJoin(LineJoin),
    SetLineDash(Vec<f32>),
    SetGlobalAlpha(f32),
    SetCompositeOperation(CompositeOperation),
    BeginPath,
    MoveTo(Vector2),
    LineTo(Vector2),
    ClosePath,
    Fill,
    Stroke,
    Clip,
    Save,
    Restore,
    SetTransform(AffineTransform),
    Transform(AffineTransform),
    Translate(Vector2),
    Rotate(f32),
    Scale(Vector2),
    DrawImage {
        width: u32,
        height: u32,
        x: f32,
        y: f32,
    },
    ClearRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    CreatePattern {
        handle: PatternHandle,
        width: u32,
        height: u32,
        repeat: PatternRepeat,
    },
}

impl DrawCommand {
    /// Whether the command changes pixels.
    pub fn is_paint(&self) -> bool {
        matches!(
            self,
            Self::Fill
                | Self::Stroke
                | Self::DrawImage { .. }
                | Self::ClearRect { .. }
                | Self::FillRect { .. }
        )
    }
}

/// Headless [`RasterSurface`] keeping a log of every call.
///
/// Useful for tests, and for replaying a frame onto a real context elsewhere.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
    next_pattern: u32,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            next_pattern: 0,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns the recorded commands, leaving the log empty.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        core::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of patterns created over the surface's lifetime.
    pub fn patterns_created(&self) -> u32 {
        self.next_pattern
    }

    fn push(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }
}

impl RasterSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.push(DrawCommand::Resize { width, height });
    }

    fn set_display_size(&mut self, width: f32, height: f32) {
        self.push(DrawCommand::SetDisplaySize { width, height });
    }

    fn set_fill_style(&mut self, style: &Style) {
        self.push(DrawCommand::SetFillStyle(*style));
    }

    fn set_stroke_style(&mut self, style: &Style) {
        self.push(DrawCommand::SetStrokeStyle(*style));
    }

    fn set_line_width(&mut self, width: f32) {
        self.push(DrawCommand::SetLineWidth(width));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.push(DrawCommand::SetLineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.push(DrawCommand::SetLineJoin(join));
    }

    fn set_line_dash(&mut self, segments: &[f32]) {
        self.push(DrawCommand::SetLineDash(segments.to_vec()));
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.push(DrawCommand::SetGlobalAlpha(alpha));
    }

    fn set_composite_operation(&mut self, op: CompositeOperation) {
        self.push(DrawCommand::SetCompositeOperation(op));
    }

    fn begin_path(&mut self) {
        self.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::MoveTo(Vector2::new(x, y)));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::LineTo(Vector2::new(x, y)));
    }

    fn close_path(&mut self) {
        self.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.push(DrawCommand::Fill);
    }

    fn stroke(&mut self) {
        self.push(DrawCommand::Stroke);
    }

    fn clip(&mut self) {
        self.push(DrawCommand::Clip);
    }

    fn save(&mut self) {
        self.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.push(DrawCommand::Restore);
    }

    fn set_transform(&mut self, transform: &AffineTransform) {
        self.push(DrawCommand::SetTransform(*transform));
    }

    fn transform(&mut self, transform: &AffineTransform) {
        self.push(DrawCommand::Transform(*transform));
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::Translate(Vector2::new(x, y)));
    }

    fn rotate(&mut self, angle: f32) {
        self.push(DrawCommand::Rotate(angle));
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.push(DrawCommand::Scale(Vector2::new(x, y)));
    }

    fn draw_image(&mut self, image: &Image, x: f32, y: f32) {
        self.push(DrawCommand::DrawImage {
            width: image.width(),
            height: image.height(),
            x,
            y,
        });
    }

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawCommand::ClearRect {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    fn create_pattern(&mut self, image: &Image, repeat: PatternRepeat) -> PatternHandle {
        let handle = PatternHandle(self.next_pattern);
        self.next_pattern += 1;
        self.push(DrawCommand::CreatePattern {
            handle,
            width: image.width(),
            height: image.height(),
            repeat,
        });
        handle
    }
}
