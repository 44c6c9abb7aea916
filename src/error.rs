//! Error types.

use crate::texture::TextureId;

/// Reasons a frame is refused before anything is drawn.
///
/// None of these are fatal: the renderer state is untouched, so the caller may fix the camera
/// and render again.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("camera clip range is invalid (near {near}, far {far})")]
    InvalidClipRange { near: f32, far: f32 },
    #[error("camera view matrix contains non-finite values")]
    NonFiniteView,
    #[error("camera view matrix is not invertible")]
    SingularView,
}

/// Reasons a texture can not be turned into a fill pattern.
///
/// These never leave the renderer. A texture that fails to become a pattern is drawn with the
/// opaque black fallback fill instead.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    #[error("texture {0} uses a compressed format")]
    Compressed(TextureId),
    #[error("texture {0} holds raw data without a bitmap")]
    RawData(TextureId),
    #[error("texture {0} has no loaded image")]
    Unloaded(TextureId),
}

/// Malformed renderer configuration.
#[cfg(feature = "json")]
#[derive(thiserror::Error, Debug)]
#[error("invalid renderer configuration: {0}")]
pub struct ConfigError(#[from] serde_json::Error);
