//! Renderer configuration.

use crate::color::Color;

/// Construction time options of a [`Renderer`](crate::Renderer).
///
/// Everything here can also be changed later through setters on the renderer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-all",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RendererConfig {
    /// Backing pixels per display unit.
    pub pixel_ratio: f32,
    /// Clear the damaged region at the start of every frame.
    pub auto_clear: bool,
    /// Forwarded to the projector.
    pub sort_objects: bool,
    /// Forwarded to the projector.
    pub sort_elements: bool,
    pub clear_color: Color,
    /// Clear opacity. When unset, it is `0` for transparent surfaces and `1` otherwise.
    pub clear_alpha: Option<f32>,
    /// Whether the surface has an alpha channel.
    pub alpha: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 1.0,
            auto_clear: true,
            sort_objects: true,
            sort_elements: true,
            clear_color: Color::zeros(),
            clear_alpha: None,
            alpha: false,
        }
    }
}

impl RendererConfig {
    pub(crate) fn initial_clear_alpha(&self) -> f32 {
        self.clear_alpha
            .unwrap_or(if self.alpha { 0.0 } else { 1.0 })
    }

    /// Parses a configuration from JSON. Missing fields take their default values.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, crate::error::ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_alpha_follows_surface_alpha() {
        assert_eq!(RendererConfig::default().initial_clear_alpha(), 1.0);

        let transparent = RendererConfig {
            alpha: true,
            ..Default::default()
        };
        assert_eq!(transparent.initial_clear_alpha(), 0.0);

        let explicit = RendererConfig {
            alpha: true,
            clear_alpha: Some(0.5),
            ..Default::default()
        };
        assert_eq!(explicit.initial_clear_alpha(), 0.5);
    }

    #[cfg(feature = "json")]
    #[test]
    fn partial_json() {
        let config =
            RendererConfig::from_json(r#"{ "pixel_ratio": 2.0, "clear_color": [1.0, 0.0, 0.5] }"#)
                .unwrap();
        assert_eq!(config.pixel_ratio, 2.0);
        assert_eq!(config.clear_color, Color::new(1.0, 0.0, 0.5));
        assert!(config.auto_clear);

        assert!(RendererConfig::from_json("{ \"pixel_ratio\": \"big\" }").is_err());
    }
}
