//! Lights and light accumulation.

use crate::{color::Color, Transform, Vector3};
use nalgebra as na;

/// Kind specific light parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub enum LightKind {
    /// Uniform light, independent of position and orientation.
    Ambient,
    /// Infinitely distant light shining from the light position towards the world origin.
    Directional,
    /// Light radiating from the light position.
    ///
    /// `distance` is the range at which the light fades out completely, `0` disables falloff.
    Point { distance: f32 },
}

/// A light, as handed over by the projector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
    /// World transformation of the light. Only its translation is used.
    pub transform: Transform,
    pub kind: LightKind,
}

impl Light {
    pub fn new(kind: LightKind, color: Color) -> Self {
        Self {
            color,
            intensity: 1.0,
            transform: Transform::identity(),
            kind,
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_position(mut self, position: Vector3) -> Self {
        self.transform = crate::extra::create_transform(
            position,
            na::UnitQuaternion::identity(),
            Vector3::new(1.0, 1.0, 1.0),
        );
        self
    }

    /// World space position of the light.
    pub fn position(&self) -> Vector3 {
        self.transform
            .transform_point(&Vector3::zeros().into())
            .coords
    }

    /// Light contribution at a surface point with unit `normal`.
    ///
    /// Returns `None` when the light does not reach the point: ambient lights (accounted for
    /// separately), surfaces facing away, and points past the falloff distance.
    pub fn contribution(&self, position: &Vector3, normal: &Vector3) -> Option<Color> {
        let amount = match self.kind {
            LightKind::Ambient => return None,
            LightKind::Directional => {
                let dir = self.position().try_normalize(0.0)?;
                normal.dot(&dir)
            }
            LightKind::Point { distance } => {
                let light_pos = self.position();
                let dir = (light_pos - position).try_normalize(0.0)?;
                let amount = normal.dot(&dir);

                if amount <= 0.0 {
                    return None;
                }

                let attenuation = if distance == 0.0 {
                    1.0
                } else {
                    1.0 - libm::fminf((position - light_pos).magnitude() / distance, 1.0)
                };

                amount * attenuation
            }
        };

        if amount <= 0.0 {
            return None;
        }

        Some(self.color * (amount * self.intensity))
    }
}

/// Light sums used by the cheap, direction agnostic lighting path.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LightAggregate {
    pub ambient: Color,
    pub directional: Color,
    pub point: Color,
}

impl LightAggregate {
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut ret = Self::default();
        ret.accumulate(lights);
        ret
    }

    /// Recomputes all registers from scratch.
    pub fn accumulate(&mut self, lights: &[Light]) {
        *self = Self::default();

        for light in lights {
            match light.kind {
                LightKind::Ambient => self.ambient += light.color,
                LightKind::Directional => self.directional += light.color,
                LightKind::Point { .. } => self.point += light.color,
            }
        }
    }

    /// Sum of every register.
    pub fn total(&self) -> Color {
        self.ambient + self.directional + self.point
    }
}

/// Adds up the directional and point light contributions at a surface point into `color`.
pub fn accumulate_lights(
    lights: &[Light],
    position: &Vector3,
    normal: &Vector3,
    color: &mut Color,
) {
    for light in lights {
        if let Some(c) = light.contribution(position, normal) {
            *color += c;
        }
    }
}
