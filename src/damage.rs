//! Frame damage tracking.
//!
//! Coordinates here live in the centered pixel space the renderer draws in: the origin is the
//! middle of the surface and `y` grows upwards.

use crate::Vector2;

/// Pixels added around the damaged region before clearing, absorbing stroke bleed.
pub const CLEAR_MARGIN: f32 = 2.0;

/// Axis aligned 2D box.
///
/// A box with any `min` component above the matching `max` component is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct Box2 {
    pub min: Vector2,
    pub max: Vector2,
}

impl Default for Box2 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Box2 {
    pub const EMPTY: Self = Self {
        min: Vector2::new(f32::INFINITY, f32::INFINITY),
        max: Vector2::new(f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// Box spanning the whole surface of the given half extents.
    pub fn centered(half_width: f32, half_height: f32) -> Self {
        Self::new(
            Vector2::new(-half_width, -half_height),
            Vector2::new(half_width, half_height),
        )
    }

    pub fn from_points(points: &[Vector2]) -> Self {
        let mut ret = Self::EMPTY;
        for p in points {
            ret.expand_by_point(*p);
        }
        ret
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y
    }

    pub fn make_empty(&mut self) {
        *self = Self::EMPTY;
    }

    pub fn expand_by_point(&mut self, p: Vector2) {
        self.min = self.min.inf(&p);
        self.max = self.max.sup(&p);
    }

    pub fn expand_by_scalar(&mut self, s: f32) {
        self.min.add_scalar_mut(-s);
        self.max.add_scalar_mut(s);
    }

    pub fn union(&mut self, other: &Self) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    pub fn intersect(&mut self, other: &Self) {
        self.min = self.min.sup(&other.min);
        self.max = self.max.inf(&other.max);
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y)
    }
}

/// Rectangle in top-left origin pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-all", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Tracks the region touched since the last clear.
#[derive(Debug, Default)]
pub struct DamageTracker {
    clip: Box2,
    damage: Box2,
    half_width: f32,
    half_height: f32,
}

impl DamageTracker {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        let mut ret = Self::default();
        ret.resize(half_width, half_height);
        ret
    }

    /// Resets the clip box to the new surface size and marks all of it damaged.
    pub fn resize(&mut self, half_width: f32, half_height: f32) {
        self.half_width = half_width;
        self.half_height = half_height;
        self.clip = Box2::centered(half_width, half_height);
        self.damage_all();
    }

    /// Marks the whole surface damaged, so that the next clear wipes it entirely.
    pub fn damage_all(&mut self) {
        self.damage = self.clip;
    }

    pub fn add(&mut self, region: &Box2) {
        self.damage.union(region);
    }

    pub fn clip_box(&self) -> &Box2 {
        &self.clip
    }

    /// Region accumulated since the last clear, unclipped.
    pub fn damage_box(&self) -> &Box2 {
        &self.damage
    }

    /// Damaged region limited to the clip box.
    pub fn clipped(&self) -> Box2 {
        let mut ret = self.damage;
        ret.intersect(&self.clip);
        ret
    }

    /// Consumes the damage box, returning the pixel rectangle a clear should cover.
    ///
    /// Returns `None` when nothing was damaged.
    pub fn take_clear_rect(&mut self) -> Option<PixelRect> {
        if self.damage.is_empty() {
            return None;
        }

        let mut b = self.clipped();
        self.damage.make_empty();

        // Everything painted was off-screen.
        if b.is_empty() {
            return None;
        }

        b.expand_by_scalar(CLEAR_MARGIN);

        // Flip to top-left origin. Higher y in centered space is lower y in pixel space.
        let left = b.min.x + self.half_width;
        let bottom = -b.min.y + self.half_height;
        let right = b.max.x + self.half_width;
        let top = -b.max.y + self.half_height;

        Some(PixelRect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as i32,
            height: (bottom - top) as i32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_semantics() {
        let mut b = Box2::EMPTY;
        assert!(b.is_empty());
        b.expand_by_point(Vector2::new(1.0, 2.0));
        assert!(!b.is_empty());
        assert_eq!(b.min, b.max);
        b.make_empty();
        assert!(b.is_empty());
    }

    #[test]
    fn intersection_of_disjoint_boxes_is_empty() {
        let mut a = Box2::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
        let b = Box2::new(Vector2::new(2.0, 2.0), Vector2::new(3.0, 3.0));
        assert!(!a.intersects(&b));
        a.intersect(&b);
        assert!(a.is_empty());
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = Box2::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
        let b = Box2::new(Vector2::new(1.0, 0.5), Vector2::new(3.0, 3.0));
        assert!(a.intersects(&b));
    }

    #[test]
    fn clear_rect_is_clipped_and_flipped() {
        let mut tracker = DamageTracker::new(400.0, 300.0);
        assert!(tracker.take_clear_rect().is_some());
        assert!(tracker.take_clear_rect().is_none());

        tracker.add(&Box2::new(Vector2::new(100.0, 50.0), Vector2::new(200.0, 100.0)));
        let rect = tracker.take_clear_rect().unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 498,
                y: 198,
                width: 104,
                height: 54,
            }
        );
        assert!(tracker.damage_box().is_empty());

        tracker.add(&Box2::new(
            Vector2::new(350.0, 250.0),
            Vector2::new(1000.0, 1000.0),
        ));
        let rect = tracker.take_clear_rect().unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 748,
                y: -2,
                width: 54,
                height: 54,
            }
        );
    }

    #[test]
    fn off_screen_damage_clears_nothing() {
        let mut tracker = DamageTracker::new(400.0, 300.0);
        tracker.take_clear_rect();

        tracker.add(&Box2::new(
            Vector2::new(900.0, 0.0),
            Vector2::new(1000.0, 50.0),
        ));
        assert!(tracker.take_clear_rect().is_none());
        assert!(tracker.damage_box().is_empty());
    }
}
