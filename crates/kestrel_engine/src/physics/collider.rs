//! Collider shapes and overlap tests

use crate::foundation::math::{Rect, Vec2};
use crate::scene::EntityId;

/// Identifier of a collider within its owning entity
///
/// Assigned from a per-entity monotonic counter, never reused within that
/// entity's lifetime. `-1` marks a detached collider.
pub type ColliderId = i32;

/// Handle resolving a collider through the scene's tag index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderRef {
    /// The owning entity
    pub entity: EntityId,

    /// The collider within that entity
    pub collider: ColliderId,
}

/// Geometric shape of a collider
///
/// Rectangles are anchored at their top-left corner, circles at their center,
/// both relative to the owning entity's position plus the collider offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    /// Axis-aligned rectangle
    Rect {
        /// Width of the rectangle
        width: f32,
        /// Height of the rectangle
        height: f32,
    },

    /// Circle around the collider position
    Circle {
        /// Radius of the circle
        radius: f32,
    },

    /// Single point
    Point,
}

/// A tagged collision shape owned by exactly one entity
///
/// The tag set is fixed at construction; every tag maps the collider into one
/// scene tag bucket. The shape sits at the owning entity's position plus
/// `offset`.
#[derive(Debug, Clone)]
pub struct Collider {
    shape: ColliderShape,
    tags: Vec<i32>,
    offset: Vec2,
}

impl Collider {
    /// Create a collider from a shape and its tags
    pub fn new(shape: ColliderShape, tags: &[i32]) -> Self {
        Self {
            shape,
            tags: tags.to_vec(),
            offset: Vec2::zeros(),
        }
    }

    /// Create a rectangle collider
    pub fn rect(width: f32, height: f32, tags: &[i32]) -> Self {
        Self::new(ColliderShape::Rect { width, height }, tags)
    }

    /// Create a circle collider
    pub fn circle(radius: f32, tags: &[i32]) -> Self {
        Self::new(ColliderShape::Circle { radius }, tags)
    }

    /// Create a point collider
    pub fn point(tags: &[i32]) -> Self {
        Self::new(ColliderShape::Point, tags)
    }

    /// Offset the collider from its owning entity's position
    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = Vec2::new(x, y);
        self
    }

    /// The collider's shape
    pub fn shape(&self) -> ColliderShape {
        self.shape
    }

    /// The tags this collider carries
    pub fn tags(&self) -> &[i32] {
        &self.tags
    }

    /// Whether the collider carries the given tag
    pub fn has_tag(&self, tag: i32) -> bool {
        self.tags.contains(&tag)
    }

    /// Offset from the owning entity's position
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Test this collider against another, given both owners' world positions
    pub fn overlaps(&self, origin: Vec2, other: &Collider, other_origin: Vec2) -> bool {
        let a = PlacedShape::new(self.shape, origin + self.offset);
        let b = PlacedShape::new(other.shape, other_origin + other.offset);
        a.overlaps(&b)
    }
}

/// A shape resolved to its world position
#[derive(Debug, Clone, Copy)]
struct PlacedShape {
    shape: ColliderShape,
    position: Vec2,
}

impl PlacedShape {
    fn new(shape: ColliderShape, position: Vec2) -> Self {
        Self { shape, position }
    }

    fn overlaps(&self, other: &PlacedShape) -> bool {
        use ColliderShape::{Circle, Point, Rect};

        match (self.shape, other.shape) {
            (Rect { .. }, Rect { .. }) => self.as_rect().intersects(&other.as_rect()),
            (Circle { radius: r1 }, Circle { radius: r2 }) => {
                circles_overlap(self.position, r1, other.position, r2)
            }
            (Rect { .. }, Circle { radius }) => {
                rect_circle_overlap(&self.as_rect(), other.position, radius)
            }
            (Circle { radius }, Rect { .. }) => {
                rect_circle_overlap(&other.as_rect(), self.position, radius)
            }
            (Rect { .. }, Point) => self.as_rect().contains(other.position),
            (Point, Rect { .. }) => other.as_rect().contains(self.position),
            (Circle { radius }, Point) => circles_overlap(self.position, radius, other.position, 0.0),
            (Point, Circle { radius }) => circles_overlap(other.position, radius, self.position, 0.0),
            (Point, Point) => self.position == other.position,
        }
    }

    fn as_rect(&self) -> Rect {
        match self.shape {
            ColliderShape::Rect { width, height } => {
                Rect::new(self.position.x, self.position.y, width, height)
            }
            // Degenerate rect for the non-rect shapes; callers only reach
            // this for the Rect arms above.
            _ => Rect::new(self.position.x, self.position.y, 0.0, 0.0),
        }
    }
}

fn circles_overlap(c1: Vec2, r1: f32, c2: Vec2, r2: f32) -> bool {
    let distance_squared = (c1 - c2).magnitude_squared();
    let radius_sum = r1 + r2;
    distance_squared <= radius_sum * radius_sum
}

fn rect_circle_overlap(rect: &Rect, center: Vec2, radius: f32) -> bool {
    // Closest point on the rect to the circle center, then a radius check.
    let closest = rect.clamp_point(center);
    (closest - center).magnitude_squared() <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_rect_overlap() {
        let a = Collider::rect(2.0, 2.0, &[1]);
        let b = Collider::rect(2.0, 2.0, &[1]);

        assert!(a.overlaps(Vec2::zeros(), &b, Vec2::new(1.0, 1.0)));
        assert!(!a.overlaps(Vec2::zeros(), &b, Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_circle_circle_overlap() {
        let a = Collider::circle(1.0, &[1]);
        let b = Collider::circle(1.0, &[1]);

        assert!(a.overlaps(Vec2::zeros(), &b, Vec2::new(1.5, 0.0)));
        assert!(!a.overlaps(Vec2::zeros(), &b, Vec2::new(3.0, 0.0)));
    }

    #[test]
    fn test_rect_circle_overlap() {
        let rect = Collider::rect(4.0, 4.0, &[1]);
        let circle = Collider::circle(1.0, &[1]);

        // Circle just touching the right edge of the rect.
        assert!(rect.overlaps(Vec2::zeros(), &circle, Vec2::new(5.0, 2.0)));
        assert!(!rect.overlaps(Vec2::zeros(), &circle, Vec2::new(6.0, 2.0)));
    }

    #[test]
    fn test_point_containment() {
        let rect = Collider::rect(2.0, 2.0, &[1]);
        let point = Collider::point(&[1]);

        assert!(rect.overlaps(Vec2::zeros(), &point, Vec2::new(1.0, 1.0)));
        assert!(!rect.overlaps(Vec2::zeros(), &point, Vec2::new(3.0, 1.0)));
    }

    #[test]
    fn test_offset_moves_shape() {
        let a = Collider::rect(1.0, 1.0, &[1]).with_offset(10.0, 0.0);
        let b = Collider::rect(1.0, 1.0, &[1]);

        assert!(!a.overlaps(Vec2::zeros(), &b, Vec2::zeros()));
        assert!(a.overlaps(Vec2::zeros(), &b, Vec2::new(10.5, 0.0)));
    }

    #[test]
    fn test_tags_are_fixed_at_construction() {
        let collider = Collider::rect(1.0, 1.0, &[1, 2]);

        assert!(collider.has_tag(1));
        assert!(collider.has_tag(2));
        assert!(!collider.has_tag(3));
        assert_eq!(collider.tags(), &[1, 2]);
    }
}
