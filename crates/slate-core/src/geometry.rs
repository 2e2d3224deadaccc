//! Geometry primitives: fixed-or-percent dimensions and rectangle helpers.

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// One axis of widget geometry: either a fixed pixel value or a
/// percentage of the parent's resolved dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    /// Fixed pixel value.
    Px(i32),
    /// Percentage of the parent dimension, resolved as
    /// `floor(percent * parent / 100)`.
    Percent(u8),
}

impl Dim {
    /// Resolve against the parent's pixel dimension.
    pub fn resolve(self, parent: i32) -> i32 {
        match self {
            Self::Px(v) => v,
            // Parent dimensions are non-negative, so integer division
            // is the floor the percent contract requires.
            Self::Percent(p) => parent * i32::from(p) / 100,
        }
    }
}

impl Default for Dim {
    fn default() -> Self {
        Self::Px(0)
    }
}

/// Intersection of two rectangles; zero-sized when they do not overlap.
pub fn intersect(a: &Rectangle, b: &Rectangle) -> Rectangle {
    a.intersection(b)
}

/// Whether two rectangles share at least one pixel.
pub fn overlaps(a: &Rectangle, b: &Rectangle) -> bool {
    let i = a.intersection(b);
    i.size.width > 0 && i.size.height > 0
}

/// Whether `rect` contains the point. Zero-sized rectangles contain nothing.
pub fn contains(rect: &Rectangle, p: Point) -> bool {
    rect.contains(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn px_resolves_to_itself() {
        assert_eq!(Dim::Px(37).resolve(1000), 37);
    }

    #[test]
    fn percent_floors() {
        assert_eq!(Dim::Percent(50).resolve(320), 160);
        assert_eq!(Dim::Percent(33).resolve(100), 33);
        // 33% of 10 = 3.3 -> 3
        assert_eq!(Dim::Percent(33).resolve(10), 3);
        assert_eq!(Dim::Percent(100).resolve(240), 240);
        assert_eq!(Dim::Percent(0).resolve(240), 0);
    }

    #[test]
    fn overlap_is_strict() {
        let a = Rectangle::new(Point::new(0, 0), Size::new(10, 10));
        let b = Rectangle::new(Point::new(10, 0), Size::new(10, 10));
        let c = Rectangle::new(Point::new(5, 5), Size::new(10, 10));
        assert!(!overlaps(&a, &b));
        assert!(overlaps(&a, &c));
    }
}
