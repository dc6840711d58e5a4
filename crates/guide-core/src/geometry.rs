#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.
//!
//! Page coordinates have their origin at the top-left of the document;
//! viewport coordinates have theirs at the top-left of the visible window.
//! Values are `f64` because the host reports fractional layout sizes.

/// A rectangle for element bounds and highlight regions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Size of the rectangle.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if the rectangle has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Grow the rectangle outward by `padding` on each side.
    ///
    /// Top/left padding moves the origin; every side adds to the size.
    pub fn expand(&self, padding: Sides) -> Rect {
        Rect {
            left: self.left - padding.left,
            top: self.top - padding.top,
            width: self.width + padding.horizontal_sum(),
            height: self.height + padding.vertical_sum(),
        }
    }

    /// Translate the rectangle into the coordinate space of `viewport`.
    #[inline]
    pub fn relative_to(&self, viewport: &Viewport) -> Rect {
        Rect {
            left: self.left - viewport.scroll_left,
            top: self.top - viewport.scroll_top,
            ..*self
        }
    }
}

/// Width and height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Sides for padding and border widths.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    /// Create new sides with equal values.
    pub const fn all(val: f64) -> Self {
        Self {
            top: val,
            right: val,
            bottom: val,
            left: val,
        }
    }

    /// Create new sides with specific values.
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub fn horizontal_sum(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }
}

impl From<f64> for Sides {
    fn from(val: f64) -> Self {
        Self::all(val)
    }
}

impl From<(f64, f64, f64, f64)> for Sides {
    fn from((top, right, bottom, left): (f64, f64, f64, f64)) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Placement offset of a content box relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub left: f64,
    pub top: f64,
}

impl Offset {
    /// Create a new offset.
    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }

    /// Same offset on both axes.
    pub const fn all(val: f64) -> Self {
        Self::new(val, val)
    }
}

impl From<f64> for Offset {
    fn from(val: f64) -> Self {
        Self::all(val)
    }
}

/// The visible window: scroll position plus inner size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    pub const fn new(scroll_left: f64, scroll_top: f64, width: f64, height: f64) -> Self {
        Self {
            scroll_left,
            scroll_top,
            width,
            height,
        }
    }

    /// An unscrolled viewport of the given size.
    pub const fn unscrolled(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Inner size of the viewport.
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::{Offset, Rect, Sides, Size, Viewport};

    #[test]
    fn rect_edges() {
        let rect = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert_eq!(rect.right(), 6.0);
        assert_eq!(rect.bottom(), 8.0);
        assert_eq!(rect.size(), Size::new(4.0, 5.0));
    }

    #[test]
    fn rect_expand_moves_origin_and_grows() {
        let rect = Rect::new(100.0, 50.0, 40.0, 20.0);
        let expanded = rect.expand(Sides::all(5.0));
        assert_eq!(expanded, Rect::new(95.0, 45.0, 50.0, 30.0));
    }

    #[test]
    fn rect_expand_asymmetric() {
        let rect = Rect::new(10.0, 10.0, 10.0, 10.0);
        let expanded = rect.expand(Sides::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(expanded, Rect::new(6.0, 9.0, 16.0, 14.0));
    }

    #[test]
    fn rect_relative_to_viewport() {
        let rect = Rect::new(100.0, 300.0, 10.0, 10.0);
        let viewport = Viewport::new(20.0, 250.0, 800.0, 600.0);
        assert_eq!(
            rect.relative_to(&viewport),
            Rect::new(80.0, 50.0, 10.0, 10.0)
        );
    }

    #[test]
    fn empty_rects() {
        assert!(Rect::default().is_empty());
        assert!(Rect::new(0.0, 0.0, -1.0, 4.0).is_empty());
        assert!(!Rect::from_size(Size::new(1.0, 1.0)).is_empty());
    }

    #[test]
    fn sides_and_offset_conversions() {
        assert_eq!(Sides::from(3.0), Sides::all(3.0));
        assert_eq!(
            Sides::from((1.0, 2.0, 3.0, 4.0)),
            Sides {
                top: 1.0,
                right: 2.0,
                bottom: 3.0,
                left: 4.0,
            }
        );
        assert_eq!(Offset::from(7.0), Offset::new(7.0, 7.0));
        assert_eq!(Sides::new(1.0, 2.0, 3.0, 4.0).horizontal_sum(), 6.0);
        assert_eq!(Sides::new(1.0, 2.0, 3.0, 4.0).vertical_sum(), 4.0);
    }
}
