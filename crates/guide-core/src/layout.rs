#![forbid(unsafe_code)]

//! Mask and content placement.
//!
//! The mask is a single fixed element whose four border widths leave a
//! rectangular window over the highlighted region; its content box is that
//! window. [`compute`] is pure: it maps a target, the step's padding and
//! offset, the content size and the viewport to a [`Paint`] plan, which the
//! controller turns into style maps with [`Paint::mask_style`] and
//! [`Paint::content_style`].
//!
//! # Invariants
//!
//! 1. With a target, `border.left + mask.width + border.right == viewport.width`
//!    whenever the highlighted region's right edge lies right of the
//!    viewport's left edge (same for the vertical axis).
//! 2. Mask width/height never go negative.
//! 3. Without a target, the content is centered and never placed at a
//!    negative coordinate.

use crate::geometry::{Offset, Rect, Sides, Size, Viewport};
use crate::style::StyleMap;

/// How the content box is positioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    /// Page coordinates; scrolls with the document.
    Absolute,
    /// Viewport coordinates.
    Fixed,
}

impl Positioning {
    /// CSS keyword.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
        }
    }
}

/// Mask geometry: content-box size plus border widths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskGeometry {
    pub width: f64,
    pub height: f64,
    pub border: Sides,
}

/// Where the content box goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentPlacement {
    pub left: f64,
    pub top: f64,
    pub positioning: Positioning,
}

/// Result of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub mask: MaskGeometry,
    pub content: ContentPlacement,
}

/// Inputs of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutInput {
    /// Target rectangle in page coordinates (unpadded); `None` centers.
    pub target: Option<Rect>,
    pub padding: Sides,
    pub offset: Offset,
    /// Measured size of the content element.
    pub content: Size,
    pub viewport: Viewport,
}

/// Compute the paint plan for one step.
#[must_use]
pub fn compute(input: &LayoutInput) -> Paint {
    match input.target {
        Some(target) => highlight(target.expand(input.padding), input.offset, &input.viewport),
        None => centered(input.content, &input.viewport),
    }
}

/// Frame `region` (already padded, page coordinates) with the mask.
#[must_use]
pub fn highlight(region: Rect, offset: Offset, viewport: &Viewport) -> Paint {
    let rel = region.relative_to(viewport);

    let top = rel.top.max(0.0);
    let left = rel.left.max(0.0);
    let right = if rel.left + rel.width > 0.0 {
        viewport.width - rel.width - rel.left
    } else {
        viewport.width
    };
    let bottom = if rel.top + rel.height > 0.0 {
        viewport.height - rel.height - rel.top
    } else {
        viewport.height
    };

    // Partially scrolled-out regions shrink the window on that side.
    let width = (rel.width + rel.left.min(0.0)).max(0.0);
    let height = (rel.height + rel.top.min(0.0)).max(0.0);

    Paint {
        mask: MaskGeometry {
            width,
            height,
            border: Sides::new(top, right, bottom, left),
        },
        content: ContentPlacement {
            left: region.left + offset.left,
            top: region.top + offset.top,
            positioning: Positioning::Absolute,
        },
    }
}

/// Center content of size `content` in the viewport.
#[must_use]
pub fn centered(content: Size, viewport: &Viewport) -> Paint {
    let margin_v = (viewport.height - content.height) / 2.0;
    let margin_h = (viewport.width - content.width) / 2.0;

    Paint {
        mask: MaskGeometry {
            width: content.width,
            height: content.height,
            border: Sides::new(margin_v, margin_h, margin_v, margin_h),
        },
        content: ContentPlacement {
            left: margin_h.max(0.0),
            top: margin_v.max(0.0),
            positioning: Positioning::Fixed,
        },
    }
}

impl Paint {
    /// Style properties for the mask element.
    #[must_use]
    pub fn mask_style(&self) -> StyleMap {
        let m = &self.mask;
        StyleMap::new()
            .with("width", m.width)
            .with("height", m.height)
            .with("border-top-width", m.border.top)
            .with("border-right-width", m.border.right)
            .with("border-bottom-width", m.border.bottom)
            .with("border-left-width", m.border.left)
    }

    /// Style properties for the content element (also makes it visible).
    #[must_use]
    pub fn content_style(&self) -> StyleMap {
        StyleMap::new()
            .with("display", "block")
            .with("position", self.content.positioning.as_css())
            .with("top", self.content.top)
            .with("left", self.content.left)
    }
}
