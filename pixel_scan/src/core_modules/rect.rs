// THEORY:
// A `Rect` is the bounding box of a view, expressed in its parent's coordinates.
// Edges are inclusive: `right = left + width - 1`. Two constructors exist because
// callers describe regions either by an origin plus extents or by two opposite
// corners; both normalize to the same non-negative description.

use crate::error::ViewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub width: u32,
    pub height: u32,
}

/// Inclusive first and last coordinate of an extent starting at `origin`.
fn span(origin: i32, extent: i32) -> Option<(i32, i32)> {
    if extent < 0 {
        Some((origin.checked_add(extent)?.checked_add(1)?, origin))
    } else {
        Some((origin, origin.checked_add(extent - 1)?))
    }
}

impl Rect {
    /// Builds a rect from an origin and extents. Negative extents grow leftwards
    /// or upwards from the origin pixel, so `(5, 0, -3, 1)` covers x = 3..=5.
    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Result<Self, ViewError> {
        let invalid = || ViewError::InvalidDimensions {
            width: w as i64,
            height: h as i64,
        };
        if w == 0 || h == 0 {
            return Err(invalid());
        }

        let (left, right) = span(x, w).ok_or_else(invalid)?;
        let (top, bottom) = span(y, h).ok_or_else(invalid)?;
        Self::from_corners(left, top, right, bottom)
    }

    /// Builds a rect spanning two opposite corners, both inclusive.
    pub fn from_corners(x0: i32, y0: i32, x1: i32, y1: i32) -> Result<Self, ViewError> {
        let left = x0.min(x1);
        let right = x0.max(x1);
        let top = y0.min(y1);
        let bottom = y0.max(y1);

        let extent = |lo: i32, hi: i32| u32::try_from(hi as i64 - lo as i64 + 1).ok();
        match (extent(left, right), extent(top, bottom)) {
            (Some(width), Some(height)) => Ok(Self {
                left,
                top,
                right,
                bottom,
                width,
                height,
            }),
            _ => Err(ViewError::InvalidDimensions {
                width: right as i64 - left as i64 + 1,
                height: bottom as i64 - top as i64 + 1,
            }),
        }
    }

    /// The full extent of a `width` x `height` area anchored at the origin.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width as i32 - 1,
            bottom: height as i32 - 1,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// True if `inner`, given in this rect's local coordinates, lies entirely inside.
    pub fn contains_local(&self, inner: &Rect) -> bool {
        inner.left >= 0
            && inner.top >= 0
            && inner.right < self.width as i32
            && inner.bottom < self.height as i32
    }
}
