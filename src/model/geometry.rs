//! Page geometry.

use serde::{Deserialize, Serialize};

/// A page rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl PageRect {
    /// Create a rectangle from two corners, normalizing their order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// A rectangle anchored at the origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// US Letter (8.5 x 11 inches), used when a page declares no box.
    pub fn letter() -> Self {
        Self::from_size(612.0, 792.0)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Size of the page as displayed under a clockwise rotation, anchored at
    /// the origin.
    pub fn rotated(&self, rotation: i64) -> Self {
        if rotation.rem_euclid(180) == 90 {
            Self::from_size(self.height(), self.width())
        } else {
            Self::from_size(self.width(), self.height())
        }
    }

    /// Whether the rectangle encloses a non-zero area.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Parse a PDF rectangle array (`[x0 y0 x1 y1]`).
    pub fn from_array(values: &[lopdf::Object]) -> Option<Self> {
        if values.len() < 4 {
            return None;
        }
        let mut nums = [0.0f32; 4];
        for (slot, value) in nums.iter_mut().zip(values) {
            *slot = value.as_float().ok()?;
        }
        Some(Self::new(nums[0], nums[1], nums[2], nums[3]))
    }

    /// The largest rectangle with the given aspect ratio that fits inside
    /// this one, centered.
    pub fn fit_centered(&self, content_width: f32, content_height: f32) -> Self {
        if content_width <= 0.0 || content_height <= 0.0 || self.is_empty() {
            return *self;
        }
        let scale = (self.width() / content_width).min(self.height() / content_height);
        let w = content_width * scale;
        let h = content_height * scale;
        let x0 = self.x0 + (self.width() - w) / 2.0;
        let y0 = self.y0 + (self.height() - h) / 2.0;
        Self::new(x0, y0, x0 + w, y0 + h)
    }

    pub(crate) fn to_object(self) -> lopdf::Object {
        use lopdf::Object::Real;
        lopdf::Object::Array(vec![Real(self.x0), Real(self.y0), Real(self.x1), Real(self.y1)])
    }
}
