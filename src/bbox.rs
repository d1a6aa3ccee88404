//! Axis-aligned boxes in model input pixel space.

/// Corner-form box: top-left origin plus width and height.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl BBox {
    /// Creates a corner-form box.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Converts a center-form `(cx, cy, w, h)` box; width and height are kept.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - 0.5 * width, cy - 0.5 * height, width, height)
    }

    /// Right edge.
    pub fn x_max(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn y_max(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Area of the overlap with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &BBox) -> f32 {
        let w = self.x_max().min(other.x_max()) - self.x.max(other.x);
        let h = self.y_max().min(other.y_max()) - self.y.max(other.y);
        w.max(0.0) * h.max(0.0)
    }

    /// Intersection over union. Returns 0 when the union is empty.
    pub fn iou(&self, other: &BBox) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    /// Returns `[x, y, width, height]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }
}
