/// Render surface in the coordinates pointer events arrive in (physical pixels).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0.0, y: 0.0, width: width as f32, height: height as f32 }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {self.width / self.height} else {1.0}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Touch,
    Pen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer position in [-1, 1] x [-1, 1], y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPointer {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPointer {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x: x.clamp(-1.0, 1.0), y: y.clamp(-1.0, 1.0) }
    }

    pub fn delta(&self, other: &Self) -> (f32, f32) {
        (self.x - other.x, self.y - other.y)
    }
}

/// Maps a device position into normalized viewport space. Positions outside the
/// surface are clamped to its edge, non-finite input is dropped.
pub fn normalize(x: f64, y: f64, rect: &SurfaceRect) -> Option<NormalizedPointer> {
    if !x.is_finite() || !y.is_finite() {return None};
    if !(rect.width > 0.0 && rect.height > 0.0) {return None};

    let u = ((x as f32 - rect.x) / rect.width).clamp(0.0, 1.0);
    let v = ((y as f32 - rect.y) / rect.height).clamp(0.0, 1.0);
    Some(NormalizedPointer::new(u * 2.0 - 1.0, 1.0 - v * 2.0))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { pointer: NormalizedPointer, button: PointerButton, source: PointerSource },
    Move { pointer: NormalizedPointer, source: PointerSource },
    Up { pointer: NormalizedPointer, button: PointerButton, source: PointerSource },
    /// Positive values zoom in.
    Wheel { delta: f32 },
    /// Focus loss or a cancelled touch.
    Cancel,
}
