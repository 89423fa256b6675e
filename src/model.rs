//! Shared value types and tuning constants for the canvas image viewer.

/// Lower bound for the view scale; pinching in stops here.
pub const MIN_ZOOM: f64 = 0.05;
/// Upper bound for the view scale; pinching out stops here.
pub const MAX_ZOOM: f64 = 20.0;
/// Scale increment applied per pinch move event.
pub const SCALE_STEP: f64 = 0.03;
/// Multiplier applied to one-finger pan deltas.
pub const MOVE_SENSITIVITY: f64 = 1.3;
/// Margin kept on each side of the image when computing the fit scale.
pub const VIEW_MARGIN: f64 = 16.0;

/// A point in surface-local pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
}

/// Natural pixel size of the loaded image, captured once per load.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImageDimension {
    pub width: f64,
    pub height: f64,
}

/// Pixel size of the display area, sampled once when an image is bound.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Destination rectangle for one paint of the image onto the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}
