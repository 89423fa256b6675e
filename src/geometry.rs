//! Pure geometry helpers shared by the gesture machine and the surface glue.

use crate::model::{ImageDimension, Point, Viewport};

/// Euclidean distance between two touch points.
pub fn pinch_distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// CSS box of the drawing surface in viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfaceBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Converts a viewport-relative point into surface-local pixel coordinates.
///
/// The pixel buffer sits centered inside the CSS box, so a box/buffer size
/// mismatch shifts the origin by half the difference on each axis.
pub fn surface_local(client: Point, css_box: SurfaceBox, buffer: Viewport) -> Point {
    Point {
        x: client.x - css_box.left - (css_box.width - buffer.width) / 2.0,
        y: client.y - css_box.top - (css_box.height - buffer.height) / 2.0,
    }
}

/// Largest scale at which the image, plus `margin` on each side, fits the
/// viewport. Fits by height when the viewport is wider relative to its
/// height than the image; otherwise fits by width. Equal aspect ratios fit
/// by width (the comparison is strict).
pub fn fit_scale(image: ImageDimension, viewport: Viewport, margin: f64) -> f64 {
    let image_aspect = image.width / image.height;
    let viewport_aspect = viewport.width / viewport.height;
    if viewport_aspect > image_aspect {
        viewport.height / (image.height + margin * 2.0)
    } else {
        viewport.width / (image.width + margin * 2.0)
    }
}
