//! Gesture-to-transform state machine for the canvas image viewer.
//!
//! Touch handlers feed surface-local points in; the render loop reads the
//! resulting view transform out once per animation frame. Everything here is
//! pure so it can be exercised without a DOM.

use crate::geometry::pinch_distance;
use crate::model::{
    DrawRect, ImageDimension, MAX_ZOOM, MIN_ZOOM, MOVE_SENSITIVITY, Point, SCALE_STEP, Viewport,
};

/// Current gesture, classified by simultaneous contact count.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    /// One finger down; `anchor` is the last position used for a pan delta.
    Dragging { anchor: Point },
    /// Two fingers down; `baseline_distance` is the finger spread recorded
    /// at pinch start or by the previous pinch move.
    Pinching { baseline_distance: f64 },
}

/// Which gesture just finished, routed by the remaining-touch count of the
/// ending event. Zero remaining touches reports neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureEnd {
    Pan,
    Zoom,
}

/// Session state for one bound image: the view transform plus the gesture
/// machine and its lifecycle flags. Reset whenever the image changes.
#[derive(Clone, Debug, Default)]
pub struct GestureState {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    gesture: Gesture,
    /// True after the first paint; gates the auto-centering branch.
    drawn: bool,
    /// True once any gesture has begun since the last reset; gates the
    /// one-time recentering of the pan origin.
    touched: bool,
}

impl GestureState {
    /// Zeroes all positional and scale state and clears every flag. Called
    /// once per bound image, before the fit scale is computed.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True while a drag or pinch is in progress.
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// True once the first paint for the bound image has happened.
    pub fn has_drawn(&self) -> bool {
        self.drawn
    }

    /// Touch-start: one contact enters `Dragging`, two enter `Pinching`.
    ///
    /// The first gesture after a reset also re-anchors the tracked offset to
    /// the centered position the first draw actually painted at, using the
    /// current scale; without this the first pan would jump, since the first
    /// draw centers without writing the offset back.
    pub fn on_touch_start(&mut self, touches: &[Point], image: ImageDimension, viewport: Viewport) {
        match touches {
            [touch] => {
                self.gesture = Gesture::Dragging { anchor: *touch };
                if !self.touched {
                    self.touched = true;
                    let scaled_width = image.width * self.scale;
                    let scaled_height = image.height * self.scale;
                    self.offset_x = (viewport.width - scaled_width) / 2.0;
                    self.offset_y = (viewport.height - scaled_height) / 2.0;
                }
            }
            [a, b] => {
                self.gesture = Gesture::Pinching {
                    baseline_distance: pinch_distance(*a, *b),
                };
            }
            _ => {}
        }
    }

    /// Touch-move: incremental pan while dragging, stepped anchor zoom while
    /// pinching. Ignored when idle, when the event carries no touches, or
    /// when the contact count does not match the current gesture.
    pub fn on_touch_move(&mut self, active: &[Point], changed: usize) {
        if active.is_empty() {
            return;
        }
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Dragging { anchor } => {
                if let [current] = active {
                    self.offset_x += (current.x - anchor.x) * MOVE_SENSITIVITY;
                    self.offset_y += (current.y - anchor.y) * MOVE_SENSITIVITY;
                    self.gesture = Gesture::Dragging { anchor: *current };
                }
            }
            Gesture::Pinching { baseline_distance } => {
                if let ([a, b], 2) = (active, changed) {
                    let pos = *a;
                    // Image-space point under the primary finger, from the
                    // pre-update transform; kept fixed across the scale step
                    // so zoom homes in on the pinch, not the image center.
                    let anchor = Point {
                        x: (pos.x - self.offset_x) / self.scale,
                        y: (pos.y - self.offset_y) / self.scale,
                    };
                    let distance = pinch_distance(*a, *b);
                    if baseline_distance > distance {
                        self.scale -= SCALE_STEP;
                    }
                    if baseline_distance < distance {
                        self.scale += SCALE_STEP;
                    }
                    self.scale = self.scale.clamp(MIN_ZOOM, MAX_ZOOM);
                    self.offset_x = (1.0 - self.scale) * anchor.x + (pos.x - anchor.x);
                    self.offset_y = (1.0 - self.scale) * anchor.y + (pos.y - anchor.y);
                    self.gesture = Gesture::Pinching {
                        baseline_distance: distance,
                    };
                }
            }
        }
    }

    /// Touch-end: returns which gesture finished, judged by how many touches
    /// remain after this event (1 = pan ended, 2 = zoom ended, otherwise
    /// nothing is reported).
    pub fn on_touch_end(&mut self, remaining: usize) -> Option<GestureEnd> {
        self.gesture = Gesture::Idle;
        match remaining {
            1 => Some(GestureEnd::Pan),
            2 => Some(GestureEnd::Zoom),
            _ => None,
        }
    }

    /// Per-frame draw decision. Returns the destination rectangle to paint,
    /// or `None` when the view has settled (already drawn, no gesture in
    /// progress) and the frame can be skipped.
    ///
    /// The very first frame centers the image in the viewport and ignores
    /// whatever offset was tracked before; the tracked offset itself is left
    /// alone until the first touch re-anchors it.
    pub fn frame(&mut self, image: ImageDimension, viewport: Viewport) -> Option<DrawRect> {
        if self.drawn && !self.is_active() {
            return None;
        }
        let scaled_width = image.width * self.scale;
        let scaled_height = image.height * self.scale;
        let (x, y) = if self.drawn {
            (self.offset_x, self.offset_y)
        } else {
            self.drawn = true;
            (
                (viewport.width - scaled_width) / 2.0,
                (viewport.height - scaled_height) / 2.0,
            )
        };
        Some(DrawRect {
            x,
            y,
            width: scaled_width,
            height: scaled_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE: ImageDimension = ImageDimension {
        width: 1000.0,
        height: 500.0,
    };
    const VIEWPORT: Viewport = Viewport {
        width: 1200.0,
        height: 900.0,
    };

    fn ready_state(scale: f64) -> GestureState {
        GestureState {
            scale,
            ..GestureState::default()
        }
    }

    #[test]
    fn first_touch_recenters_pan_origin_once() {
        let mut st = ready_state(1.0);
        st.on_touch_start(&[Point { x: 10.0, y: 10.0 }], IMAGE, VIEWPORT);
        // (1200 - 1000) / 2, (900 - 500) / 2
        assert_eq!(st.offset_x, 100.0);
        assert_eq!(st.offset_y, 200.0);

        // Pan away, end, and start a second gesture: no recentering.
        st.on_touch_move(&[Point { x: 20.0, y: 10.0 }], 1);
        st.on_touch_end(0);
        let panned_x = st.offset_x;
        st.on_touch_start(&[Point { x: 50.0, y: 50.0 }], IMAGE, VIEWPORT);
        assert_eq!(st.offset_x, panned_x);
    }

    #[test]
    fn pan_delta_is_velocity_scaled() {
        let mut st = ready_state(1.0);
        st.on_touch_start(&[Point { x: 100.0, y: 100.0 }], IMAGE, VIEWPORT);
        let (ox, oy) = (st.offset_x, st.offset_y);
        st.on_touch_move(&[Point { x: 110.0, y: 104.0 }], 1);
        assert!((st.offset_x - ox - 13.0).abs() < 1e-9);
        assert!((st.offset_y - oy - 5.2).abs() < 1e-9);
        // The anchor follows the finger: repeating the same position adds
        // nothing more.
        st.on_touch_move(&[Point { x: 110.0, y: 104.0 }], 1);
        assert!((st.offset_x - ox - 13.0).abs() < 1e-9);
    }

    #[test]
    fn move_is_ignored_when_idle_or_without_touches() {
        let mut st = ready_state(1.0);
        st.offset_x = 42.0;
        st.on_touch_move(&[Point { x: 5.0, y: 5.0 }], 1);
        assert_eq!(st.offset_x, 42.0);

        st.on_touch_start(&[Point { x: 0.0, y: 0.0 }], IMAGE, VIEWPORT);
        let ox = st.offset_x;
        st.on_touch_move(&[], 0);
        assert_eq!(st.offset_x, ox);
    }

    #[test]
    fn pinch_scale_stays_clamped() {
        let mut st = ready_state(1.0);
        let a = Point { x: 300.0, y: 300.0 };
        // Shrinking spread: one SCALE_STEP down per move, floored at MIN_ZOOM.
        st.on_touch_start(&[a, Point { x: 800.0, y: 300.0 }], IMAGE, VIEWPORT);
        for i in 0..200 {
            let spread = 500.0 - (i + 1) as f64;
            st.on_touch_move(&[a, Point { x: 300.0 + spread, y: 300.0 }], 2);
            assert!(st.scale >= MIN_ZOOM);
        }
        assert!((st.scale - MIN_ZOOM).abs() < 1e-12);

        // Growing spread from the floor: capped at MAX_ZOOM.
        for i in 0..800 {
            let spread = 300.0 + (i + 1) as f64;
            st.on_touch_move(&[a, Point { x: 300.0 + spread, y: 300.0 }], 2);
            assert!(st.scale <= MAX_ZOOM);
        }
        assert!((st.scale - MAX_ZOOM).abs() < 1e-12);
    }

    #[test]
    fn equal_spread_leaves_scale_unchanged() {
        let mut st = ready_state(2.0);
        let a = Point { x: 100.0, y: 100.0 };
        let b = Point { x: 400.0, y: 500.0 };
        st.on_touch_start(&[a, b], IMAGE, VIEWPORT);
        st.on_touch_move(&[a, b], 2);
        assert_eq!(st.scale, 2.0);
    }

    #[test]
    fn pinch_keeps_anchor_under_primary_finger() {
        let mut st = ready_state(1.0);
        st.offset_x = 100.0;
        st.offset_y = 200.0;
        let pos = Point { x: 450.0, y: 350.0 };
        st.on_touch_start(&[pos, Point { x: 650.0, y: 350.0 }], IMAGE, VIEWPORT);
        for spread in [220.0, 240.0, 260.0, 255.0, 230.0] {
            let anchor = Point {
                x: (pos.x - st.offset_x) / st.scale,
                y: (pos.y - st.offset_y) / st.scale,
            };
            st.on_touch_move(
                &[
                    pos,
                    Point {
                        x: pos.x + spread,
                        y: pos.y,
                    },
                ],
                2,
            );
            // The image-space point that was under the finger must still map
            // to the finger after the scale step.
            assert!((anchor.x * st.scale + st.offset_x - pos.x).abs() < 1e-9);
            assert!((anchor.y * st.scale + st.offset_y - pos.y).abs() < 1e-9);
        }
    }

    #[test]
    fn pinch_move_requires_two_changed_touches() {
        let mut st = ready_state(1.0);
        let a = Point { x: 100.0, y: 100.0 };
        st.on_touch_start(&[a, Point { x: 300.0, y: 100.0 }], IMAGE, VIEWPORT);
        st.on_touch_move(&[a, Point { x: 350.0, y: 100.0 }], 1);
        assert_eq!(st.scale, 1.0);
    }

    #[test]
    fn end_routes_by_remaining_touch_count() {
        let mut st = ready_state(1.0);
        st.on_touch_start(&[Point::ZERO], IMAGE, VIEWPORT);
        assert_eq!(st.on_touch_end(1), Some(GestureEnd::Pan));
        assert!(!st.is_active());

        st.on_touch_start(&[Point::ZERO, Point { x: 9.0, y: 0.0 }], IMAGE, VIEWPORT);
        assert_eq!(st.on_touch_end(2), Some(GestureEnd::Zoom));

        st.on_touch_start(&[Point::ZERO], IMAGE, VIEWPORT);
        assert_eq!(st.on_touch_end(0), None);
    }

    #[test]
    fn first_frame_centers_regardless_of_tracked_offset() {
        let mut st = ready_state(0.5);
        st.offset_x = -999.0;
        st.offset_y = 777.0;
        let rect = st.frame(IMAGE, VIEWPORT).expect("first frame draws");
        assert_eq!(rect.x, (1200.0 - 500.0) / 2.0);
        assert_eq!(rect.y, (900.0 - 250.0) / 2.0);
        assert_eq!(rect.width, 500.0);
        assert_eq!(rect.height, 250.0);
        // The tracked offset is untouched until the first gesture.
        assert_eq!(st.offset_x, -999.0);
        assert_eq!(st.offset_y, 777.0);
    }

    #[test]
    fn settled_state_skips_frames() {
        let mut st = ready_state(1.0);
        assert!(st.frame(IMAGE, VIEWPORT).is_some());
        assert!(st.frame(IMAGE, VIEWPORT).is_none());
        assert!(st.frame(IMAGE, VIEWPORT).is_none());

        // An active gesture resumes drawing at the tracked offset.
        st.on_touch_start(&[Point { x: 5.0, y: 5.0 }], IMAGE, VIEWPORT);
        let rect = st.frame(IMAGE, VIEWPORT).expect("drag keeps drawing");
        assert_eq!(rect.x, st.offset_x);
        assert_eq!(rect.y, st.offset_y);
        st.on_touch_end(0);
        assert!(st.frame(IMAGE, VIEWPORT).is_none());
    }

    #[test]
    fn reset_clears_transform_and_flags() {
        let mut st = ready_state(3.0);
        st.offset_x = 10.0;
        st.on_touch_start(&[Point::ZERO], IMAGE, VIEWPORT);
        let _ = st.frame(IMAGE, VIEWPORT);
        st.reset();
        assert_eq!(st.scale, 0.0);
        assert_eq!(st.offset_x, 0.0);
        assert_eq!(st.offset_y, 0.0);
        assert!(!st.is_active());
        // Both one-shot branches re-arm: centering on the next frame and
        // recentering on the next touch.
        assert!(st.frame(IMAGE, VIEWPORT).is_some());
        st.scale = 1.0;
        st.on_touch_start(&[Point::ZERO], IMAGE, VIEWPORT);
        assert_eq!(st.offset_x, 100.0);
    }
}
