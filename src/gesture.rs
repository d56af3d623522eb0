//! Slide-to-cancel gesture tracking
//!
//! Converts pointer positions into a single "cancelling" signal: dragging
//! left of the press origin by more than the threshold means the user wants
//! to throw the recording away.

/// Default horizontal drag distance, in pixels, that turns a press into a cancel
pub const DEFAULT_CANCEL_THRESHOLD_PX: f32 = 80.0;

#[derive(Debug, Clone)]
pub struct GestureTracker {
    threshold_px: f32,
    origin_x: Option<f32>,
    cancelling: bool,
}

impl GestureTracker {
    pub fn new(threshold_px: f32) -> Self {
        Self {
            threshold_px: threshold_px.abs(),
            origin_x: None,
            cancelling: false,
        }
    }

    /// Begin a new gesture. `x` may be unknown when the platform event lacked coordinates.
    pub fn on_press_start(&mut self, x: Option<f32>) {
        self.origin_x = x;
        self.cancelling = false;
    }

    /// Feed a pointer position.
    ///
    /// Returns `Some(cancelling)` only when the signal flips, so callers never
    /// redo work for an unchanged value.
    pub fn on_move(&mut self, x: f32) -> Option<bool> {
        let Some(origin) = self.origin_x else {
            self.origin_x = Some(x);
            return None;
        };

        let cancelling = x - origin < -self.threshold_px;
        if cancelling == self.cancelling {
            return None;
        }

        self.cancelling = cancelling;
        Some(cancelling)
    }

    pub fn is_cancelling(&self) -> bool {
        self.cancelling
    }

    pub fn origin_x(&self) -> Option<f32> {
        self.origin_x
    }

    /// Forget the current gesture
    pub fn reset(&mut self) {
        self.origin_x = None;
        self.cancelling = false;
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CANCEL_THRESHOLD_PX)
    }
}
