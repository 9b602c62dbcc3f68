//! Rectangle layer payload.

use serde::{Deserialize, Serialize};

/// A rectangle with optional rounded corners.
///
/// Position, scale, and rotation live on the owning layer's geometry; this
/// payload only carries the intrinsic size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectLayer {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub corner_radius: f64,
}

impl RectLayer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            corner_radius: 0.0,
        }
    }

    /// Corner radius clamped so it never exceeds half the shorter side.
    pub fn effective_corner_radius(&self) -> f64 {
        let max_radius = self.width.min(self.height).abs() / 2.0;
        self.corner_radius.clamp(0.0, max_radius)
    }
}
