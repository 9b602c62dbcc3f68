//! Ellipse layer payload.

use serde::{Deserialize, Serialize};

/// An ellipse defined by its two radii.
///
/// The layer geometry positions the top-left corner of the ellipse's
/// bounding box, so a circle of radius `r` occupies a `2r x 2r` box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseLayer {
    pub rx: f64,
    pub ry: f64,
}

impl EllipseLayer {
    pub fn new(rx: f64, ry: f64) -> Self {
        Self { rx, ry }
    }
}
