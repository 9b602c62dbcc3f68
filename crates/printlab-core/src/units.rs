//! Unit conversion utilities
//!
//! Handles conversion between physical millimeters and pixel space at a
//! chosen resolution (dots per inch). The millimeter value is always the
//! source of truth; pixel dimensions are derived, never stored.

use serde::{Deserialize, Serialize};

use crate::constants::MM_PER_INCH;
use crate::error::{DocumentError, Result};

/// A validated export/preview resolution.
///
/// Couples the nominal DPI with an oversampling multiplier so callers can
/// request e.g. 2x supersampling independently of the nominal resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Dots per inch.
    pub dpi: f64,
    /// Oversampling factor applied on top of the DPI.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

impl Resolution {
    /// Creates a resolution, validating both components.
    pub fn new(dpi: f64, multiplier: f64) -> Result<Self> {
        validate_positive("dpi", dpi)?;
        validate_positive("multiplier", multiplier)?;
        Ok(Self { dpi, multiplier })
    }

    /// The effective dots per inch after oversampling.
    pub fn effective_dpi(&self) -> f64 {
        self.dpi * self.multiplier
    }

    /// Pixels per millimeter at the effective resolution.
    pub fn pixels_per_mm(&self) -> f64 {
        self.effective_dpi() / MM_PER_INCH
    }
}

fn validate_positive(what: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DocumentError::InvalidDimension { what, value }.into());
    }
    Ok(())
}

fn validate_finite(what: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(DocumentError::InvalidDimension { what, value }.into());
    }
    Ok(())
}

/// Converts millimeters to whole pixels at the given DPI.
///
/// Rounds to the nearest pixel, ties away from zero, because downstream
/// rasterization requires integral buffer dimensions.
pub fn mm_to_pixels(value_mm: f64, dpi: f64) -> Result<i64> {
    validate_finite("valueMm", value_mm)?;
    validate_positive("dpi", dpi)?;
    Ok((value_mm / MM_PER_INCH * dpi).round() as i64)
}

/// Converts pixels back to millimeters at the given DPI.
pub fn pixels_to_mm(pixels: f64, dpi: f64) -> Result<f64> {
    validate_finite("pixels", pixels)?;
    validate_positive("dpi", dpi)?;
    Ok(pixels / dpi * MM_PER_INCH)
}

/// Exact (un-rounded) pixel measure of a millimeter value.
///
/// Used for placement offsets, where rounding each offset independently
/// would accumulate error across a sheet.
pub fn mm_to_pixels_f64(value_mm: f64, dpi: f64) -> Result<f64> {
    validate_finite("valueMm", value_mm)?;
    validate_positive("dpi", dpi)?;
    Ok(value_mm / MM_PER_INCH * dpi)
}

/// Computes the integral raster buffer size for a physical document size.
///
/// Returns `InvalidDimension` when either source dimension is not a
/// positive finite millimeter value, or when rounding produces an empty
/// buffer.
pub fn raster_size(width_mm: f64, height_mm: f64, resolution: Resolution) -> Result<(u32, u32)> {
    validate_positive("widthMm", width_mm)?;
    validate_positive("heightMm", height_mm)?;

    let dpi = resolution.effective_dpi();
    let w = mm_to_pixels(width_mm, dpi)?;
    let h = mm_to_pixels(height_mm, dpi)?;
    if w <= 0 || h <= 0 {
        return Err(DocumentError::InvalidDimension {
            what: "rasterSize",
            value: (w.min(h)) as f64,
        }
        .into());
    }
    Ok((w as u32, h as u32))
}
