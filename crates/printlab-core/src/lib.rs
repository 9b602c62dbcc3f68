//! # Printlab Core
//!
//! Core types and utilities shared by the Printlab document and export
//! crates: the error taxonomy, millimeter/pixel unit conversion, and basic
//! 2D geometry primitives.

pub mod constants;
pub mod error;
pub mod geometry;
pub mod units;

pub use error::{DocumentError, Error, ExportError, Result};
pub use geometry::{rotate_point, Bounds, Point};
pub use units::{mm_to_pixels, pixels_to_mm, raster_size, Resolution};
