//! Raster image layer payload.
//!
//! The pixel data travels inside the document as a base64 string so the
//! persisted form stays a plain JSON tree. Decoding happens in the export
//! pipeline; an undecodable payload degrades to a placeholder there instead
//! of failing the model.

use serde::{Deserialize, Serialize};

/// Fallback square used when a payload carries no natural size.
const DEFAULT_EDGE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLayer {
    /// Base64-encoded PNG or JPEG bytes.
    pub data: String,
    /// Pixel width of the source, recorded at import time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<f64>,
    /// Pixel height of the source, recorded at import time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<f64>,
}

impl ImageLayer {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            natural_width: None,
            natural_height: None,
        }
    }

    pub fn with_natural_size(data: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            data: data.into(),
            natural_width: Some(width),
            natural_height: Some(height),
        }
    }

    pub fn intrinsic_size(&self) -> (f64, f64) {
        (
            self.natural_width.unwrap_or(DEFAULT_EDGE),
            self.natural_height.unwrap_or(DEFAULT_EDGE),
        )
    }
}
