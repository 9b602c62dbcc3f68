//! Export pipeline: turns an export request into an encoded artifact.
//!
//! Single-document exports render once and encode. Sheet exports render the
//! document once, then composite that image at every planned placement;
//! when a copy count needs more than one sheet, the artifact is paginated
//! with one encoded image per sheet. Cancellation is cooperative and only
//! checked between pages, since a partially composited sheet is not useful
//! output.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tiny_skia::{Pixmap, PixmapPaint, Transform};

use printlab_core::error::{ExportError, Result};
use printlab_core::units::{mm_to_pixels_f64, raster_size, Resolution};

use printlab_document::Document;

use crate::packing::{plan_sheet, SheetSpec};
use crate::raster::{render_document, ExportWarning};
use crate::vector::render_svg;

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Svg,
}

/// An export request as received from the print/export UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub dpi: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Canvas extension on every edge, in mm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bleed_mm: Option<f64>,
    /// Trim-line marks; vector output only.
    #[serde(default)]
    pub crop_marks: bool,
    /// When present, copies are packed onto sheets of this size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<SheetSpec>,
    /// Copy count for sheet assembly; defaults to one full sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copies: Option<usize>,
}

fn default_multiplier() -> f64 {
    1.0
}

/// The produced output.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactPayload {
    /// A single encoded raster image.
    Raster(Vec<u8>),
    /// Standalone vector markup.
    Vector(String),
    /// One encoded raster image per sheet.
    Pages(Vec<Vec<u8>>),
}

/// An export result: the payload plus any per-layer degradation warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub payload: ArtifactPayload,
    pub warnings: Vec<ExportWarning>,
}

/// Shared cancellation flag for long-running exports.
///
/// Clone the flag into whatever drives the export; `cancel()` from any
/// thread stops the pipeline at the next page boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs an export request against a document snapshot.
///
/// The document must not be mutated for the duration of the call; pass a
/// clone when exporting off the edit thread.
pub fn export(doc: &Document, request: &ExportRequest, cancel: &CancelFlag) -> Result<ExportArtifact> {
    let bleed_mm = request.bleed_mm.unwrap_or(0.0);

    if request.format == ExportFormat::Svg {
        // Sheet assembly is raster-only; an SVG request exports the single
        // document.
        let out = render_svg(doc, bleed_mm, request.crop_marks)?;
        return Ok(ExportArtifact {
            payload: ArtifactPayload::Vector(out.svg),
            warnings: out.warnings,
        });
    }

    let resolution = Resolution::new(request.dpi, request.multiplier)?;
    let rendered = render_document(doc, resolution, bleed_mm)?;

    match &request.sheet {
        None => {
            let bytes = encode(&rendered.pixmap, request.format)?;
            Ok(ExportArtifact {
                payload: ArtifactPayload::Raster(bytes),
                warnings: rendered.warnings,
            })
        }
        Some(sheet) => {
            let pages = assemble_sheets(
                &rendered.pixmap,
                doc,
                sheet,
                resolution,
                bleed_mm,
                request.copies,
                request.format,
                cancel,
            )?;
            Ok(ExportArtifact {
                payload: ArtifactPayload::Pages(pages),
                warnings: rendered.warnings,
            })
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble_sheets(
    rendered: &Pixmap,
    doc: &Document,
    sheet: &SheetSpec,
    resolution: Resolution,
    bleed_mm: f64,
    copies: Option<usize>,
    format: ExportFormat,
    cancel: &CancelFlag,
) -> Result<Vec<Vec<u8>>> {
    let plan = plan_sheet(sheet, doc.width_mm(), doc.height_mm())?;
    let per_sheet = plan.capacity();
    let copies = copies.unwrap_or(per_sheet).max(1);
    let page_count = copies.div_ceil(per_sheet);

    let (sheet_w, sheet_h) = raster_size(sheet.width_mm, sheet.height_mm, resolution)?;
    let dpi = resolution.effective_dpi();
    // Copies carry their bleed band; placements address the trim corner.
    let bleed_px = mm_to_pixels_f64(bleed_mm, dpi)?;

    let mut pages = Vec::with_capacity(page_count);
    let mut remaining = copies;
    for page in 0..page_count {
        if cancel.is_cancelled() {
            tracing::info!(pages_done = page, "sheet export cancelled");
            return Err(ExportError::Cancelled { pages_done: page }.into());
        }
        let Some(mut canvas) = Pixmap::new(sheet_w, sheet_h) else {
            return Err(ExportError::InvalidExportGeometry {
                width: sheet_w as i64,
                height: sheet_h as i64,
            }
            .into());
        };
        canvas.fill(tiny_skia::Color::WHITE);

        for placement in plan.placements.iter().take(remaining) {
            let x = mm_to_pixels_f64(placement.x_mm, dpi)? - bleed_px;
            let y = mm_to_pixels_f64(placement.y_mm, dpi)? - bleed_px;
            canvas.draw_pixmap(
                x.round() as i32,
                y.round() as i32,
                rendered.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        remaining = remaining.saturating_sub(per_sheet);
        pages.push(encode(&canvas, format)?);
    }
    Ok(pages)
}

/// Encodes a pixmap with the image crate, demultiplying tiny-skia's
/// premultiplied buffer first.
fn encode(pixmap: &Pixmap, format: ExportFormat) -> Result<Vec<u8>> {
    let mut rgba = image::RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, px) in rgba.pixels_mut().zip(pixmap.pixels()) {
        let c = px.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut out = Cursor::new(Vec::new());
    let result = match format {
        ExportFormat::Png => image::DynamicImage::ImageRgba8(rgba).write_to(&mut out, image::ImageFormat::Png),
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
            image::DynamicImage::ImageRgb8(rgb).write_to(&mut out, image::ImageFormat::Jpeg)
        }
        ExportFormat::Svg => unreachable!("vector output never reaches the raster encoder"),
    };
    result.map_err(|e| ExportError::EncodingFailed {
        reason: e.to_string(),
    })?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Document {
        Document::new(90.0, 50.0).unwrap()
    }

    fn raster_request(format: ExportFormat) -> ExportRequest {
        ExportRequest {
            format,
            dpi: 96.0,
            multiplier: 1.0,
            bleed_mm: None,
            crop_marks: false,
            sheet: None,
            copies: None,
        }
    }

    #[test]
    fn test_png_export_produces_png_bytes() {
        let artifact = export(&card(), &raster_request(ExportFormat::Png), &CancelFlag::new())
            .unwrap();
        let ArtifactPayload::Raster(bytes) = artifact.payload else {
            panic!("expected raster payload");
        };
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_jpeg_export_produces_jpeg_bytes() {
        let artifact = export(&card(), &raster_request(ExportFormat::Jpeg), &CancelFlag::new())
            .unwrap();
        let ArtifactPayload::Raster(bytes) = artifact.payload else {
            panic!("expected raster payload");
        };
        assert_eq!(&bytes[0..2], &[0xff, 0xd8]);
    }

    #[test]
    fn test_svg_request_returns_vector_payload() {
        let mut request = raster_request(ExportFormat::Svg);
        request.crop_marks = true;
        let artifact = export(&card(), &request, &CancelFlag::new()).unwrap();
        let ArtifactPayload::Vector(svg) = artifact.payload else {
            panic!("expected vector payload");
        };
        assert!(svg.contains("crop-marks"));
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::json!({
            "format": "png",
            "dpi": 300.0,
            "bleedMm": 3.0,
            "sheet": { "widthMm": 210.0, "heightMm": 297.0, "marginMm": 5.0, "gapMm": 2.0 },
            "copies": 25
        });
        let request: ExportRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.format, ExportFormat::Png);
        assert_eq!(request.multiplier, 1.0);
        assert_eq!(request.bleed_mm, Some(3.0));
        assert!(!request.crop_marks);
        assert_eq!(request.copies, Some(25));
    }

    #[test]
    fn test_sheet_export_paginates_by_capacity() {
        // 10 copies fit per A4 sheet; 25 copies need 3 pages.
        let mut request = raster_request(ExportFormat::Png);
        request.sheet = Some(SheetSpec {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 5.0,
            gap_mm: 2.0,
        });
        request.copies = Some(25);
        let artifact = export(&card(), &request, &CancelFlag::new()).unwrap();
        let ArtifactPayload::Pages(pages) = artifact.payload else {
            panic!("expected paginated payload");
        };
        assert_eq!(pages.len(), 3);
    }

    #[test]
    fn test_pre_cancelled_export_stops_before_first_page() {
        let mut request = raster_request(ExportFormat::Png);
        request.sheet = Some(SheetSpec {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 5.0,
            gap_mm: 2.0,
        });
        request.copies = Some(25);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = export(&card(), &request, &cancel).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_invalid_dpi_rejected() {
        let mut request = raster_request(ExportFormat::Png);
        request.dpi = 0.0;
        assert!(export(&card(), &request, &CancelFlag::new()).is_err());
    }
}
