//! Raster renderer: draws a document to a tiny-skia pixmap.
//!
//! This is the single render path for both on-screen preview and print
//! export; only the resolution differs. Layer geometry is stored in
//! document pixel space at 96 dpi, so exporting at another resolution is
//! a uniform scale of `effective_dpi / 96`.
//!
//! Bleed extends the output canvas on every edge; background and any
//! geometry reaching past the trim line paint into the extension band
//! because nothing is clipped to the trim box.

use base64::Engine as _;
use rusttype::{point as rt_point, Scale};
use tiny_skia::{
    Color as SkColor, FillRule, GradientStop, LinearGradient, Mask, Paint as SkPaint, PathBuilder,
    Pixmap, PixmapPaint, SpreadMode, Stroke as SkStroke, Transform,
};

use printlab_core::constants::PREVIEW_DPI;
use printlab_core::error::{DocumentError, ExportError, Result};
use printlab_core::geometry::Bounds;
use printlab_core::units::{mm_to_pixels, mm_to_pixels_f64, Resolution};

use printlab_document::{Color, Document, Layer, LayerId, LayerKind, Paint, Style};

use crate::fonts;

/// A non-fatal problem encountered while producing an artifact, e.g. an
/// embedded image that failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportWarning {
    /// The layer that degraded, when attributable.
    pub layer: Option<LayerId>,
    pub message: String,
}

/// A rendered document plus any degradation warnings.
pub struct RenderOutput {
    pub pixmap: Pixmap,
    pub warnings: Vec<ExportWarning>,
}

/// Renders the whole document at the given resolution, extended by
/// `bleed_mm` on every edge.
pub fn render_document(
    doc: &Document,
    resolution: Resolution,
    bleed_mm: f64,
) -> Result<RenderOutput> {
    if !bleed_mm.is_finite() || bleed_mm < 0.0 {
        return Err(DocumentError::InvalidDimension {
            what: "bleedMm",
            value: bleed_mm,
        }
        .into());
    }
    let dpi = resolution.effective_dpi();
    let width_px = mm_to_pixels(doc.width_mm() + 2.0 * bleed_mm, dpi)?;
    let height_px = mm_to_pixels(doc.height_mm() + 2.0 * bleed_mm, dpi)?;
    if width_px <= 0 || height_px <= 0 {
        return Err(ExportError::InvalidExportGeometry {
            width: width_px,
            height: height_px,
        }
        .into());
    }
    let mut pixmap =
        Pixmap::new(width_px as u32, height_px as u32).ok_or(ExportError::InvalidExportGeometry {
            width: width_px,
            height: height_px,
        })?;

    fill_background(&mut pixmap, doc.background());

    let scale = (dpi / PREVIEW_DPI) as f32;
    let bleed_px = mm_to_pixels_f64(bleed_mm, dpi)? as f32;
    let root_ts = Transform::from_translate(bleed_px, bleed_px).pre_scale(scale, scale);

    let mut warnings = Vec::new();
    let mut renderer = Renderer {
        doc,
        pixmap: &mut pixmap,
        warnings: &mut warnings,
    };
    renderer.paint_layers(doc.root_layers(), root_ts, 1.0);

    tracing::debug!(
        width = width_px,
        height = height_px,
        warnings = warnings.len(),
        "document rendered"
    );
    Ok(RenderOutput { pixmap, warnings })
}

fn fill_background(pixmap: &mut Pixmap, background: &Paint) {
    match background {
        Paint::Solid { color } => pixmap.fill(to_sk_color(*color, 1.0)),
        Paint::LinearGradient { .. } => {
            let w = pixmap.width() as f32;
            let h = pixmap.height() as f32;
            let mut paint = SkPaint::default();
            let bounds = Bounds::new(0.0, 0.0, w as f64, h as f64);
            if set_paint(&mut paint, background, 1.0, bounds) {
                if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, w, h) {
                    let path = PathBuilder::from_rect(rect);
                    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
                }
            }
        }
    }
}

struct Renderer<'a> {
    doc: &'a Document,
    pixmap: &'a mut Pixmap,
    warnings: &'a mut Vec<ExportWarning>,
}

impl Renderer<'_> {
    fn paint_layers(&mut self, ids: &[LayerId], parent_ts: Transform, parent_opacity: f32) {
        for &id in ids {
            let Some(layer) = self.doc.get(id) else {
                continue;
            };
            if !layer.visible {
                continue;
            }
            let opacity = parent_opacity * layer.style.opacity as f32;
            let mask = self.make_clip_mask(layer, parent_ts);

            match &layer.kind {
                LayerKind::Group(g) => {
                    let geo = &layer.geometry;
                    let ts = parent_ts
                        .pre_concat(Transform::from_translate(geo.x as f32, geo.y as f32))
                        .pre_concat(Transform::from_rotate(geo.rotation_deg as f32))
                        .pre_concat(Transform::from_scale(
                            geo.scale_x as f32,
                            geo.scale_y as f32,
                        ));
                    self.paint_layers(&g.children, ts, opacity);
                }
                LayerKind::Text(_) => {
                    self.paint_text(layer, parent_ts, opacity, mask.as_ref());
                }
                LayerKind::Image(_) => {
                    self.paint_image(layer, parent_ts, opacity, mask.as_ref());
                }
                LayerKind::Unknown(u) => {
                    tracing::trace!(layer = %layer.id, kind = %u.kind, "skipping unknown layer kind");
                }
                kind => {
                    let Some(path) = shape_path(kind) else {
                        continue;
                    };
                    let ts = layer_transform(layer, parent_ts);
                    self.paint_shape(&path, &layer.style, ts, parent_ts, layer, opacity, mask.as_ref());
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_shape(
        &mut self,
        path: &tiny_skia::Path,
        style: &Style,
        ts: Transform,
        parent_ts: Transform,
        layer: &Layer,
        opacity: f32,
        mask: Option<&Mask>,
    ) {
        let bounds = path_bounds(path);

        if let Some(shadow) = &style.shadow {
            let shadow_parent = parent_ts
                .pre_translate(shadow.offset_x as f32, shadow.offset_y as f32);
            let shadow_ts = layer_transform(layer, shadow_parent);
            let mut paint = SkPaint::default();
            paint.anti_alias = true;
            paint.set_color(to_sk_color(shadow.color, opacity));
            self.pixmap
                .fill_path(path, &paint, FillRule::Winding, shadow_ts, mask);
        }

        if let Some(fill) = &style.fill {
            let mut paint = SkPaint::default();
            paint.anti_alias = true;
            if set_paint(&mut paint, fill, opacity, bounds) {
                self.pixmap
                    .fill_path(path, &paint, FillRule::Winding, ts, mask);
            }
        }

        if let Some(stroke) = &style.stroke {
            let mut paint = SkPaint::default();
            paint.anti_alias = true;
            paint.set_color(to_sk_color(stroke.color, opacity));
            // Stroke width is in document pixels; the path is in intrinsic
            // coordinates, so divide out the layer's own scale.
            let geo = &layer.geometry;
            let avg_scale = ((geo.scale_x.abs() + geo.scale_y.abs()) / 2.0).max(1e-6);
            let sk_stroke = SkStroke {
                width: (stroke.width / avg_scale) as f32,
                ..Default::default()
            };
            self.pixmap.stroke_path(path, &paint, &sk_stroke, ts, mask);
        }
    }

    fn paint_text(&mut self, layer: &Layer, parent_ts: Transform, opacity: f32, mask: Option<&Mask>) {
        let LayerKind::Text(text) = &layer.kind else {
            return;
        };
        let Some(font) = fonts::lookup(&text.font_family, text.bold, text.italic) else {
            self.paint_missing_asset(layer, parent_ts, opacity, mask);
            self.warnings.push(ExportWarning {
                layer: Some(layer.id),
                message: format!("font '{}' not found, rendered placeholder", text.font_family),
            });
            return;
        };

        let ts = layer_transform(layer, parent_ts);
        // Glyphs are rasterized in device space at the transform's overall
        // scale; text rotation is not applied to glyph pixels.
        let device_scale = transform_scale(ts);
        let scale = Scale::uniform((text.font_size as f32 * device_scale).max(0.1));
        let v_metrics = font.v_metrics(scale);
        let line_height = v_metrics.ascent - v_metrics.descent + v_metrics.line_gap;
        let origin = map_point(ts, 0.0, 0.0);

        let color = match layer.style.fill {
            Some(Paint::Solid { color }) => color,
            Some(Paint::LinearGradient { start, .. }) => start,
            None => return,
        };
        let alpha = (color.a as f32 / 255.0) * opacity;

        for (line_index, line) in text.content.lines().enumerate() {
            let baseline = rt_point(
                origin.0,
                origin.1 + v_metrics.ascent + line_index as f32 * line_height,
            );
            for glyph in font.layout(line, scale, baseline) {
                let Some(bb) = glyph.pixel_bounding_box() else {
                    continue;
                };
                let width = self.pixmap.width() as i32;
                let height = self.pixmap.height() as i32;
                let data = self.pixmap.data_mut();
                glyph.draw(|gx, gy, v| {
                    let px = gx as i32 + bb.min.x;
                    let py = gy as i32 + bb.min.y;
                    if px < 0 || px >= width || py < 0 || py >= height {
                        return;
                    }
                    let coverage = v * alpha;
                    if coverage <= 0.0 {
                        return;
                    }
                    let idx = ((py * width + px) * 4) as usize;
                    let pixel = &mut data[idx..idx + 4];
                    // Source-over with a premultiplied destination.
                    let src = [
                        color.r as f32 / 255.0 * coverage,
                        color.g as f32 / 255.0 * coverage,
                        color.b as f32 / 255.0 * coverage,
                        coverage,
                    ];
                    for (i, s) in src.iter().enumerate() {
                        let d = pixel[i] as f32 / 255.0;
                        pixel[i] = ((s + d * (1.0 - coverage)) * 255.0).min(255.0) as u8;
                    }
                });
            }
        }
    }

    fn paint_image(&mut self, layer: &Layer, parent_ts: Transform, opacity: f32, mask: Option<&Mask>) {
        let LayerKind::Image(image_layer) = &layer.kind else {
            return;
        };
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(image_layer.data.as_bytes())
            .ok()
            .and_then(|bytes| image::load_from_memory(&bytes).ok());
        let Some(decoded) = decoded else {
            self.paint_missing_asset(layer, parent_ts, opacity, mask);
            self.warnings.push(ExportWarning {
                layer: Some(layer.id),
                message: "embedded image could not be decoded, rendered placeholder".to_string(),
            });
            return;
        };

        let rgba = decoded.to_rgba8();
        let (src_w, src_h) = (rgba.width(), rgba.height());
        let Some(mut src) = Pixmap::new(src_w, src_h) else {
            return;
        };
        for (dst, px) in src.pixels_mut().iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = px.0;
            *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        let (iw, ih) = image_layer.intrinsic_size();
        let ts = layer_transform(layer, parent_ts).pre_concat(Transform::from_scale(
            (iw / src_w as f64) as f32,
            (ih / src_h as f64) as f32,
        ));
        let paint = PixmapPaint {
            opacity,
            ..Default::default()
        };
        self.pixmap.draw_pixmap(0, 0, src.as_ref(), &paint, ts, mask);
    }

    /// Gray box with a diagonal cross, standing in for an asset that
    /// failed to load.
    fn paint_missing_asset(
        &mut self,
        layer: &Layer,
        parent_ts: Transform,
        opacity: f32,
        mask: Option<&Mask>,
    ) {
        let (w, h) = layer.kind.intrinsic_size().unwrap_or((100.0, 100.0));
        let ts = layer_transform(layer, parent_ts);

        let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, w as f32, h as f32) else {
            return;
        };
        let rect_path = PathBuilder::from_rect(rect);
        let mut paint = SkPaint::default();
        paint.anti_alias = true;
        paint.set_color(to_sk_color(Color::rgb(220, 220, 220), opacity));
        self.pixmap
            .fill_path(&rect_path, &paint, FillRule::Winding, ts, mask);

        let mut pb = PathBuilder::new();
        pb.move_to(0.0, 0.0);
        pb.line_to(w as f32, h as f32);
        pb.move_to(w as f32, 0.0);
        pb.line_to(0.0, h as f32);
        if let Some(cross) = pb.finish() {
            paint.set_color(to_sk_color(Color::rgb(150, 150, 150), opacity));
            let stroke = SkStroke {
                width: 2.0,
                ..Default::default()
            };
            self.pixmap.stroke_path(&cross, &paint, &stroke, ts, mask);
        }
    }

    /// Rectangular clip from the mask target's bounds in the shared parent
    /// space. Mask targets that are not siblings are ignored.
    fn make_clip_mask(&self, layer: &Layer, parent_ts: Transform) -> Option<Mask> {
        let mask_id = layer.clip_mask?;
        let bounds = self.doc.bounds_in_parent(mask_id).ok()?;
        if bounds.is_empty() {
            return None;
        }
        let rect = tiny_skia::Rect::from_xywh(
            bounds.min_x as f32,
            bounds.min_y as f32,
            bounds.width() as f32,
            bounds.height() as f32,
        )?;
        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())?;
        mask.fill_path(
            &PathBuilder::from_rect(rect),
            FillRule::Winding,
            true,
            parent_ts,
        );
        Some(mask)
    }
}

/// Full device transform for a non-group layer: scale, then rotation
/// around the content center, then placement, then the parent transform.
fn layer_transform(layer: &Layer, parent_ts: Transform) -> Transform {
    let geo = &layer.geometry;
    let (w, h) = layer.kind.intrinsic_size().unwrap_or((0.0, 0.0));
    let cx = (w * geo.scale_x / 2.0) as f32;
    let cy = (h * geo.scale_y / 2.0) as f32;
    parent_ts
        .pre_concat(Transform::from_translate(geo.x as f32, geo.y as f32))
        .pre_concat(Transform::from_rotate_at(geo.rotation_deg as f32, cx, cy))
        .pre_concat(Transform::from_scale(
            geo.scale_x as f32,
            geo.scale_y as f32,
        ))
}

/// Path for a fillable shape kind, in intrinsic coordinates.
fn shape_path(kind: &LayerKind) -> Option<tiny_skia::Path> {
    match kind {
        LayerKind::Rect(rect) => {
            let (w, h) = (rect.width as f32, rect.height as f32);
            let r = rect.effective_corner_radius() as f32;
            if r <= 0.0 {
                return Some(PathBuilder::from_rect(tiny_skia::Rect::from_xywh(
                    0.0, 0.0, w, h,
                )?));
            }
            let mut pb = PathBuilder::new();
            pb.move_to(r, 0.0);
            pb.line_to(w - r, 0.0);
            pb.quad_to(w, 0.0, w, r);
            pb.line_to(w, h - r);
            pb.quad_to(w, h, w - r, h);
            pb.line_to(r, h);
            pb.quad_to(0.0, h, 0.0, h - r);
            pb.line_to(0.0, r);
            pb.quad_to(0.0, 0.0, r, 0.0);
            pb.close();
            pb.finish()
        }
        LayerKind::Ellipse(ellipse) => {
            let rect =
                tiny_skia::Rect::from_xywh(0.0, 0.0, (ellipse.rx * 2.0) as f32, (ellipse.ry * 2.0) as f32)?;
            PathBuilder::from_oval(rect)
        }
        LayerKind::Path(path_layer) => {
            let lyon_path = path_layer.to_lyon_path()?;
            let mut pb = PathBuilder::new();
            for event in lyon_path.iter() {
                match event {
                    lyon::path::Event::Begin { at } => pb.move_to(at.x, at.y),
                    lyon::path::Event::Line { to, .. } => pb.line_to(to.x, to.y),
                    lyon::path::Event::Quadratic { ctrl, to, .. } => {
                        pb.quad_to(ctrl.x, ctrl.y, to.x, to.y)
                    }
                    lyon::path::Event::Cubic {
                        ctrl1, ctrl2, to, ..
                    } => pb.cubic_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y),
                    lyon::path::Event::End { close, .. } => {
                        if close {
                            pb.close();
                        }
                    }
                }
            }
            pb.finish()
        }
        _ => None,
    }
}

/// Configures a tiny-skia paint from a fill descriptor. Gradient geometry
/// spans the given bounds in path space; `fill_path` carries the shader
/// into device space together with the path.
fn set_paint(paint: &mut SkPaint, fill: &Paint, opacity: f32, bounds: Bounds) -> bool {
    match fill {
        Paint::Solid { color } => {
            paint.set_color(to_sk_color(*color, opacity));
            true
        }
        Paint::LinearGradient {
            start,
            end,
            angle_deg,
        } => {
            let (sx, sy, ex, ey) = gradient_axis(bounds, *angle_deg);
            match LinearGradient::new(
                tiny_skia::Point::from_xy(sx, sy),
                tiny_skia::Point::from_xy(ex, ey),
                vec![
                    GradientStop::new(0.0, to_sk_color(*start, opacity)),
                    GradientStop::new(1.0, to_sk_color(*end, opacity)),
                ],
                SpreadMode::Pad,
                Transform::identity(),
            ) {
                Some(shader) => {
                    paint.shader = shader;
                    true
                }
                None => false,
            }
        }
    }
}

/// Start/end points of a gradient crossing `bounds` at `angle_deg`
/// (0 = left to right, 90 = top to bottom).
fn gradient_axis(bounds: Bounds, angle_deg: f64) -> (f32, f32, f32, f32) {
    let rad = angle_deg.to_radians();
    let (dx, dy) = (rad.cos(), rad.sin());
    let half = (bounds.width() * dx.abs() + bounds.height() * dy.abs()) / 2.0;
    let c = bounds.center();
    (
        (c.x - dx * half) as f32,
        (c.y - dy * half) as f32,
        (c.x + dx * half) as f32,
        (c.y + dy * half) as f32,
    )
}

fn to_sk_color(color: Color, opacity: f32) -> SkColor {
    let alpha = (color.a as f32 / 255.0 * opacity).clamp(0.0, 1.0);
    SkColor::from_rgba(
        color.r as f32 / 255.0,
        color.g as f32 / 255.0,
        color.b as f32 / 255.0,
        alpha,
    )
    .unwrap_or_else(|| SkColor::from_rgba8(color.r, color.g, color.b, color.a))
}

fn path_bounds(path: &tiny_skia::Path) -> Bounds {
    let b = path.bounds();
    Bounds::new(
        b.left() as f64,
        b.top() as f64,
        b.right() as f64,
        b.bottom() as f64,
    )
}

fn map_point(ts: Transform, x: f32, y: f32) -> (f32, f32) {
    (
        ts.sx * x + ts.kx * y + ts.tx,
        ts.ky * x + ts.sy * y + ts.ty,
    )
}

/// Overall scale magnitude of an affine transform, averaged over both
/// axes.
fn transform_scale(ts: Transform) -> f32 {
    let col_x = (ts.sx * ts.sx + ts.ky * ts.ky).sqrt();
    let col_y = (ts.kx * ts.kx + ts.sy * ts.sy).sqrt();
    (col_x + col_y) / 2.0
}
