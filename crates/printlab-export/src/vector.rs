//! Vector renderer: emits the document as standalone SVG markup.
//!
//! Paths and text stay scalable primitives instead of being flattened to
//! pixels. The SVG user space is the document's 96 dpi pixel space; the
//! root `width`/`height` attributes carry the physical size in mm so the
//! output prints at true scale.
//!
//! Crop marks are drawn just outside each corner of the trim box and are
//! only meaningful for print-oriented vector output, so they are emitted
//! here and never by the raster path.

use std::fmt::Write as _;

use base64::Engine as _;

use printlab_core::constants::{CROP_MARK_GAP_MM, CROP_MARK_LEN_MM, MM_PER_INCH, PREVIEW_DPI};
use printlab_core::error::{DocumentError, Result};

use printlab_document::{Document, Layer, LayerId, LayerKind, Paint, Style};

use crate::raster::ExportWarning;

/// SVG markup plus any degradation warnings.
pub struct VectorOutput {
    pub svg: String,
    pub warnings: Vec<ExportWarning>,
}

/// Renders the document to SVG, optionally extended by bleed and framed
/// with crop marks.
pub fn render_svg(doc: &Document, bleed_mm: f64, crop_marks: bool) -> Result<VectorOutput> {
    if !bleed_mm.is_finite() || bleed_mm < 0.0 {
        return Err(DocumentError::InvalidDimension {
            what: "bleedMm",
            value: bleed_mm,
        }
        .into());
    }
    let ppm = PREVIEW_DPI / MM_PER_INCH;
    let doc_w = doc.width_mm() * ppm;
    let doc_h = doc.height_mm() * ppm;
    let bleed_px = bleed_mm * ppm;
    let mark_extent_mm = if crop_marks {
        bleed_mm.max(CROP_MARK_GAP_MM + CROP_MARK_LEN_MM)
    } else {
        bleed_mm
    };
    let outset_px = mark_extent_mm * ppm;

    let mut defs = String::new();
    let mut body = String::new();
    let mut warnings = Vec::new();
    let mut def_counter = 0usize;

    // Background covers the trim box plus the bleed band.
    let bg_fill = fill_attrs(&Some(*doc.background()), &mut defs, &mut def_counter);
    let _ = write!(
        body,
        "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{}/>\n",
        fmt(-bleed_px),
        fmt(-bleed_px),
        fmt(doc_w + 2.0 * bleed_px),
        fmt(doc_h + 2.0 * bleed_px),
        bg_fill
    );

    for &id in doc.root_layers() {
        layer_svg(doc, id, &mut body, &mut defs, &mut def_counter, &mut warnings, 1);
    }

    if crop_marks {
        body.push_str(&crop_mark_paths(doc_w, doc_h, ppm));
    }

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}mm\" height=\"{}mm\" viewBox=\"{} {} {} {}\">\n",
        fmt(doc.width_mm() + 2.0 * mark_extent_mm),
        fmt(doc.height_mm() + 2.0 * mark_extent_mm),
        fmt(-outset_px),
        fmt(-outset_px),
        fmt(doc_w + 2.0 * outset_px),
        fmt(doc_h + 2.0 * outset_px),
    );
    if !defs.is_empty() {
        svg.push_str("  <defs>\n");
        svg.push_str(&defs);
        svg.push_str("  </defs>\n");
    }
    svg.push_str(&body);
    svg.push_str("</svg>\n");

    Ok(VectorOutput { svg, warnings })
}

fn layer_svg(
    doc: &Document,
    id: LayerId,
    body: &mut String,
    defs: &mut String,
    def_counter: &mut usize,
    warnings: &mut Vec<ExportWarning>,
    depth: usize,
) {
    let Some(layer) = doc.get(id) else {
        return;
    };
    if !layer.visible {
        return;
    }
    let indent = "  ".repeat(depth);

    // Clip in parent space, outside the layer's own transform.
    let clip_attr = match layer.clip_mask.and_then(|m| doc.bounds_in_parent(m).ok()) {
        Some(b) if !b.is_empty() => {
            *def_counter += 1;
            let clip_id = format!("clip{def_counter}");
            let _ = write!(
                defs,
                "    <clipPath id=\"{}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/></clipPath>\n",
                clip_id,
                fmt(b.min_x),
                fmt(b.min_y),
                fmt(b.width()),
                fmt(b.height())
            );
            format!(" clip-path=\"url(#{clip_id})\"")
        }
        _ => String::new(),
    };

    let opacity_attr = if layer.style.opacity < 1.0 {
        format!(" opacity=\"{}\"", fmt(layer.style.opacity))
    } else {
        String::new()
    };

    let _ = write!(
        body,
        "{}<g transform=\"{}\"{}{}>\n",
        indent,
        transform_attr(layer),
        clip_attr,
        opacity_attr
    );

    match &layer.kind {
        LayerKind::Group(g) => {
            for &child in &g.children {
                layer_svg(doc, child, body, defs, def_counter, warnings, depth + 1);
            }
        }
        LayerKind::Rect(rect) => {
            let attrs = style_attrs(&layer.style, defs, def_counter);
            let radius = rect.effective_corner_radius();
            let rx = if radius > 0.0 {
                format!(" rx=\"{}\"", fmt(radius))
            } else {
                String::new()
            };
            let _ = write!(
                body,
                "{}  <rect width=\"{}\" height=\"{}\"{}{}/>\n",
                indent,
                fmt(rect.width),
                fmt(rect.height),
                rx,
                attrs
            );
        }
        LayerKind::Ellipse(ellipse) => {
            let attrs = style_attrs(&layer.style, defs, def_counter);
            let _ = write!(
                body,
                "{}  <ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"{}/>\n",
                indent,
                fmt(ellipse.rx),
                fmt(ellipse.ry),
                fmt(ellipse.rx),
                fmt(ellipse.ry),
                attrs
            );
        }
        LayerKind::Path(path) => {
            let attrs = style_attrs(&layer.style, defs, def_counter);
            let _ = write!(
                body,
                "{}  <path d=\"{}\"{}/>\n",
                indent,
                escape(&path.data),
                attrs
            );
        }
        LayerKind::Text(text) => {
            let attrs = style_attrs(&layer.style, defs, def_counter);
            let weight = if text.bold { " font-weight=\"bold\"" } else { "" };
            let style = if text.italic { " font-style=\"italic\"" } else { "" };
            let _ = write!(
                body,
                "{}  <text font-family=\"{}\" font-size=\"{}\"{}{}{}>\n",
                indent,
                escape(&text.font_family),
                fmt(text.font_size),
                weight,
                style,
                attrs
            );
            for (i, line) in text.content.lines().enumerate() {
                let _ = write!(
                    body,
                    "{}    <tspan x=\"0\" y=\"{}\">{}</tspan>\n",
                    indent,
                    fmt((i + 1) as f64 * text.font_size),
                    escape(line)
                );
            }
            let _ = write!(body, "{}  </text>\n", indent);
        }
        LayerKind::Image(image) => {
            let (w, h) = image.intrinsic_size();
            match image_href(&image.data) {
                Some(href) => {
                    let _ = write!(
                        body,
                        "{}  <image width=\"{}\" height=\"{}\" href=\"{}\"/>\n",
                        indent,
                        fmt(w),
                        fmt(h),
                        href
                    );
                }
                None => {
                    let _ = write!(
                        body,
                        "{}  <rect width=\"{}\" height=\"{}\" fill=\"#dcdcdc\"/>\n",
                        indent,
                        fmt(w),
                        fmt(h)
                    );
                    warnings.push(ExportWarning {
                        layer: Some(layer.id),
                        message: "embedded image could not be decoded, rendered placeholder"
                            .to_string(),
                    });
                }
            }
        }
        LayerKind::Unknown(_) => {}
    }

    let _ = write!(body, "{}</g>\n", indent);
}

/// Eight corner marks just outside the trim box, one horizontal and one
/// vertical per corner.
fn crop_mark_paths(doc_w: f64, doc_h: f64, ppm: f64) -> String {
    let gap = CROP_MARK_GAP_MM * ppm;
    let len = CROP_MARK_LEN_MM * ppm;
    let mut d = String::new();
    // Per corner: (corner x, corner y, x direction away, y direction away)
    let corners = [
        (0.0, 0.0, -1.0, -1.0),
        (doc_w, 0.0, 1.0, -1.0),
        (doc_w, doc_h, 1.0, 1.0),
        (0.0, doc_h, -1.0, 1.0),
    ];
    for (cx, cy, dx, dy) in corners {
        // Horizontal mark.
        let _ = write!(
            d,
            "M {} {} L {} {} ",
            fmt(cx + dx * (gap + len)),
            fmt(cy),
            fmt(cx + dx * gap),
            fmt(cy)
        );
        // Vertical mark.
        let _ = write!(
            d,
            "M {} {} L {} {} ",
            fmt(cx),
            fmt(cy + dy * (gap + len)),
            fmt(cx),
            fmt(cy + dy * gap)
        );
    }
    format!(
        "  <path class=\"crop-marks\" d=\"{}\" stroke=\"#000000\" stroke-width=\"1\" fill=\"none\"/>\n",
        d.trim_end()
    )
}

/// `translate(...) rotate(...) scale(...)`: rightmost applies first, so
/// content is scaled, rotated about its center, then placed.
fn transform_attr(layer: &Layer) -> String {
    let geo = &layer.geometry;
    let mut out = format!("translate({} {})", fmt(geo.x), fmt(geo.y));
    if geo.rotation_deg != 0.0 {
        let (w, h) = layer.kind.intrinsic_size().unwrap_or((0.0, 0.0));
        let _ = write!(
            out,
            " rotate({} {} {})",
            fmt(geo.rotation_deg),
            fmt(w * geo.scale_x / 2.0),
            fmt(h * geo.scale_y / 2.0)
        );
    }
    if geo.scale_x != 1.0 || geo.scale_y != 1.0 {
        let _ = write!(out, " scale({} {})", fmt(geo.scale_x), fmt(geo.scale_y));
    }
    out
}

fn style_attrs(style: &Style, defs: &mut String, def_counter: &mut usize) -> String {
    let mut out = fill_attrs(&style.fill, defs, def_counter);
    if let Some(stroke) = &style.stroke {
        let _ = write!(
            out,
            " stroke=\"{}\" stroke-width=\"{}\"",
            stroke.color.to_css_rgb(),
            fmt(stroke.width)
        );
        if stroke.color.a < 255 {
            let _ = write!(out, " stroke-opacity=\"{}\"", fmt(stroke.color.a as f64 / 255.0));
        }
    }
    out
}

fn fill_attrs(fill: &Option<Paint>, defs: &mut String, def_counter: &mut usize) -> String {
    match fill {
        None => " fill=\"none\"".to_string(),
        Some(Paint::Solid { color }) => {
            let alpha = color.a as f64 / 255.0;
            if alpha < 1.0 {
                format!(
                    " fill=\"{}\" fill-opacity=\"{}\"",
                    color.to_css_rgb(),
                    fmt(alpha)
                )
            } else {
                format!(" fill=\"{}\"", color.to_css_rgb())
            }
        }
        Some(Paint::LinearGradient {
            start,
            end,
            angle_deg,
        }) => {
            *def_counter += 1;
            let grad_id = format!("grad{def_counter}");
            let _ = write!(
                defs,
                "    <linearGradient id=\"{}\" gradientTransform=\"rotate({} 0.5 0.5)\">\
<stop offset=\"0\" stop-color=\"{}\"/><stop offset=\"1\" stop-color=\"{}\"/></linearGradient>\n",
                grad_id,
                fmt(*angle_deg),
                start.to_css_rgb(),
                end.to_css_rgb()
            );
            format!(" fill=\"url(#{grad_id})\"")
        }
    }
}

fn image_href(data: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.as_bytes())
        .ok()?;
    let format = image::guess_format(&bytes).ok()?;
    let mime = match format {
        image::ImageFormat::Png => "image/png",
        image::ImageFormat::Jpeg => "image/jpeg",
        image::ImageFormat::Gif => "image/gif",
        image::ImageFormat::WebP => "image/webp",
        _ => "application/octet-stream",
    };
    Some(format!("data:{mime};base64,{data}"))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Trims trailing zeros so the markup stays readable.
fn fmt(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{value:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printlab_document::{ParentId, RectLayer, TextLayer};

    fn card_with_rect() -> Document {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let id = doc
            .add_layer(LayerKind::Rect(RectLayer::new(100.0, 60.0)), ParentId::Root)
            .unwrap();
        doc.translate(id, 10.0, 10.0).unwrap();
        doc
    }

    #[test]
    fn test_svg_carries_physical_size() {
        let out = render_svg(&card_with_rect(), 0.0, false).unwrap();
        assert!(out.svg.starts_with("<svg xmlns"));
        assert!(out.svg.contains("width=\"90mm\""));
        assert!(out.svg.contains("height=\"50mm\""));
        assert!(out.svg.contains("<rect width=\"100\" height=\"60\""));
    }

    #[test]
    fn test_crop_marks_only_when_requested() {
        let plain = render_svg(&card_with_rect(), 0.0, false).unwrap();
        assert!(!plain.svg.contains("crop-marks"));

        let marked = render_svg(&card_with_rect(), 0.0, true).unwrap();
        assert!(marked.svg.contains("crop-marks"));
        // The viewBox grows to make room for the marks.
        assert!(marked.svg.contains("width=\"104mm\""));
    }

    #[test]
    fn test_bleed_expands_viewbox_and_size() {
        let out = render_svg(&card_with_rect(), 3.0, false).unwrap();
        assert!(out.svg.contains("width=\"96mm\""));
        assert!(out.svg.contains("height=\"56mm\""));
    }

    #[test]
    fn test_text_is_preserved_as_text() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        doc.add_layer(
            LayerKind::Text(TextLayer::new("Jane <Doe> & Co", 12.0)),
            ParentId::Root,
        )
        .unwrap();
        let out = render_svg(&doc, 0.0, false).unwrap();
        assert!(out.svg.contains("<text"));
        assert!(out.svg.contains("Jane &lt;Doe&gt; &amp; Co"));
    }

    #[test]
    fn test_invisible_layers_are_omitted() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let id = doc
            .add_layer(LayerKind::Rect(RectLayer::new(10.0, 10.0)), ParentId::Root)
            .unwrap();
        doc.set_visible(id, false).unwrap();
        let out = render_svg(&doc, 0.0, false).unwrap();
        assert!(!out.svg.contains("<rect width=\"10\""));
    }

    #[test]
    fn test_bad_image_adds_warning() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let id = doc
            .add_layer(
                LayerKind::Image(printlab_document::ImageLayer::new("@@@not-base64@@@")),
                ParentId::Root,
            )
            .unwrap();
        let out = render_svg(&doc, 0.0, false).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].layer, Some(id));
    }

    #[test]
    fn test_negative_bleed_rejected() {
        assert!(render_svg(&card_with_rect(), -2.0, false).is_err());
    }
}
