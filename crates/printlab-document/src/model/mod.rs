//! The layer model: one module per drawable kind plus the enum wrapper.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use printlab_core::geometry::{rotated_rect_bounds, Bounds};

mod ellipse;
mod image;
mod path;
mod rect;
mod text;

pub use ellipse::EllipseLayer;
pub use image::ImageLayer;
pub use path::PathLayer;
pub use rect::RectLayer;
pub use text::TextLayer;

/// Stable layer identifier, unique within a document.
///
/// Survives undo/redo and rename; assigned once when the layer is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Placement of a layer in the document's pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default)]
    pub rotation_deg: f64,
}

fn one() -> f64 {
    1.0
}

impl Geometry {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_deg: 0.0,
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

/// An opaque sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    /// CSS hex form, `#rrggbb` or `#rrggbbaa`.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Hex form without the alpha channel, for formats that carry opacity
    /// in a separate attribute.
    pub fn to_css_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A fill descriptor: solid color or a two-stop linear gradient.
///
/// Used both for layer fills and for the document background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Paint {
    Solid { color: Color },
    LinearGradient {
        start: Color,
        end: Color,
        #[serde(default)]
        angle_deg: f64,
    },
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Paint::Solid { color }
    }
}

/// Stroke style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

/// Drop shadow style. Rendered without blur by the raster pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    #[serde(default)]
    pub blur: f64,
    pub color: Color,
}

/// Optional style bag attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Paint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
    #[serde(default = "one")]
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(Paint::solid(Color::BLACK)),
            stroke: None,
            shadow: None,
            opacity: 1.0,
        }
    }
}

/// A group's ordered list of child layer identifiers.
///
/// Ownership is exclusive: a layer id appears in at most one group (or the
/// document root), never both.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupLayer {
    pub children: Vec<LayerId>,
}

/// A layer kind saved by a newer version of the application.
///
/// Preserved opaquely so documents round-trip without data loss; not
/// editable and rendered as nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnknownLayer {
    pub kind: String,
    pub payload: serde_json::Value,
}

/// Closed set of drawable layer kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Text(TextLayer),
    Rect(RectLayer),
    Ellipse(EllipseLayer),
    Path(PathLayer),
    Image(ImageLayer),
    Group(GroupLayer),
    Unknown(UnknownLayer),
}

impl LayerKind {
    /// The wire tag for this kind, matching the persisted `kind` field.
    pub fn tag(&self) -> &str {
        match self {
            LayerKind::Text(_) => "text",
            LayerKind::Rect(_) => "rect",
            LayerKind::Ellipse(_) => "ellipse",
            LayerKind::Path(_) => "path",
            LayerKind::Image(_) => "image",
            LayerKind::Group(_) => "group",
            LayerKind::Unknown(u) => &u.kind,
        }
    }

    /// Default human-readable name for a freshly created layer.
    pub fn default_name(&self) -> &str {
        match self {
            LayerKind::Text(_) => "Text",
            LayerKind::Rect(_) => "Rectangle",
            LayerKind::Ellipse(_) => "Ellipse",
            LayerKind::Path(_) => "Path",
            LayerKind::Image(_) => "Image",
            LayerKind::Group(_) => "Group",
            LayerKind::Unknown(_) => "Unknown",
        }
    }

    /// Intrinsic (unscaled, unrotated) size of the kind's content.
    ///
    /// Groups and unknown kinds have no intrinsic size of their own.
    pub fn intrinsic_size(&self) -> Option<(f64, f64)> {
        match self {
            LayerKind::Text(t) => Some(t.intrinsic_size()),
            LayerKind::Rect(r) => Some((r.width, r.height)),
            LayerKind::Ellipse(e) => Some((e.rx * 2.0, e.ry * 2.0)),
            LayerKind::Path(p) => Some(p.intrinsic_size()),
            LayerKind::Image(i) => Some(i.intrinsic_size()),
            LayerKind::Group(_) | LayerKind::Unknown(_) => None,
        }
    }
}

/// One drawable entity in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    pub geometry: Geometry,
    pub style: Style,
    pub clip_mask: Option<LayerId>,
    pub kind: LayerKind,
}

impl Layer {
    /// Creates a layer with a fresh id and the kind's default name.
    pub fn new(kind: LayerKind) -> Self {
        Self {
            id: LayerId::generate(),
            name: kind.default_name().to_string(),
            visible: true,
            locked: false,
            geometry: Geometry::default(),
            style: Style::default(),
            clip_mask: None,
            kind,
        }
    }

    /// Axis-aligned bounds of this layer's own content in its parent's
    /// coordinate space. Groups report `None` here; the document computes
    /// their bounds from children.
    pub fn local_bounds(&self) -> Option<Bounds> {
        let (w, h) = self.kind.intrinsic_size()?;
        Some(rotated_rect_bounds(
            self.geometry.x,
            self.geometry.y,
            w * self.geometry.scale_x,
            h * self.geometry.scale_y,
            self.geometry.rotation_deg,
        ))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_css_forms() {
        assert_eq!(Color::rgb(255, 0, 128).to_css(), "#ff0080");
        let c = Color {
            r: 0,
            g: 0,
            b: 0,
            a: 128,
        };
        assert_eq!(c.to_css(), "#00000080");
    }

    #[test]
    fn test_layer_defaults() {
        let layer = Layer::new(LayerKind::Rect(RectLayer::new(40.0, 20.0)));
        assert_eq!(layer.name, "Rectangle");
        assert!(layer.visible);
        assert!(!layer.locked);
        assert_eq!(layer.geometry, Geometry::at(0.0, 0.0));
    }

    #[test]
    fn test_rotated_local_bounds() {
        let mut layer = Layer::new(LayerKind::Rect(RectLayer::new(10.0, 10.0)));
        layer.geometry.rotation_deg = 45.0;
        let b = layer.local_bounds().unwrap();
        let span = 10.0 * std::f64::consts::SQRT_2;
        assert!((b.width() - span).abs() < 1e-9);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Layer::new(LayerKind::Rect(RectLayer::new(1.0, 1.0)));
        let b = Layer::new(LayerKind::Rect(RectLayer::new(1.0, 1.0)));
        assert_ne!(a.id, b.id);
    }
}
