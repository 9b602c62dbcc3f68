//! Persistence codec: the document as a JSON tree.
//!
//! The wire shape is `{ widthMm, heightMm, background, layers: [node] }`
//! where each node carries `id, kind, visible, locked, name, geometry,
//! style`, its kind-specific fields flattened alongside, and `children`
//! (nested nodes) only when `kind = "group"`. Layer kinds this build does
//! not know are kept opaquely and written back verbatim on save.
//!
//! History state is never serialized; loading a file always starts a
//! fresh history.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use printlab_core::error::{Error, Result};

use crate::document::{Document, ParentId};
use crate::model::{
    EllipseLayer, Geometry, GroupLayer, ImageLayer, Layer, LayerId, LayerKind, Paint, PathLayer,
    RectLayer, Style, TextLayer, UnknownLayer,
};

/// Current file format version.
pub const FORMAT_VERSION: &str = "1.0";

/// One serialized layer. Kind-specific fields live flattened in `payload`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerNode {
    id: LayerId,
    kind: String,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    locked: bool,
    name: String,
    geometry: Geometry,
    #[serde(default)]
    style: Style,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clip_mask: Option<LayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<LayerNode>>,
    #[serde(flatten)]
    payload: Value,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentBody {
    width_mm: f64,
    height_mm: f64,
    background: Paint,
    layers: Vec<LayerNode>,
}

/// Project metadata carried in the file envelope, owned by the save layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl DocumentMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            created: now,
            modified: now,
        }
    }
}

/// On-disk envelope: format version, metadata, then the document body
/// flattened alongside.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentFile {
    pub version: String,
    pub metadata: DocumentMetadata,
    #[serde(flatten)]
    document: DocumentBody,
}

/// Serializes a document to its JSON tree.
pub fn serialize_document(doc: &Document) -> Result<Value> {
    let body = document_to_body(doc)?;
    serde_json::to_value(body).map_err(|e| Error::other(e.to_string()))
}

/// Rebuilds a document from its JSON tree.
///
/// Rejects duplicate layer ids; preserves unknown layer kinds opaquely.
pub fn deserialize_document(value: &Value) -> Result<Document> {
    let body: DocumentBody =
        serde_json::from_value(value.clone()).map_err(|e| Error::other(e.to_string()))?;
    body_to_document(body)
}

/// Writes a document with metadata to disk as pretty-printed JSON.
pub fn save_to_file(
    doc: &Document,
    metadata: DocumentMetadata,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = DocumentFile {
        version: FORMAT_VERSION.to_string(),
        metadata: DocumentMetadata {
            modified: Utc::now(),
            ..metadata
        },
        document: document_to_body(doc)?,
    };
    let json = serde_json::to_string_pretty(&file).context("failed to serialize document")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write document to {}", path.display()))?;
    tracing::info!(path = %path.display(), "document saved");
    Ok(())
}

/// Reads a document and its metadata from disk.
pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<(Document, DocumentMetadata)> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document from {}", path.display()))?;
    let file: DocumentFile =
        serde_json::from_str(&json).context("failed to parse document file")?;
    let doc = body_to_document(file.document)
        .with_context(|| format!("invalid document in {}", path.display()))?;
    Ok((doc, file.metadata))
}

fn document_to_body(doc: &Document) -> Result<DocumentBody> {
    let mut layers = Vec::with_capacity(doc.root_layers().len());
    for &id in doc.root_layers() {
        layers.push(layer_to_node(doc, id)?);
    }
    Ok(DocumentBody {
        width_mm: doc.width_mm(),
        height_mm: doc.height_mm(),
        background: *doc.background(),
        layers,
    })
}

fn layer_to_node(doc: &Document, id: LayerId) -> Result<LayerNode> {
    let layer = doc.layer(id)?;
    let (payload, children) = match &layer.kind {
        LayerKind::Group(g) => {
            let mut nodes = Vec::with_capacity(g.children.len());
            for &child in &g.children {
                nodes.push(layer_to_node(doc, child)?);
            }
            (Value::Object(Default::default()), Some(nodes))
        }
        LayerKind::Unknown(u) => (u.payload.clone(), None),
        kind => (kind_payload(kind)?, None),
    };
    Ok(LayerNode {
        id: layer.id,
        kind: layer.kind.tag().to_string(),
        visible: layer.visible,
        locked: layer.locked,
        name: layer.name.clone(),
        geometry: layer.geometry,
        style: layer.style,
        clip_mask: layer.clip_mask,
        children,
        payload,
    })
}

fn kind_payload(kind: &LayerKind) -> Result<Value> {
    let value = match kind {
        LayerKind::Text(t) => serde_json::to_value(t),
        LayerKind::Rect(r) => serde_json::to_value(r),
        LayerKind::Ellipse(e) => serde_json::to_value(e),
        LayerKind::Path(p) => serde_json::to_value(p),
        LayerKind::Image(i) => serde_json::to_value(i),
        LayerKind::Group(_) | LayerKind::Unknown(_) => unreachable!("handled by caller"),
    };
    value.map_err(|e| Error::other(e.to_string()))
}

fn body_to_document(body: DocumentBody) -> Result<Document> {
    let mut doc = Document::new(body.width_mm, body.height_mm)?;
    doc.set_background(body.background);
    let mut seen = HashSet::new();
    for node in body.layers {
        insert_node(&mut doc, node, ParentId::Root, &mut seen)?;
    }
    Ok(doc)
}

fn insert_node(
    doc: &mut Document,
    node: LayerNode,
    parent: ParentId,
    seen: &mut HashSet<LayerId>,
) -> Result<()> {
    if !seen.insert(node.id) {
        return Err(Error::other(format!("duplicate layer id: {}", node.id)));
    }
    let children = node.children;
    let kind = node_kind(node.kind, node.payload)?;
    let is_group = matches!(kind, LayerKind::Group(_));
    let layer = Layer {
        id: node.id,
        name: node.name,
        visible: node.visible,
        locked: node.locked,
        geometry: node.geometry,
        style: node.style,
        clip_mask: node.clip_mask,
        kind,
    };
    let id = doc.attach(layer, parent, None)?;
    if is_group {
        for child in children.unwrap_or_default() {
            insert_node(doc, child, ParentId::Layer(id), seen)?;
        }
    }
    Ok(())
}

fn node_kind(tag: String, payload: Value) -> Result<LayerKind> {
    let parse_err = |e: serde_json::Error| Error::other(format!("invalid {tag} layer: {e}"));
    Ok(match tag.as_str() {
        "text" => LayerKind::Text(serde_json::from_value::<TextLayer>(payload).map_err(parse_err)?),
        "rect" => LayerKind::Rect(serde_json::from_value::<RectLayer>(payload).map_err(parse_err)?),
        "ellipse" => {
            LayerKind::Ellipse(serde_json::from_value::<EllipseLayer>(payload).map_err(parse_err)?)
        }
        "path" => LayerKind::Path(serde_json::from_value::<PathLayer>(payload).map_err(parse_err)?),
        "image" => {
            LayerKind::Image(serde_json::from_value::<ImageLayer>(payload).map_err(parse_err)?)
        }
        "group" => LayerKind::Group(GroupLayer::default()),
        _ => LayerKind::Unknown(UnknownLayer { kind: tag, payload }),
    })
}
