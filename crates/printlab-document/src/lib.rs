//! # Printlab Document
//!
//! The in-memory document of the Printlab editor: a scene graph of drawable
//! layers over a millimeter-sized canvas, the snapshot-based mutation
//! history that wraps it, and the JSON persistence codec.
//!
//! ## Architecture
//!
//! ```text
//! History (undo/redo, change notification)
//!   └── Document (arena of layers + canvas properties)
//!         ├── Layer kinds (rect, ellipse, path, text, image, group)
//!         └── Style (fill, stroke, shadow, opacity)
//!
//! Codec (JSON tree <-> arena, versioned file envelope)
//! ```
//!
//! The scene graph mutation API never records history by itself; the
//! [`History`] engine owns that responsibility, which keeps the document
//! unit-testable without snapshot overhead.

pub mod codec;
pub mod document;
pub mod history;
pub mod model;

pub use codec::{
    deserialize_document, load_from_file, save_to_file, serialize_document, DocumentFile,
    DocumentMetadata,
};
pub use document::{Alignment, Document, ParentId, Reorder};
pub use history::{ChangeKind, History, Snapshot, SubscriptionId};
pub use model::{
    Color, EllipseLayer, Geometry, GroupLayer, ImageLayer, Layer, LayerId, LayerKind, Paint,
    PathLayer, RectLayer, Shadow, Stroke, Style, TextLayer, UnknownLayer,
};
