//! # Printlab Export
//!
//! Output side of the Printlab editor: sheet packing, rasterization,
//! vector markup, and the export pipeline that binds them to a request.
//!
//! ## Architecture
//!
//! ```text
//! pipeline (request -> artifact, pagination, cancellation)
//!   ├── packing (copies-per-sheet grid planner)
//!   ├── raster  (document -> tiny-skia pixmap, single render path)
//!   │     └── fonts (system font lookup)
//!   └── vector  (document -> SVG markup, crop marks)
//! ```
//!
//! Exporters read the document as an immutable snapshot; nothing here
//! mutates the scene graph.

pub mod fonts;
pub mod packing;
pub mod pipeline;
pub mod raster;
pub mod vector;

pub use packing::{plan_sheet, Placement, SheetPlan, SheetSpec};
pub use pipeline::{
    export, ArtifactPayload, CancelFlag, ExportArtifact, ExportFormat, ExportRequest,
};
pub use raster::{render_document, ExportWarning, RenderOutput};
pub use vector::{render_svg, VectorOutput};
