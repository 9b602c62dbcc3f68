//! The document scene graph: an arena of layers addressed by stable ids,
//! with ordered child lists on the root and on group layers.
//!
//! All operations are synchronous and atomic: inputs are validated before
//! any state changes, so a failed mutation leaves the document untouched.
//! Nothing here records history; the [`crate::history::History`] engine
//! wraps this API and owns snapshotting.

use std::collections::{HashMap, HashSet};

use printlab_core::error::{DocumentError, Result};
use printlab_core::geometry::{rotate_point, rotated_rect_bounds_about, Bounds, Point};

use crate::model::{Geometry, GroupLayer, Layer, LayerId, LayerKind, Paint, Style};

/// Where a layer lives: directly on the document, or inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentId {
    Root,
    Layer(LayerId),
}

/// Sibling reorder directions. "Front" is last in paint order (topmost).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    Up,
    Down,
    ToFront,
    ToBack,
}

/// Sibling alignment edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    CenterHorizontal,
    Right,
    Top,
    CenterVertical,
    Bottom,
}

/// The root aggregate: physical canvas size, background, and layer arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    width_mm: f64,
    height_mm: f64,
    background: Paint,
    layers: HashMap<LayerId, Layer>,
    root: Vec<LayerId>,
}

impl Document {
    /// Creates an empty document with the given physical size in mm.
    pub fn new(width_mm: f64, height_mm: f64) -> Result<Self> {
        validate_dimension("widthMm", width_mm)?;
        validate_dimension("heightMm", height_mm)?;
        Ok(Self {
            width_mm,
            height_mm,
            background: Paint::solid(crate::model::Color::WHITE),
            layers: HashMap::new(),
            root: Vec::new(),
        })
    }

    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    pub fn height_mm(&self) -> f64 {
        self.height_mm
    }

    /// Resizes the physical canvas. Pixel dimensions are always derived
    /// from this size and a resolution, never stored.
    pub fn set_size_mm(&mut self, width_mm: f64, height_mm: f64) -> Result<()> {
        validate_dimension("widthMm", width_mm)?;
        validate_dimension("heightMm", height_mm)?;
        self.width_mm = width_mm;
        self.height_mm = height_mm;
        Ok(())
    }

    pub fn background(&self) -> &Paint {
        &self.background
    }

    pub fn set_background(&mut self, paint: Paint) {
        self.background = paint;
    }

    /// Top-level layers in paint order (first = bottom).
    pub fn root_layers(&self) -> &[LayerId] {
        &self.root
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layer(&self, id: LayerId) -> Result<&Layer> {
        self.layers
            .get(&id)
            .ok_or_else(|| not_found(id))
    }

    /// Child ids of a group layer; empty for non-groups.
    pub fn group_children(&self, id: LayerId) -> &[LayerId] {
        match self.layers.get(&id).map(|l| &l.kind) {
            Some(LayerKind::Group(g)) => &g.children,
            _ => &[],
        }
    }

    /// All layer ids in paint order, depth-first through groups.
    pub fn paint_order(&self) -> Vec<LayerId> {
        let mut out = Vec::with_capacity(self.layers.len());
        fn walk(doc: &Document, ids: &[LayerId], out: &mut Vec<LayerId>) {
            for &id in ids {
                out.push(id);
                walk(doc, doc.group_children(id), out);
            }
        }
        walk(self, &self.root, &mut out);
        out
    }

    /// Finds the owner of a layer. A layer has exactly one owner.
    pub fn parent_of(&self, id: LayerId) -> Result<ParentId> {
        if !self.layers.contains_key(&id) {
            return Err(not_found(id));
        }
        if self.root.contains(&id) {
            return Ok(ParentId::Root);
        }
        for (gid, layer) in &self.layers {
            if let LayerKind::Group(g) = &layer.kind {
                if g.children.contains(&id) {
                    return Ok(ParentId::Layer(*gid));
                }
            }
        }
        // Unreachable for a consistent arena; treat as dangling.
        Err(not_found(id))
    }

    /// Appends a new layer of the given kind to a parent's children and
    /// returns its fresh id.
    pub fn add_layer(&mut self, kind: LayerKind, parent: ParentId) -> Result<LayerId> {
        self.ensure_group_parent(parent)?;
        let layer = Layer::new(kind);
        let id = layer.id;
        self.layers.insert(id, layer);
        self.sibling_list_mut(parent).push(id);
        Ok(id)
    }

    /// Inserts an existing layer (fresh or rebuilt) at an index within a
    /// parent's children. Used by duplicate, ungroup, and the codec.
    pub(crate) fn attach(
        &mut self,
        layer: Layer,
        parent: ParentId,
        index: Option<usize>,
    ) -> Result<LayerId> {
        self.ensure_group_parent(parent)?;
        let id = layer.id;
        self.layers.insert(id, layer);
        let list = self.sibling_list_mut(parent);
        let index = index.unwrap_or(list.len()).min(list.len());
        list.insert(index, id);
        Ok(id)
    }

    /// Removes a layer and, transitively, all of its descendants.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<()> {
        let parent = self.parent_of(id)?;
        let list = self.sibling_list_mut(parent);
        list.retain(|&l| l != id);

        let mut stack = vec![id];
        let mut removed = Vec::new();
        while let Some(cur) = stack.pop() {
            if let Some(layer) = self.layers.remove(&cur) {
                if let LayerKind::Group(g) = &layer.kind {
                    stack.extend(g.children.iter().copied());
                }
                removed.push(cur);
            }
        }
        // Drop clip-mask references that now dangle.
        for layer in self.layers.values_mut() {
            if let Some(mask) = layer.clip_mask {
                if removed.contains(&mask) {
                    layer.clip_mask = None;
                }
            }
        }
        Ok(())
    }

    /// Moves a layer within its sibling list.
    pub fn reorder(&mut self, id: LayerId, direction: Reorder) -> Result<()> {
        let parent = self.parent_of(id)?;
        let list = self.sibling_list_mut(parent);
        let index = list.iter().position(|&l| l == id).ok_or_else(|| not_found(id))?;
        let last = list.len() - 1;
        match direction {
            Reorder::Up if index < last => list.swap(index, index + 1),
            Reorder::Down if index > 0 => list.swap(index, index - 1),
            Reorder::ToFront => {
                let id = list.remove(index);
                list.push(id);
            }
            Reorder::ToBack => {
                let id = list.remove(index);
                list.insert(0, id);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn set_geometry(&mut self, id: LayerId, geometry: Geometry) -> Result<()> {
        self.layer_mut(id)?.geometry = geometry;
        Ok(())
    }

    pub fn translate(&mut self, id: LayerId, dx: f64, dy: f64) -> Result<()> {
        let layer = self.layer_mut(id)?;
        layer.geometry.x += dx;
        layer.geometry.y += dy;
        Ok(())
    }

    pub fn set_style(&mut self, id: LayerId, style: Style) -> Result<()> {
        self.layer_mut(id)?.style = style;
        Ok(())
    }

    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<()> {
        self.layer_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> Result<()> {
        self.layer_mut(id)?.locked = locked;
        Ok(())
    }

    pub fn rename(&mut self, id: LayerId, name: impl Into<String>) -> Result<()> {
        self.layer_mut(id)?.name = name.into();
        Ok(())
    }

    /// Replaces a layer's kind payload (e.g. new text content). The kind's
    /// variant may not change through this call.
    pub fn set_kind(&mut self, id: LayerId, kind: LayerKind) -> Result<()> {
        let layer = self.layer_mut(id)?;
        debug_assert_eq!(
            std::mem::discriminant(&layer.kind),
            std::mem::discriminant(&kind),
            "set_kind must not change the layer variant"
        );
        layer.kind = kind;
        Ok(())
    }

    /// Points a layer's clip mask at another layer (or clears it).
    pub fn set_clip_mask(&mut self, id: LayerId, mask: Option<LayerId>) -> Result<()> {
        if let Some(mask_id) = mask {
            if !self.layers.contains_key(&mask_id) {
                return Err(not_found(mask_id));
            }
        }
        self.layer_mut(id)?.clip_mask = mask;
        Ok(())
    }

    /// Bounds of a layer within its parent's coordinate space.
    ///
    /// Group bounds are the union of child bounds carried through the
    /// group's own geometry.
    pub fn bounds_in_parent(&self, id: LayerId) -> Result<Bounds> {
        let layer = self.layer(id)?;
        if let Some(b) = layer.local_bounds() {
            return Ok(b);
        }
        match &layer.kind {
            LayerKind::Group(g) => {
                let mut content = Bounds::empty();
                for &child in &g.children {
                    content = content.union(&self.bounds_in_parent(child)?);
                }
                if content.is_empty() {
                    let geo = &layer.geometry;
                    return Ok(Bounds::new(geo.x, geo.y, geo.x, geo.y));
                }
                // Group content rotates about the group origin, matching
                // the renderers and `compose_into_parent`.
                let geo = &layer.geometry;
                Ok(rotated_rect_bounds_about(
                    geo.x + content.min_x * geo.scale_x,
                    geo.y + content.min_y * geo.scale_y,
                    content.width() * geo.scale_x,
                    content.height() * geo.scale_y,
                    Point::new(geo.x, geo.y),
                    geo.rotation_deg,
                ))
            }
            _ => {
                // Unknown kinds have no measurable content.
                let geo = &layer.geometry;
                Ok(Bounds::new(geo.x, geo.y, geo.x, geo.y))
            }
        }
    }

    /// Collects a set of sibling layers into a new group positioned at the
    /// bounding union of the selection, preserving relative offsets.
    ///
    /// Children keep their original sibling order; the group is inserted at
    /// the lowest selected index.
    pub fn group(&mut self, ids: &[LayerId]) -> Result<LayerId> {
        let ids = dedup_selection(ids);
        let ids = ids.as_slice();
        if ids.len() < 2 {
            return Err(DocumentError::InvalidGroupSelection { count: ids.len() }.into());
        }
        let parent = self.parent_of(ids[0])?;
        for &id in &ids[1..] {
            if self.parent_of(id)? != parent {
                return Err(DocumentError::NotSiblings.into());
            }
        }

        let mut union = Bounds::empty();
        for &id in ids {
            union = union.union(&self.bounds_in_parent(id)?);
        }

        // All validation done; mutate.
        let siblings = self.sibling_list_mut(parent);
        let insert_at = siblings
            .iter()
            .position(|id| ids.contains(id))
            .unwrap_or(siblings.len());
        let ordered: Vec<LayerId> = siblings
            .iter()
            .copied()
            .filter(|id| ids.contains(id))
            .collect();
        siblings.retain(|id| !ids.contains(id));

        let mut group = Layer::new(LayerKind::Group(GroupLayer {
            children: ordered.clone(),
        }));
        group.geometry = Geometry::at(union.min_x, union.min_y);
        let group_id = group.id;
        self.layers.insert(group_id, group);
        self.sibling_list_mut(parent).insert(insert_at, group_id);

        for id in ordered {
            let layer = self.layers.get_mut(&id).expect("validated above");
            layer.geometry.x -= union.min_x;
            layer.geometry.y -= union.min_y;
        }
        Ok(group_id)
    }

    /// Promotes a group's children back to its parent at their absolute
    /// positions, then deletes the empty group. Ungrouping a non-group is
    /// a no-op that returns an empty list.
    pub fn ungroup(&mut self, id: LayerId) -> Result<Vec<LayerId>> {
        let layer = self.layer(id)?;
        let children = match &layer.kind {
            LayerKind::Group(g) => g.children.clone(),
            _ => return Ok(Vec::new()),
        };
        let group_geo = layer.geometry;
        let parent = self.parent_of(id)?;

        let siblings = self.sibling_list_mut(parent);
        let index = siblings.iter().position(|&l| l == id).unwrap_or(siblings.len());
        siblings.retain(|&l| l != id);
        for (offset, &child) in children.iter().enumerate() {
            let list = self.sibling_list_mut(parent);
            list.insert(index + offset, child);
        }
        self.layers.remove(&id);

        for &child in &children {
            let layer = self.layers.get_mut(&child).expect("group children exist");
            compose_into_parent(&mut layer.geometry, &group_geo);
        }
        Ok(children)
    }

    /// Deep-copies a layer subtree with fresh ids, inserted right after the
    /// original in its sibling list.
    pub fn duplicate(&mut self, id: LayerId) -> Result<LayerId> {
        let parent = self.parent_of(id)?;
        let copy = self.clone_subtree(id);
        let new_id = copy.last().expect("subtree is non-empty").id;
        for layer in copy {
            let is_top = layer.id == new_id;
            if is_top {
                let index = self
                    .sibling_list_mut(parent)
                    .iter()
                    .position(|&l| l == id)
                    .map(|i| i + 1);
                self.attach(layer, parent, index)?;
            } else {
                self.layers.insert(layer.id, layer);
            }
        }
        Ok(new_id)
    }

    /// Aligns unlocked sibling layers against the bounding union of the
    /// selection. Locked layers contribute to the union but do not move.
    pub fn align(&mut self, ids: &[LayerId], alignment: Alignment) -> Result<()> {
        let ids = dedup_selection(ids);
        let ids = ids.as_slice();
        if ids.len() < 2 {
            return Err(DocumentError::InvalidGroupSelection { count: ids.len() }.into());
        }
        let parent = self.parent_of(ids[0])?;
        for &id in &ids[1..] {
            if self.parent_of(id)? != parent {
                return Err(DocumentError::NotSiblings.into());
            }
        }
        let mut union = Bounds::empty();
        let mut bounds = Vec::with_capacity(ids.len());
        for &id in ids {
            let b = self.bounds_in_parent(id)?;
            union = union.union(&b);
            bounds.push(b);
        }
        for (&id, b) in ids.iter().zip(bounds) {
            if self.layers[&id].locked {
                continue;
            }
            let (dx, dy) = match alignment {
                Alignment::Left => (union.min_x - b.min_x, 0.0),
                Alignment::Right => (union.max_x - b.max_x, 0.0),
                Alignment::CenterHorizontal => (union.center().x - b.center().x, 0.0),
                Alignment::Top => (0.0, union.min_y - b.min_y),
                Alignment::Bottom => (0.0, union.max_y - b.max_y),
                Alignment::CenterVertical => (0.0, union.center().y - b.center().y),
            };
            let layer = self.layers.get_mut(&id).expect("validated above");
            layer.geometry.x += dx;
            layer.geometry.y += dy;
        }
        Ok(())
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut Layer> {
        self.layers.get_mut(&id).ok_or_else(|| not_found(id))
    }

    fn ensure_group_parent(&self, parent: ParentId) -> Result<()> {
        if let ParentId::Layer(gid) = parent {
            let layer = self.layer(gid)?;
            if !layer.is_group() {
                return Err(not_found(gid));
            }
        }
        Ok(())
    }

    fn sibling_list_mut(&mut self, parent: ParentId) -> &mut Vec<LayerId> {
        match parent {
            ParentId::Root => &mut self.root,
            ParentId::Layer(gid) => match &mut self.layers.get_mut(&gid).expect("validated").kind
            {
                LayerKind::Group(g) => &mut g.children,
                _ => unreachable!("parent validated as group"),
            },
        }
    }

    /// Clones a subtree bottom-up with fresh ids; the last element is the
    /// new top layer.
    fn clone_subtree(&self, id: LayerId) -> Vec<Layer> {
        let source = &self.layers[&id];
        let mut out = Vec::new();
        let mut top = source.clone();
        top.id = LayerId::generate();
        if let LayerKind::Group(g) = &source.kind {
            let mut new_children = Vec::with_capacity(g.children.len());
            for &child in &g.children {
                let sub = self.clone_subtree(child);
                new_children.push(sub.last().expect("non-empty").id);
                out.extend(sub);
            }
            top.kind = LayerKind::Group(GroupLayer {
                children: new_children,
            });
        }
        out.push(top);
        out
    }
}

/// Rewrites a child geometry from group-local space into the group's
/// parent space.
fn compose_into_parent(child: &mut Geometry, group: &Geometry) {
    let pos = Point::new(
        group.x + child.x * group.scale_x,
        group.y + child.y * group.scale_y,
    );
    let pos = rotate_point(pos, Point::new(group.x, group.y), group.rotation_deg);
    child.x = pos.x;
    child.y = pos.y;
    child.scale_x *= group.scale_x;
    child.scale_y *= group.scale_y;
    child.rotation_deg += group.rotation_deg;
}

/// Drops repeated ids from a selection, keeping first-occurrence order, so
/// selection size checks count distinct layers.
fn dedup_selection(ids: &[LayerId]) -> Vec<LayerId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn validate_dimension(what: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DocumentError::InvalidDimension { what, value }.into());
    }
    Ok(())
}

fn not_found(id: LayerId) -> printlab_core::Error {
    DocumentError::LayerNotFound { id: id.to_string() }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RectLayer;

    fn rect(w: f64, h: f64) -> LayerKind {
        LayerKind::Rect(RectLayer::new(w, h))
    }

    fn doc_with_three() -> (Document, LayerId, LayerId, LayerId) {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let a = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let b = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let c = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        (doc, a, b, c)
    }

    #[test]
    fn test_new_rejects_bad_size() {
        assert!(Document::new(0.0, 50.0).is_err());
        assert!(Document::new(90.0, f64::NAN).is_err());
        assert!(Document::new(-90.0, 50.0).is_err());
    }

    #[test]
    fn test_add_and_remove() {
        let (mut doc, a, b, c) = doc_with_three();
        assert_eq!(doc.layer_count(), 3);
        doc.remove_layer(b).unwrap();
        assert_eq!(doc.layer_count(), 2);
        assert_eq!(doc.root_layers(), &[a, c]);
        assert!(doc.remove_layer(b).is_err());
    }

    #[test]
    fn test_remove_group_is_transitive() {
        let (mut doc, a, b, c) = doc_with_three();
        let g = doc.group(&[a, b]).unwrap();
        doc.remove_layer(g).unwrap();
        assert!(doc.get(a).is_none());
        assert!(doc.get(b).is_none());
        assert!(doc.get(c).is_some());
        assert_eq!(doc.layer_count(), 1);
    }

    #[test]
    fn test_reorder_directions() {
        let (mut doc, a, b, c) = doc_with_three();
        doc.reorder(a, Reorder::ToFront).unwrap();
        assert_eq!(doc.root_layers(), &[b, c, a]);
        doc.reorder(a, Reorder::Down).unwrap();
        assert_eq!(doc.root_layers(), &[b, a, c]);
        doc.reorder(b, Reorder::Up).unwrap();
        assert_eq!(doc.root_layers(), &[a, b, c]);
        doc.reorder(c, Reorder::ToBack).unwrap();
        assert_eq!(doc.root_layers(), &[c, a, b]);
        // Edges are no-ops
        doc.reorder(c, Reorder::ToBack).unwrap();
        doc.reorder(c, Reorder::Down).unwrap();
        assert_eq!(doc.root_layers(), &[c, a, b]);
    }

    #[test]
    fn test_mutation_on_missing_id_is_rejected() {
        let (mut doc, a, _b, _c) = doc_with_three();
        let ghost = LayerId::generate();
        let before = doc.clone();
        assert!(doc.set_visible(ghost, false).is_err());
        assert!(doc.translate(ghost, 1.0, 1.0).is_err());
        assert!(doc.reorder(ghost, Reorder::Up).is_err());
        assert!(doc.set_clip_mask(a, Some(ghost)).is_err());
        // No partial mutation happened.
        assert_eq!(doc, before);
    }

    #[test]
    fn test_group_requires_two_siblings() {
        let (mut doc, a, _b, _c) = doc_with_three();
        let err = doc.group(&[a]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_group_counts_distinct_layers() {
        let (mut doc, a, b, _c) = doc_with_three();
        // The same layer listed twice is still a single-layer selection.
        let err = doc.group(&[a, a]).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(doc.layer_count(), 3);

        // Repeats collapse; a selection with two distinct layers groups.
        let g = doc.group(&[a, b, a]).unwrap();
        assert_eq!(doc.group_children(g), &[a, b]);
    }

    #[test]
    fn test_align_counts_distinct_layers() {
        let (mut doc, a, _b, _c) = doc_with_three();
        let before = doc.layer(a).unwrap().geometry;
        let err = doc.align(&[a, a], Alignment::Left).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(doc.layer(a).unwrap().geometry, before);
    }

    #[test]
    fn test_group_preserves_relative_offsets() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let a = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let b = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        doc.translate(a, 20.0, 30.0).unwrap();
        doc.translate(b, 50.0, 40.0).unwrap();

        let g = doc.group(&[a, b]).unwrap();
        let group = doc.layer(g).unwrap();
        assert_eq!((group.geometry.x, group.geometry.y), (20.0, 30.0));
        // Children are now relative to the group's origin.
        let la = doc.layer(a).unwrap();
        assert_eq!((la.geometry.x, la.geometry.y), (0.0, 0.0));
        let lb = doc.layer(b).unwrap();
        assert_eq!((lb.geometry.x, lb.geometry.y), (30.0, 10.0));
        // And the union bounds are unchanged.
        let gb = doc.bounds_in_parent(g).unwrap();
        assert_eq!(gb, Bounds::new(20.0, 30.0, 60.0, 50.0));
    }

    #[test]
    fn test_ungroup_restores_absolute_geometry_and_order() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let a = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let b = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let c = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        doc.translate(a, 5.0, 5.0).unwrap();
        doc.translate(b, 25.0, 15.0).unwrap();
        let before = doc.clone();

        let g = doc.group(&[a, b]).unwrap();
        assert_eq!(doc.root_layers(), &[g, c]);
        let restored = doc.ungroup(g).unwrap();
        assert_eq!(restored, vec![a, b]);

        assert_eq!(doc.root_layers(), before.root_layers());
        assert_eq!(doc.layer(a).unwrap().geometry, before.layer(a).unwrap().geometry);
        assert_eq!(doc.layer(b).unwrap().geometry, before.layer(b).unwrap().geometry);
    }

    #[test]
    fn test_ungroup_non_group_is_noop() {
        let (mut doc, a, _b, _c) = doc_with_three();
        let before = doc.clone();
        assert_eq!(doc.ungroup(a).unwrap(), Vec::new());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_ungroup_applies_group_transform() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let a = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let b = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        doc.translate(b, 20.0, 0.0).unwrap();
        let g = doc.group(&[a, b]).unwrap();
        // Move and scale the whole group, then dissolve it.
        let mut geo = doc.layer(g).unwrap().geometry;
        geo.x += 10.0;
        geo.scale_x = 2.0;
        doc.set_geometry(g, geo).unwrap();
        doc.ungroup(g).unwrap();

        let lb = doc.layer(b).unwrap().geometry;
        assert_eq!(lb.x, 50.0); // 10 + 20*2
        assert_eq!(lb.scale_x, 2.0);
    }

    #[test]
    fn test_nested_groups() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let a = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let b = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let inner = doc.group(&[a, b]).unwrap();
        let c = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let outer = doc.group(&[inner, c]).unwrap();
        assert_eq!(doc.parent_of(inner).unwrap(), ParentId::Layer(outer));
        assert_eq!(doc.parent_of(a).unwrap(), ParentId::Layer(inner));
        assert_eq!(doc.paint_order(), vec![outer, inner, a, b, c]);
    }

    #[test]
    fn test_rotated_group_bounds_pivot_on_group_origin() {
        let (mut doc, a, b, _c) = doc_with_three();
        doc.translate(b, 10.0, 0.0).unwrap();
        let g = doc.group(&[a, b]).unwrap();
        let mut geo = doc.layer(g).unwrap().geometry;
        geo.rotation_deg = 90.0;
        doc.set_geometry(g, geo).unwrap();
        // 20x10 of content spun a quarter turn about the group origin at
        // (0, 0) lands in x [-10, 0], y [0, 20].
        let bounds = doc.bounds_in_parent(g).unwrap();
        assert!((bounds.min_x + 10.0).abs() < 1e-9);
        assert!(bounds.max_x.abs() < 1e-9);
        assert!(bounds.min_y.abs() < 1e-9);
        assert!((bounds.max_y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_subtree_gets_fresh_ids() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let a = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let b = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let g = doc.group(&[a, b]).unwrap();
        let copy = doc.duplicate(g).unwrap();
        assert_ne!(copy, g);
        assert_eq!(doc.group_children(copy).len(), 2);
        assert!(doc
            .group_children(copy)
            .iter()
            .all(|&id| id != a && id != b));
        // Copy sits right after the original.
        assert_eq!(doc.root_layers(), &[g, copy]);
    }

    #[test]
    fn test_align_left_skips_locked() {
        let mut doc = Document::new(90.0, 50.0).unwrap();
        let a = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        let b = doc.add_layer(rect(10.0, 10.0), ParentId::Root).unwrap();
        doc.translate(a, 5.0, 0.0).unwrap();
        doc.translate(b, 30.0, 0.0).unwrap();
        doc.set_locked(b, true).unwrap();
        doc.align(&[a, b], Alignment::Left).unwrap();
        assert_eq!(doc.layer(a).unwrap().geometry.x, 5.0);
        assert_eq!(doc.layer(b).unwrap().geometry.x, 30.0); // locked, untouched
    }

    #[test]
    fn test_clip_mask_cleared_on_target_removal() {
        let (mut doc, a, b, _c) = doc_with_three();
        doc.set_clip_mask(a, Some(b)).unwrap();
        doc.remove_layer(b).unwrap();
        assert_eq!(doc.layer(a).unwrap().clip_mask, None);
    }
}
