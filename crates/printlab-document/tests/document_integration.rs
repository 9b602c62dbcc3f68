//! Integration tests exercising the document, history, and codec together
//! through the public API only.

use printlab_document::{
    deserialize_document, serialize_document, Alignment, Color, Document, History, LayerKind,
    Paint, ParentId, RectLayer, Reorder, TextLayer,
};

fn rect(w: f64, h: f64) -> LayerKind {
    LayerKind::Rect(RectLayer::new(w, h))
}

#[test]
fn test_full_editing_session_with_undo() {
    let mut history = History::new(Document::new(90.0, 50.0).unwrap());
    let initial = history.document().clone();

    let mut ids = Vec::new();
    for i in 0..3 {
        let mut captured = None;
        history
            .record(|doc| {
                let id = doc.add_layer(rect(10.0, 10.0), ParentId::Root)?;
                doc.translate(id, i as f64 * 15.0, 5.0)?;
                captured = Some(id);
                Ok(())
            })
            .unwrap();
        ids.push(captured.unwrap());
    }
    history
        .record(|doc| doc.group(&[ids[0], ids[1]]).map(|_| ()))
        .unwrap();
    history
        .record(|doc| doc.reorder(ids[2], Reorder::ToBack))
        .unwrap();

    // Five mutations; five undos restore the empty document.
    for _ in 0..5 {
        assert!(history.undo());
    }
    assert_eq!(history.document(), &initial);
    assert!(!history.can_undo());

    // Five redos restore the final state.
    for _ in 0..5 {
        assert!(history.redo());
    }
    assert_eq!(history.document().root_layers()[0], ids[2]);
}

#[test]
fn test_group_ungroup_round_trip_through_history() {
    let mut history = History::new(Document::new(210.0, 297.0).unwrap());
    let mut captured = (None, None);
    history
        .record(|doc| {
            let a = doc.add_layer(rect(30.0, 20.0), ParentId::Root)?;
            let b = doc.add_layer(rect(30.0, 20.0), ParentId::Root)?;
            doc.translate(a, 10.0, 10.0)?;
            doc.translate(b, 60.0, 40.0)?;
            captured = (Some(a), Some(b));
            Ok(())
        })
        .unwrap();
    let (a, b) = (captured.0.unwrap(), captured.1.unwrap());
    let before = history.document().clone();

    let mut group_id = None;
    history
        .record(|doc| {
            group_id = Some(doc.group(&[a, b])?);
            Ok(())
        })
        .unwrap();
    history
        .record(|doc| doc.ungroup(group_id.unwrap()).map(|_| ()))
        .unwrap();

    assert_eq!(history.document(), &before);
}

#[test]
fn test_mutated_document_survives_serialization() {
    let mut history = History::new(Document::new(90.0, 50.0).unwrap());
    history
        .record(|doc| {
            doc.set_background(Paint::solid(Color::rgb(250, 250, 240)));
            let title = doc.add_layer(
                LayerKind::Text(TextLayer::new("Jane Doe", 14.0)),
                ParentId::Root,
            )?;
            doc.rename(title, "Name")?;
            let frame = doc.add_layer(rect(86.0, 46.0), ParentId::Root)?;
            doc.translate(frame, 2.0, 2.0)?;
            doc.set_locked(frame, true)?;
            doc.reorder(frame, Reorder::ToBack)?;
            Ok(())
        })
        .unwrap();

    let json = serialize_document(history.document()).unwrap();
    let restored = deserialize_document(&json).unwrap();
    assert_eq!(&restored, history.document());
}

#[test]
fn test_align_is_one_undo_step() {
    let mut history = History::new(Document::new(90.0, 50.0).unwrap());
    let mut ids = Vec::new();
    history
        .record(|doc| {
            for i in 0..3 {
                let id = doc.add_layer(rect(10.0, 10.0), ParentId::Root)?;
                doc.translate(id, 5.0 + i as f64 * 20.0, i as f64 * 12.0)?;
                ids.push(id);
            }
            Ok(())
        })
        .unwrap();
    let scattered = history.document().clone();

    history
        .record(|doc| doc.align(&ids, Alignment::Top))
        .unwrap();
    for &id in &ids {
        assert_eq!(history.document().layer(id).unwrap().geometry.y, 0.0);
    }

    assert!(history.undo());
    assert_eq!(history.document(), &scattered);
}

#[test]
fn test_failed_mutation_never_dirties_document_or_history() {
    let mut history = History::new(Document::new(90.0, 50.0).unwrap());
    history
        .record(|doc| doc.add_layer(rect(10.0, 10.0), ParentId::Root).map(|_| ()))
        .unwrap();
    let clean = history.document().clone();

    // A multi-step edit failing halfway must discard all of its steps.
    let err = history
        .record(|doc| {
            let id = doc.add_layer(rect(5.0, 5.0), ParentId::Root)?;
            doc.translate(id, 1.0, 1.0)?;
            doc.set_size_mm(-10.0, 50.0)?;
            Ok(())
        })
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(history.document(), &clean);
    assert!(history.undo());
    assert!(!history.can_undo());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Edit {
        Add { x: f64, y: f64, w: f64, h: f64 },
        TranslateLast { dx: f64, dy: f64 },
        ToggleLastVisibility,
        RemoveLast,
    }

    fn edit_strategy() -> impl Strategy<Value = Edit> {
        prop_oneof![
            (0.0..100.0, 0.0..100.0, 1.0..50.0, 1.0..50.0)
                .prop_map(|(x, y, w, h)| Edit::Add { x, y, w, h }),
            (-20.0..20.0, -20.0..20.0).prop_map(|(dx, dy)| Edit::TranslateLast { dx, dy }),
            Just(Edit::ToggleLastVisibility),
            Just(Edit::RemoveLast),
        ]
    }

    fn apply(doc: &mut Document, edit: &Edit) -> printlab_core::Result<()> {
        match edit {
            Edit::Add { x, y, w, h } => {
                let id = doc.add_layer(rect(*w, *h), ParentId::Root)?;
                doc.translate(id, *x, *y)
            }
            Edit::TranslateLast { dx, dy } => match doc.root_layers().last().copied() {
                Some(id) => doc.translate(id, *dx, *dy),
                None => Ok(()),
            },
            Edit::ToggleLastVisibility => match doc.root_layers().last().copied() {
                Some(id) => {
                    let visible = doc.layer(id)?.visible;
                    doc.set_visible(id, !visible)
                }
                None => Ok(()),
            },
            Edit::RemoveLast => match doc.root_layers().last().copied() {
                Some(id) => doc.remove_layer(id),
                None => Ok(()),
            },
        }
    }

    proptest! {
        /// N undos invert any N recorded edits; N redos reapply them.
        #[test]
        fn undo_inverts_any_edit_sequence(edits in prop::collection::vec(edit_strategy(), 1..20)) {
            let mut history = History::new(Document::new(100.0, 100.0).unwrap());
            let initial = history.document().clone();
            for edit in &edits {
                history.record(|doc| apply(doc, edit)).unwrap();
            }
            let final_state = history.document().clone();

            for _ in 0..edits.len() {
                prop_assert!(history.undo());
            }
            prop_assert_eq!(history.document(), &initial);

            for _ in 0..edits.len() {
                prop_assert!(history.redo());
            }
            prop_assert_eq!(history.document(), &final_state);
        }

        /// Any document reachable through the mutation API round-trips
        /// through the codec unchanged.
        #[test]
        fn codec_round_trips_any_reachable_document(edits in prop::collection::vec(edit_strategy(), 0..20)) {
            let mut doc = Document::new(100.0, 100.0).unwrap();
            for edit in &edits {
                apply(&mut doc, edit).unwrap();
            }
            let json = serialize_document(&doc).unwrap();
            let restored = deserialize_document(&json).unwrap();
            prop_assert_eq!(restored, doc);
        }
    }
}
