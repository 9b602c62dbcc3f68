//! Integration tests covering the export pipeline end to end: packing,
//! rasterization, vector output, pagination, and cancellation.

use printlab_core::units::Resolution;
use printlab_document::{
    Color, Document, LayerKind, Paint, ParentId, RectLayer, Style, TextLayer,
};
use printlab_export::{
    export, plan_sheet, render_document, render_svg, ArtifactPayload, CancelFlag, ExportFormat,
    ExportRequest, SheetSpec,
};

fn business_card() -> Document {
    let mut doc = Document::new(90.0, 50.0).unwrap();
    doc.set_background(Paint::solid(Color::rgb(245, 245, 240)));
    let frame = doc
        .add_layer(LayerKind::Rect(RectLayer::new(320.0, 170.0)), ParentId::Root)
        .unwrap();
    doc.translate(frame, 10.0, 10.0).unwrap();
    doc.set_style(
        frame,
        Style {
            fill: Some(Paint::solid(Color::rgb(30, 60, 120))),
            ..Default::default()
        },
    )
    .unwrap();
    let name = doc
        .add_layer(
            LayerKind::Text(TextLayer::new("Jane Doe", 18.0)),
            ParentId::Root,
        )
        .unwrap();
    doc.translate(name, 30.0, 40.0).unwrap();
    doc
}

fn a4() -> SheetSpec {
    SheetSpec {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_mm: 5.0,
        gap_mm: 2.0,
    }
}

#[test]
fn test_print_resolution_buffer_size() {
    let res = Resolution::new(300.0, 1.0).unwrap();
    let out = render_document(&business_card(), res, 0.0).unwrap();
    assert_eq!((out.pixmap.width(), out.pixmap.height()), (1063, 591));
}

#[test]
fn test_oversampling_multiplier_doubles_buffer() {
    let res = Resolution::new(300.0, 2.0).unwrap();
    let out = render_document(&business_card(), res, 0.0).unwrap();
    assert_eq!((out.pixmap.width(), out.pixmap.height()), (2126, 1181));
}

#[test]
fn test_ten_cards_per_a4_sheet() {
    let plan = plan_sheet(&a4(), 90.0, 50.0).unwrap();
    assert_eq!(plan.capacity(), 10);
    assert_eq!((plan.cols, plan.rows), (2, 5));
}

#[test]
fn test_sheet_export_renders_requested_copies() {
    let request = ExportRequest {
        format: ExportFormat::Png,
        dpi: 96.0,
        multiplier: 1.0,
        bleed_mm: None,
        crop_marks: false,
        sheet: Some(a4()),
        copies: Some(12),
    };
    let artifact = export(&business_card(), &request, &CancelFlag::new()).unwrap();
    let ArtifactPayload::Pages(pages) = artifact.payload else {
        panic!("expected paginated payload");
    };
    // 12 copies over 10-per-sheet capacity means two pages.
    assert_eq!(pages.len(), 2);
    for page in &pages {
        assert_eq!(&page[1..4], b"PNG");
    }
}

#[test]
fn test_bleed_export_is_larger_but_document_untouched() {
    let doc = business_card();
    let before = doc.clone();

    let plain = export(
        &doc,
        &ExportRequest {
            format: ExportFormat::Png,
            dpi: 96.0,
            multiplier: 1.0,
            bleed_mm: None,
            crop_marks: false,
            sheet: None,
            copies: None,
        },
        &CancelFlag::new(),
    )
    .unwrap();
    let bled = export(
        &doc,
        &ExportRequest {
            format: ExportFormat::Png,
            dpi: 96.0,
            multiplier: 1.0,
            bleed_mm: Some(3.0),
            crop_marks: false,
            sheet: None,
            copies: None,
        },
        &CancelFlag::new(),
    )
    .unwrap();

    let (ArtifactPayload::Raster(plain), ArtifactPayload::Raster(bled)) =
        (plain.payload, bled.payload)
    else {
        panic!("expected raster payloads");
    };
    assert!(bled.len() != plain.len() || bled != plain);
    assert_eq!(doc, before);
}

#[test]
fn test_svg_export_with_crop_marks() {
    let out = render_svg(&business_card(), 2.0, true).unwrap();
    assert!(out.svg.contains("crop-marks"));
    assert!(out.svg.contains("Jane Doe"));
    // Crop marks sit outside the trim box; the viewBox must extend past it.
    assert!(out.svg.contains("viewBox=\"-"));
}

#[test]
fn test_degraded_image_warns_but_exports() {
    let mut doc = business_card();
    let broken = doc
        .add_layer(
            LayerKind::Image(printlab_document::ImageLayer::new("!!definitely not an image!!")),
            ParentId::Root,
        )
        .unwrap();

    let artifact = export(
        &doc,
        &ExportRequest {
            format: ExportFormat::Png,
            dpi: 96.0,
            multiplier: 1.0,
            bleed_mm: None,
            crop_marks: false,
            sheet: None,
            copies: None,
        },
        &CancelFlag::new(),
    )
    .unwrap();

    assert!(matches!(artifact.payload, ArtifactPayload::Raster(_)));
    assert!(artifact
        .warnings
        .iter()
        .any(|w| w.layer == Some(broken)));
}

#[test]
fn test_cancellation_reports_pages_done() {
    let request = ExportRequest {
        format: ExportFormat::Png,
        dpi: 96.0,
        multiplier: 1.0,
        bleed_mm: None,
        crop_marks: false,
        sheet: Some(a4()),
        copies: Some(30),
    };
    let cancel = CancelFlag::new();
    cancel.cancel();
    let err = export(&business_card(), &request, &cancel).unwrap_err();
    assert!(err.is_cancelled());
}
