use layerpaint_core::{Document, DocumentConfig, ElementProperties, ElementType};
use layerpaint_render::{
    ExportConfig, RenderError, build_layer_records, prepare_for_export,
};
use pollster::block_on;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn png_size(bytes: &[u8]) -> (u32, u32) {
    let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
    let reader = decoder.read_info().unwrap();
    let info = reader.info();
    (info.width, info.height)
}

fn document() -> Document {
    let mut doc = Document::new(DocumentConfig {
        width: 64,
        height: 48,
        ..DocumentConfig::default()
    });
    doc.add_element(
        ElementType::Rectangle,
        ElementProperties::new()
            .with_position(8.0, 8.0)
            .with_size(16.0, 16.0)
            .with_fill("hsl(0, 100%, 50%)"),
    )
    .unwrap();
    doc
}

#[test]
fn export_dimensions_follow_dpi() {
    let mut doc = document();
    doc.change_dpi(2);

    let job = prepare_for_export(&doc, &ExportConfig::default()).unwrap();
    assert_eq!((job.width(), job.height()), (128, 96));
    // Document (8..24) maps to pixels (16..48) at 2x.
    assert_eq!(job.surface().pixel(40, 40).unwrap(), [255, 0, 0, 255]);
    assert_eq!(job.surface().pixel(10, 10).unwrap(), [255, 255, 255, 255]);

    let png = block_on(job.encode(None)).unwrap();
    assert_eq!(&png[..8], &PNG_SIGNATURE);
    assert_eq!(png_size(&png), (128, 96));
}

#[test]
fn export_config_overrides_dpi() {
    let doc = document();
    let job = prepare_for_export(&doc, &ExportConfig::default().with_dpi(3)).unwrap();
    assert_eq!((job.width(), job.height()), (192, 144));
    assert_eq!(job.surface().pixel(60, 60).unwrap(), [255, 0, 0, 255]);
}

#[test]
fn export_snapshot_is_taken_at_prepare_time() {
    let mut doc = document();
    let job = prepare_for_export(&doc, &ExportConfig::default()).unwrap();
    doc.delete_element(|_| true);
    let other = prepare_for_export(&doc, &ExportConfig::default()).unwrap();

    assert_eq!(job.surface().pixel(10, 10).unwrap(), [255, 0, 0, 255]);
    assert_eq!(other.surface().pixel(10, 10).unwrap(), [255, 255, 255, 255]);
}

#[test]
fn quality_changes_compression_not_pixels() {
    let doc = document();
    let fast = block_on(
        prepare_for_export(&doc, &ExportConfig::default())
            .unwrap()
            .encode(Some(0.0)),
    )
    .unwrap();
    let best = block_on(
        prepare_for_export(&doc, &ExportConfig::default().with_quality(1.0))
            .unwrap()
            .encode(None),
    )
    .unwrap();
    assert_eq!(png_size(&fast), png_size(&best));
}

#[test]
fn export_without_layers_fails() {
    let doc = Document::empty();
    assert!(matches!(
        prepare_for_export(&doc, &ExportConfig::default()),
        Err(RenderError::EmptyLayerList)
    ));
    assert!(matches!(
        build_layer_records(&doc, 16, 16),
        Err(RenderError::EmptyLayerList)
    ));
}

#[test]
fn layer_records_render_each_layer_alone() {
    let mut doc = document();
    let first = doc.get_active_layer().unwrap().id.clone();
    let second = doc.create_layer(Some("Empty".to_string()), None).unwrap();
    doc.toggle_layer_visibility(&first).unwrap();

    let records = build_layer_records(&doc, 32, 24).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, first);
    assert_eq!(records[0].position, 0);
    assert_eq!(records[1].id, second);
    assert_eq!(records[1].name, "Empty");
    assert_eq!(png_size(&records[0].image), (32, 24));
    assert!(records[0].image.starts_with(&PNG_SIGNATURE));
    // The first layer carries the rectangle, the second is background only.
    assert_ne!(records[0].image, records[1].image);
}

#[test]
fn oversized_export_is_rejected() {
    let mut doc = Document::new(DocumentConfig {
        width: 30_000,
        height: 10,
        ..DocumentConfig::default()
    });
    doc.change_dpi(2);
    assert!(matches!(
        prepare_for_export(&doc, &ExportConfig::default()),
        Err(RenderError::SurfaceUnavailable { .. })
    ));
}
