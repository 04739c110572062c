use docroute::domain::{DocumentKind, DocumentSource, LayoutBox, Page, RawDocument, Table};

#[test]
fn given_mime_types_when_classifying_then_maps_to_kinds() {
    assert_eq!(DocumentKind::from_mime("text/plain"), Some(DocumentKind::PlainText));
    assert_eq!(DocumentKind::from_mime("image/png"), Some(DocumentKind::Scanned));
    assert_eq!(DocumentKind::from_mime("application/zip"), None);
}

#[test]
fn given_unknown_mime_when_resolving_source_kind_then_falls_back_to_extension() {
    let source = DocumentSource::new("notes.MD", "application/octet-stream");
    assert_eq!(source.kind(), Some(DocumentKind::Markup));
}

#[test]
fn given_kinds_when_checking_structure_then_scans_and_forms_are_unreliable() {
    assert!(DocumentKind::Report.is_well_structured());
    assert!(!DocumentKind::Scanned.is_well_structured());
    assert!(!DocumentKind::Form.is_well_structured());
}

#[test]
fn given_inverted_corners_when_building_layout_box_then_normalizes_coordinates() {
    let layout_box = LayoutBox::new(300.0, 400.0, 100.0, 200.0, "text");

    assert_eq!(layout_box.x0, 100.0);
    assert_eq!(layout_box.y1, 400.0);
    assert_eq!(layout_box.area(), 40_000.0);
}

#[test]
fn given_ragged_table_when_counting_columns_then_uses_widest_row() {
    let table = Table::new(vec![
        vec!["a".to_string()],
        vec!["b".to_string(), "c".to_string(), "d".to_string()],
    ]);
    assert_eq!(table.column_count(), 3);
}

#[test]
fn given_document_when_replacing_page_texts_then_keeps_identity_and_attachments() {
    let page = Page::from_text("old").with_tables(vec![Table::new(vec![vec!["x".to_string()]])]);
    let document = RawDocument::new("a.txt", vec![page, Page::from_text("second")]);

    let updated = document.with_page_texts(&["new".to_string(), "page".to_string()]);

    assert_eq!(updated.id(), document.id());
    assert_eq!(updated.table_count(), 1);
    assert_eq!(updated.full_text(), "new\n\npage");
    assert_eq!(updated.char_count(), 7);
}
