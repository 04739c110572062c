use docroute::application::ports::{ConversionHints, TierConverter};
use docroute::domain::{FlowType, LayoutBox, Page, RawDocument, Tier};
use docroute::infrastructure::converters::LayoutAwareConverter;

use crate::helpers::{enhance, flowing_document};

fn two_column_page() -> Page {
    Page::from_text(
        "Quarterly Report Left top. Right top. Left bottom. Right bottom. Footer note.",
    )
    .with_layout(vec![
        LayoutBox::new(330.0, 100.0, 560.0, 300.0, "Right top."),
        LayoutBox::new(50.0, 700.0, 560.0, 740.0, "Footer note."),
        LayoutBox::new(50.0, 320.0, 280.0, 500.0, "Left bottom."),
        LayoutBox::new(50.0, 40.0, 560.0, 80.0, "Quarterly Report"),
        LayoutBox::new(330.0, 320.0, 560.0, 500.0, "Right bottom."),
        LayoutBox::new(50.0, 100.0, 280.0, 300.0, "Left top."),
    ])
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("{needle} missing from {text}"))
}

#[tokio::test]
async fn given_two_columns_when_converting_then_reads_left_column_before_right() {
    let document = enhance(
        RawDocument::new("report.pdf", vec![two_column_page()]),
        FlowType::Flowing,
    );

    let output = LayoutAwareConverter
        .convert(&document, &ConversionHints::default())
        .await
        .unwrap();

    let text = &output.text;
    assert!(text.starts_with("## Quarterly Report"));
    assert!(position(text, "Left top.") < position(text, "Left bottom."));
    assert!(position(text, "Left bottom.") < position(text, "Right top."));
    assert!(position(text, "Right top.") < position(text, "Right bottom."));
    assert!(position(text, "Right bottom.") < position(text, "Footer note."));
    assert!(output.quality_score > 0.9);
    assert_eq!(LayoutAwareConverter.tier(), Tier::LayoutAware);
}

#[tokio::test]
async fn given_pages_without_layout_when_converting_then_uses_reconstructed_text() {
    let document = enhance(flowing_document(1), FlowType::Flowing);

    let output = LayoutAwareConverter
        .convert(&document, &ConversionHints::default())
        .await
        .unwrap();

    assert_eq!(output.text, document.page_texts()[0]);
    assert!(output.warnings.is_empty());
}
