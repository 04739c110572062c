use docroute::application::ports::{DocumentParser, ParserError};
use docroute::domain::DocumentSource;
use docroute::infrastructure::text_processing::PlainTextParser;

#[tokio::test]
async fn given_form_feeds_when_parsing_then_splits_pages_and_drops_trailing_blank() {
    let source = DocumentSource::new("notes.txt", "text/plain");

    let document = PlainTextParser
        .parse("First page.\u{000C}Second   page.\u{000C}\n".as_bytes(), &source)
        .await
        .unwrap();

    assert_eq!(document.page_count(), 2);
    assert_eq!(document.pages()[1].text, "Second page.");
    assert_eq!(document.filename(), "notes.txt");
}

#[tokio::test]
async fn given_markdown_by_extension_when_parsing_then_accepts_it() {
    let source = DocumentSource::new("README.md", "");

    let document = PlainTextParser.parse(b"# Title\n\nBody.", &source).await.unwrap();

    assert_eq!(document.page_count(), 1);
}

#[tokio::test]
async fn given_unsupported_type_when_parsing_then_returns_unsupported() {
    let source = DocumentSource::new("report.pdf", "application/pdf");

    let outcome = PlainTextParser.parse(b"%PDF-1.7", &source).await;

    assert!(matches!(outcome, Err(ParserError::UnsupportedType(t)) if t == "application/pdf"));
}

#[tokio::test]
async fn given_invalid_utf8_when_parsing_then_returns_extraction_failed() {
    let source = DocumentSource::new("notes.txt", "text/plain");

    let outcome = PlainTextParser.parse(&[0xc3, 0x28], &source).await;

    assert!(matches!(outcome, Err(ParserError::ExtractionFailed(_))));
}

#[tokio::test]
async fn given_only_whitespace_when_parsing_then_returns_no_text_found() {
    let source = DocumentSource::new("blank.txt", "text/plain");

    let outcome = PlainTextParser.parse(b"  \n\t\n\x0c \n", &source).await;

    assert!(matches!(outcome, Err(ParserError::NoTextFound(name)) if name == "blank.txt"));
}
