use serde::{Deserialize, Serialize};

use super::document_id::DocumentId;

/// Classification used by the router when complexity is low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PlainText,
    Markup,
    Spreadsheet,
    Report,
    Form,
    Presentation,
    Scanned,
}

impl DocumentKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "text/plain" => Some(Self::PlainText),
            "text/markdown" | "text/html" => Some(Self::Markup),
            "text/csv"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(Self::Spreadsheet)
            }
            "application/pdf"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Report)
            }
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(Self::Presentation)
            }
            "application/x-form" => Some(Self::Form),
            m if m.starts_with("image/") => Some(Self::Scanned),
            _ => None,
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(Self::PlainText),
            "md" | "markdown" | "html" | "htm" => Some(Self::Markup),
            "csv" | "xlsx" => Some(Self::Spreadsheet),
            "pdf" | "docx" => Some(Self::Report),
            "pptx" => Some(Self::Presentation),
            "png" | "jpg" | "jpeg" | "tiff" => Some(Self::Scanned),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Markup => "markup",
            Self::Spreadsheet => "spreadsheet",
            Self::Report => "report",
            Self::Form => "form",
            Self::Presentation => "presentation",
            Self::Scanned => "scanned",
        }
    }

    /// Kinds whose extracted text keeps reading order without layout help.
    pub fn is_well_structured(&self) -> bool {
        matches!(
            self,
            Self::PlainText | Self::Markup | Self::Spreadsheet | Self::Report
        )
    }
}

/// Where the bytes came from and what the caller says they are.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSource {
    pub filename: String,
    pub declared_type: String,
}

impl DocumentSource {
    pub fn new(filename: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            declared_type: declared_type.into(),
        }
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_mime(&self.declared_type).or_else(|| {
            self.filename
                .rsplit_once('.')
                .and_then(|(_, ext)| DocumentKind::from_extension(ext))
        })
    }
}

/// Axis-aligned text box in page coordinates, origin top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub text: String,
}

impl LayoutBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32, text: impl Into<String>) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
            text: text.into(),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn intersection_area(&self, other: &Self) -> f32 {
        let width = (self.x1.min(other.x1) - self.x0.max(other.x0)).max(0.0);
        let height = (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0);
        width * height
    }

    pub fn overlaps_vertically(&self, other: &Self) -> bool {
        self.y0 < other.y1 && other.y0 < self.y1
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    pub caption: Option<String>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            caption: None,
        }
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub id: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub text: String,
    pub width: f32,
    pub height: f32,
    pub layout: Vec<LayoutBox>,
    pub tables: Vec<Table>,
    pub images: Vec<ImageRef>,
}

impl Page {
    pub const LETTER_WIDTH: f32 = 612.0;
    pub const LETTER_HEIGHT: f32 = 792.0;

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            width: Self::LETTER_WIDTH,
            height: Self::LETTER_HEIGHT,
            layout: Vec::new(),
            tables: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn with_layout(mut self, layout: Vec<LayoutBox>) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_images(mut self, images: Vec<ImageRef>) -> Self {
        self.images = images;
        self
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Parser output. Pages are fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    id: DocumentId,
    filename: String,
    pages: Vec<Page>,
}

impl RawDocument {
    pub fn new(filename: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            id: DocumentId::new(),
            filename: filename.into(),
            pages,
        }
    }

    pub fn from_page_texts<S: Into<String>>(
        filename: impl Into<String>,
        texts: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(filename, texts.into_iter().map(Page::from_text).collect())
    }

    /// Same document identity with page texts replaced; layout, tables and images are kept.
    pub fn with_page_texts(&self, texts: &[String]) -> Self {
        let pages = self
            .pages
            .iter()
            .zip(texts)
            .map(|(page, text)| Page {
                text: text.clone(),
                ..page.clone()
            })
            .collect();
        Self {
            id: self.id,
            filename: self.filename.clone(),
            pages,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.pages.iter().map(|p| p.tables.len()).sum()
    }

    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }

    pub fn char_count(&self) -> usize {
        self.pages.iter().map(Page::char_count).sum()
    }

    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
