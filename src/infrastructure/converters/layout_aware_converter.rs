use async_trait::async_trait;

use crate::application::ports::{ConversionHints, ConverterError, TierConverter};
use crate::application::services::is_multi_column;
use crate::domain::{ConversionOutput, EnhancedDocument, LayoutBox, Page, Tier};

use super::markdown::{estimate_quality, render_image, render_table, render_text, table_chars};

const SPATIAL_ORDERING_BONUS: f32 = 0.1;

/// Layout-aware tier: rebuilds reading order from layout boxes (full-width blocks split
/// the page into bands; inside a band the left column is read before the right one) and
/// keeps tables and images next to the page they belong to.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutAwareConverter;

impl LayoutAwareConverter {
    fn page_text(page: &Page, reconstructed: Option<&String>) -> String {
        if page.layout.is_empty() {
            return reconstructed.cloned().unwrap_or_else(|| page.text.clone());
        }

        let ordered = reading_order(page);
        ordered
            .iter()
            .map(|b| b.text.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn reading_order(page: &Page) -> Vec<&LayoutBox> {
    let mut boxes: Vec<&LayoutBox> = page.layout.iter().collect();
    boxes.sort_by(|a, b| a.y0.total_cmp(&b.y0).then(a.x0.total_cmp(&b.x0)));

    if !is_multi_column(page) {
        return boxes;
    }

    let mid = page.width / 2.0;
    let full_width = page.width * 0.6;
    let mut ordered = Vec::with_capacity(boxes.len());
    let mut left: Vec<&LayoutBox> = Vec::new();
    let mut right: Vec<&LayoutBox> = Vec::new();

    for layout_box in boxes {
        if layout_box.width() >= full_width {
            ordered.append(&mut left);
            ordered.append(&mut right);
            ordered.push(layout_box);
        } else if layout_box.center_x() < mid {
            left.push(layout_box);
        } else {
            right.push(layout_box);
        }
    }
    ordered.append(&mut left);
    ordered.append(&mut right);
    ordered
}

#[async_trait]
impl TierConverter for LayoutAwareConverter {
    fn tier(&self) -> Tier {
        Tier::LayoutAware
    }

    async fn convert(
        &self,
        document: &EnhancedDocument,
        _hints: &ConversionHints,
    ) -> Result<ConversionOutput, ConverterError> {
        let mut pages = Vec::with_capacity(document.raw.page_count());
        let mut source_chars = 0;
        let mut used_layout = false;

        for (index, page) in document.raw.pages().iter().enumerate() {
            used_layout |= !page.layout.is_empty();
            source_chars += page.char_count();

            let mut sections = vec![render_text(&Self::page_text(
                page,
                document.page_texts().get(index),
            ))];
            for table in &page.tables {
                source_chars += table_chars(table);
                sections.push(render_table(table));
            }
            sections.extend(page.images.iter().map(render_image));

            let rendered = sections
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            if !rendered.is_empty() {
                pages.push(rendered);
            }
        }

        let text = pages.join("\n\n");
        let mut quality_score = estimate_quality(source_chars, text.chars().count(), 0);
        if used_layout {
            quality_score = (quality_score + SPATIAL_ORDERING_BONUS).min(1.0);
        }

        Ok(ConversionOutput {
            text,
            quality_score,
            warnings: Vec::new(),
        })
    }
}
