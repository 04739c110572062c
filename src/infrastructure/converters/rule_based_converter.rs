use async_trait::async_trait;

use crate::application::ports::{ConversionHints, ConverterError, TierConverter};
use crate::application::services::is_multi_column;
use crate::domain::{ConversionOutput, EnhancedDocument, Tier};

use super::markdown::{estimate_quality, render_image, render_table, render_text, table_chars};

const MAX_TABLE_ROWS: usize = 50;
const MAX_TABLE_COLUMNS: usize = 12;

/// Fast tier: renders the reconstructed text as markdown and appends each page's tables
/// and image placeholders. Layout is ignored, so multi-column pages are flagged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedConverter;

#[async_trait]
impl TierConverter for RuleBasedConverter {
    fn tier(&self) -> Tier {
        Tier::Fast
    }

    async fn convert(
        &self,
        document: &EnhancedDocument,
        _hints: &ConversionHints,
    ) -> Result<ConversionOutput, ConverterError> {
        let mut sections = vec![render_text(document.text())];
        let mut warnings = Vec::new();
        let mut source_chars = document.raw.char_count();

        for (index, page) in document.raw.pages().iter().enumerate() {
            let page_number = index + 1;
            if is_multi_column(page) {
                warnings.push(format!(
                    "page {page_number}: multi-column layout flattened into a single column"
                ));
            }
            for table in &page.tables {
                if table.rows.len() > MAX_TABLE_ROWS || table.column_count() > MAX_TABLE_COLUMNS {
                    warnings.push(format!(
                        "page {page_number}: table with {} rows and {} columns may be misaligned",
                        table.rows.len(),
                        table.column_count()
                    ));
                }
                source_chars += table_chars(table);
                sections.push(render_table(table));
            }
            sections.extend(page.images.iter().map(render_image));
        }

        let text = sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let quality_score = estimate_quality(source_chars, text.chars().count(), warnings.len());

        Ok(ConversionOutput {
            text,
            quality_score,
            warnings,
        })
    }
}
