use crate::domain::{ImageRef, LineKind, MarkerKind, Table, bullet_glyph, classify_line};

const WARNING_PENALTY: f32 = 0.1;
const MAX_WARNING_PENALTY: f32 = 0.5;
const LENGTH_RATIO_PENALTY: f32 = 0.2;

/// Renders reconstructed text as markdown: headings, list items and paragraphs.
pub fn render_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    let mut previous_was_heading = false;

    for line in text.lines() {
        let kind = classify_line(line);
        let rendered = match kind {
            LineKind::Blank => {
                while !out.is_empty() && !out.ends_with("\n\n") {
                    out.push('\n');
                }
                previous_was_heading = false;
                continue;
            }
            LineKind::Marker(MarkerKind::Heading) => format!("## {}", line.trim()),
            LineKind::Marker(MarkerKind::SectionLabel) => format!("**{}**", line.trim()),
            LineKind::Marker(MarkerKind::Bullet) => {
                let trimmed = line.trim();
                let glyph_len = bullet_glyph(trimmed).map_or(0, char::len_utf8);
                format!("- {}", trimmed[glyph_len..].trim_start())
            }
            LineKind::Marker(MarkerKind::Numbered) | LineKind::Text => line.trim().to_string(),
        };

        let is_heading = kind == LineKind::Marker(MarkerKind::Heading);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        if (is_heading || previous_was_heading) && !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(&rendered);
        previous_was_heading = is_heading;
    }

    out.trim_end().to_string()
}

pub fn render_table(table: &Table) -> String {
    let columns = table.column_count();
    if columns == 0 {
        return String::new();
    }

    let row = |cells: &[String]| {
        let mut padded: Vec<String> = cells
            .iter()
            .map(|c| c.replace('|', "\\|").replace('\n', " "))
            .collect();
        padded.resize(columns, String::new());
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::with_capacity(table.rows.len() + 2);
    if let Some(caption) = &table.caption {
        lines.push(format!("*{}*", caption.trim()));
        lines.push(String::new());
    }
    for (i, cells) in table.rows.iter().enumerate() {
        lines.push(row(cells));
        if i == 0 {
            lines.push(format!("|{}", " --- |".repeat(columns)));
        }
    }
    lines.join("\n")
}

pub fn render_image(image: &ImageRef) -> String {
    let alt = image.caption.as_deref().unwrap_or("image");
    format!("![{}]({})", alt, image.id)
}

pub fn table_chars(table: &Table) -> usize {
    table
        .rows
        .iter()
        .flatten()
        .map(|cell| cell.chars().count())
        .sum()
}

/// Content-preservation estimate: starts at 1.0, loses a bounded amount per warning and
/// a fixed amount when the output length drifts outside half to double the source.
pub fn estimate_quality(source_chars: usize, output_chars: usize, warnings: usize) -> f32 {
    let mut quality = 1.0 - (warnings as f32 * WARNING_PENALTY).min(MAX_WARNING_PENALTY);

    if source_chars > 0 {
        let ratio = output_chars as f32 / source_chars as f32;
        if !(0.5..=2.0).contains(&ratio) {
            quality -= LENGTH_RATIO_PENALTY;
        }
    } else if output_chars > 0 {
        quality -= LENGTH_RATIO_PENALTY;
    }

    quality.clamp(0.0, 1.0)
}
