use unicode_normalization::UnicodeNormalization;

use crate::domain::{
    DocumentPattern, LineKind, RawDocument, Reconstruction, ReconstructionDelta,
    ReconstructionStrategy, classify_line, is_wrapped_continuation,
};

/// Rewrites extracted page text into paragraphs and structural elements.
///
/// Strategy is chosen from the pattern's flow type:
/// * `PreserveStructure` merges only lines that were obviously wrapped.
/// * `ParagraphFlow` merges consecutive text lines into paragraphs.
/// * `Hybrid` uses the structured rule inside marker-led regions and the flowing rule
///   elsewhere.
///
/// Marker lines never join the previous block, and headings or section labels never
/// absorb the next line. Running the reconstructor on its own output is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveReconstructor;

struct Block {
    text: String,
    kind: LineKind,
    gap_before: bool,
}

#[derive(Default)]
struct PageOutcome {
    text: String,
    lines_in: usize,
    lines_out: usize,
    merged: usize,
}

impl AdaptiveReconstructor {
    pub fn new() -> Self {
        Self
    }

    pub fn reconstruct(&self, document: &RawDocument, pattern: &DocumentPattern) -> Reconstruction {
        let strategy = ReconstructionStrategy::for_flow(pattern.flow_type());
        let mut delta = ReconstructionDelta::default();

        let pages: Vec<String> = document
            .pages()
            .iter()
            .map(|page| {
                let outcome = reconstruct_page(&page.text, strategy);
                delta.lines_in += outcome.lines_in;
                delta.lines_out += outcome.lines_out;
                delta.merged_lines += outcome.merged;
                outcome.text
            })
            .collect();

        let (text, page_joins) = assemble(&pages, pattern);
        delta.page_joins = page_joins;

        let confidence = if pattern.is_degraded() {
            pattern.flow_confidence() - 0.1
        } else {
            pattern.flow_confidence()
        };

        tracing::debug!(
            strategy = %strategy,
            merged_lines = delta.merged_lines,
            page_joins = delta.page_joins,
            "Text reconstructed"
        );

        Reconstruction {
            pages,
            text,
            strategy,
            confidence: confidence.clamp(0.0, 1.0),
            delta,
        }
    }
}

fn normalize_line(line: &str) -> String {
    let normalized: String = line.nfkc().collect();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn reconstruct_page(text: &str, strategy: ReconstructionStrategy) -> PageOutcome {
    let mut outcome = PageOutcome::default();
    let mut blocks: Vec<Block> = Vec::new();
    let mut current: Option<Block> = None;
    let mut pending_gap = false;
    let mut in_marker_region = false;

    for raw_line in text.lines() {
        let line = normalize_line(raw_line);
        let kind = classify_line(&line);

        if kind == LineKind::Blank {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            pending_gap = !blocks.is_empty();
            in_marker_region = false;
            continue;
        }

        outcome.lines_in += 1;
        if kind.is_marker() {
            in_marker_region = true;
        }

        if let Some(block) = current.as_mut() {
            if should_join(strategy, block, &line, kind, in_marker_region) {
                block.text.push(' ');
                block.text.push_str(&line);
                outcome.merged += 1;
                continue;
            }
        }

        if let Some(block) = current.take() {
            blocks.push(block);
        }
        current = Some(Block {
            text: line,
            kind,
            gap_before: pending_gap,
        });
        pending_gap = false;
    }

    if let Some(block) = current.take() {
        blocks.push(block);
    }

    outcome.lines_out = blocks.len();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            outcome
                .text
                .push_str(if block.gap_before { "\n\n" } else { "\n" });
        }
        outcome.text.push_str(&block.text);
    }
    outcome
}

fn should_join(
    strategy: ReconstructionStrategy,
    block: &Block,
    line: &str,
    kind: LineKind,
    in_marker_region: bool,
) -> bool {
    if kind.is_marker() || block.kind.is_standalone() {
        return false;
    }

    let structured_rule = is_wrapped_continuation(&block.text, line);
    let flowing_rule = if block.kind.is_list_item() {
        structured_rule
    } else {
        true
    };

    match strategy {
        ReconstructionStrategy::PreserveStructure => structured_rule,
        ReconstructionStrategy::ParagraphFlow => flowing_rule,
        ReconstructionStrategy::Hybrid if in_marker_region => structured_rule,
        ReconstructionStrategy::Hybrid => flowing_rule,
    }
}

/// Joins page outputs. A line wrapped across a page break continues on the next page
/// unless a section boundary falls in between.
fn assemble(pages: &[String], pattern: &DocumentPattern) -> (String, usize) {
    let mut text = String::new();
    let mut joins = 0;
    let mut previous: Option<(usize, &str)> = None;

    for (index, page) in pages.iter().enumerate() {
        if page.is_empty() {
            continue;
        }

        if let Some((previous_index, previous_page)) = previous {
            let last_line = previous_page.lines().last().unwrap_or_default();
            let first_line = page.lines().next().unwrap_or_default();
            let continues = !pattern.has_boundary_between(previous_index, index)
                && classify_line(last_line) == LineKind::Text
                && classify_line(first_line) == LineKind::Text
                && is_wrapped_continuation(last_line, first_line);

            if continues {
                text.push(' ');
                joins += 1;
            } else {
                text.push_str("\n\n");
            }
        }

        text.push_str(page);
        previous = Some((index, page.as_str()));
    }

    (text, joins)
}
