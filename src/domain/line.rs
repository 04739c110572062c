use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use super::document::Page;
use super::pattern::{FormattingCues, MarkerKind};

const BULLET_GLYPHS: &[char] = &[
    '•', '●', '○', '◦', '▪', '▫', '■', '□', '‣', '⁃', '·', '-', '*', '+', '–', '—', '>',
];

const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', ':', ';', '。', '…'];

const CLOSING_WRAPPERS: &[char] = &['"', '\'', ')', ']', '”', '’', '»'];

const HEADING_STOPWORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "of", "on", "or", "the", "to",
    "vs", "with",
];

static NUMBERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\d{1,3}(?:\.\d{1,3})*[.)]|\d{1,3}(?:\.\d{1,3})+|[A-Za-z][.)]|[ivxlcdm]{1,6}[.)]|[IVXLCDM]{1,6}[.)]|\((?:\d{1,3}|[A-Za-z]{1,4})\))(?:\s|$)",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Blank,
    Marker(MarkerKind),
    Text,
}

impl LineKind {
    pub fn is_marker(&self) -> bool {
        matches!(self, LineKind::Marker(_))
    }

    pub fn is_list_item(&self) -> bool {
        matches!(
            self,
            LineKind::Marker(MarkerKind::Bullet) | LineKind::Marker(MarkerKind::Numbered)
        )
    }

    /// Headings and section labels stand alone and never absorb the next line.
    pub fn is_standalone(&self) -> bool {
        matches!(
            self,
            LineKind::Marker(MarkerKind::Heading) | LineKind::Marker(MarkerKind::SectionLabel)
        )
    }
}

pub fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if is_bullet(trimmed) {
        return LineKind::Marker(MarkerKind::Bullet);
    }
    if NUMBERED.is_match(trimmed) {
        return LineKind::Marker(MarkerKind::Numbered);
    }
    if is_section_label(trimmed) {
        return LineKind::Marker(MarkerKind::SectionLabel);
    }
    if is_heading(trimmed) {
        return LineKind::Marker(MarkerKind::Heading);
    }
    LineKind::Text
}

pub fn bullet_glyph(line: &str) -> Option<char> {
    let trimmed = line.trim_start();
    is_bullet(trimmed).then(|| trimmed.chars().next()).flatten()
}

pub fn ends_with_terminal_punctuation(line: &str) -> bool {
    line.trim_end()
        .trim_end_matches(CLOSING_WRAPPERS)
        .ends_with(TERMINAL_PUNCTUATION)
}

pub fn starts_lowercase(line: &str) -> bool {
    line.trim_start()
        .chars()
        .next()
        .is_some_and(char::is_lowercase)
}

/// A line break that only exists because the text was wrapped.
pub fn is_wrapped_continuation(previous: &str, next: &str) -> bool {
    !ends_with_terminal_punctuation(previous) && starts_lowercase(next)
}

fn is_bullet(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if BULLET_GLYPHS.contains(&first) => {
            chars.next().is_none_or(char::is_whitespace)
        }
        _ => false,
    }
}

fn is_section_label(trimmed: &str) -> bool {
    trimmed.ends_with(':')
        && trimmed.chars().count() <= 60
        && trimmed.split_whitespace().count() <= 8
        && trimmed.chars().any(char::is_alphabetic)
}

fn is_heading(trimmed: &str) -> bool {
    let char_count = trimmed.chars().count();
    if !(2..=80).contains(&char_count) {
        return false;
    }
    if trimmed.ends_with(['.', ',', ';', ':', '!', '?']) {
        return false;
    }

    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 2 {
        return false;
    }

    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    if letters.len() >= 3 && upper as f32 / letters.len() as f32 >= 0.8 {
        return true;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if !(2..=8).contains(&words.len()) || char_count > 60 {
        return false;
    }
    if !words[0].chars().next().is_some_and(char::is_uppercase) {
        return false;
    }

    words
        .iter()
        .filter(|w| !HEADING_STOPWORDS.contains(&w.to_lowercase().as_str()))
        .all(|w| {
            w.chars()
                .next()
                .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
        })
}

/// Line-level statistics over one or more pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineProfile {
    pub non_blank_lines: usize,
    pub blank_lines: usize,
    pub indented_lines: usize,
    pub total_chars: usize,
    pub marker_counts: BTreeMap<MarkerKind, usize>,
    pub list_glyphs: BTreeSet<char>,
}

impl LineProfile {
    pub fn from_pages(pages: &[Page]) -> Self {
        let mut profile = Self::default();
        for page in pages {
            profile.accumulate(&page.text);
        }
        profile
    }

    pub fn from_text(text: &str) -> Self {
        let mut profile = Self::default();
        profile.accumulate(text);
        profile
    }

    fn accumulate(&mut self, text: &str) {
        for line in text.lines() {
            match classify_line(line) {
                LineKind::Blank => self.blank_lines += 1,
                kind => {
                    self.non_blank_lines += 1;
                    self.total_chars += line.trim().chars().count();
                    if line.starts_with([' ', '\t']) {
                        self.indented_lines += 1;
                    }
                    if let LineKind::Marker(marker) = kind {
                        *self.marker_counts.entry(marker).or_default() += 1;
                    }
                    if let Some(glyph) = bullet_glyph(line) {
                        self.list_glyphs.insert(glyph);
                    }
                }
            }
        }
    }

    pub fn count(&self, marker: MarkerKind) -> usize {
        self.marker_counts.get(&marker).copied().unwrap_or(0)
    }

    pub fn marker_lines(&self) -> usize {
        self.marker_counts.values().sum()
    }

    pub fn marker_density(&self) -> f32 {
        self.ratio(self.marker_lines())
    }

    pub fn list_ratio(&self) -> f32 {
        self.ratio(self.count(MarkerKind::Bullet) + self.count(MarkerKind::Numbered))
    }

    pub fn heading_ratio(&self) -> f32 {
        self.ratio(self.count(MarkerKind::Heading) + self.count(MarkerKind::SectionLabel))
    }

    pub fn avg_line_length(&self) -> f32 {
        self.ratio(self.total_chars)
    }

    pub fn markers(&self) -> BTreeSet<MarkerKind> {
        self.marker_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(marker, _)| *marker)
            .collect()
    }

    pub fn formatting_cues(&self) -> FormattingCues {
        let all_lines = self.non_blank_lines + self.blank_lines;
        FormattingCues {
            avg_line_length: self.avg_line_length(),
            marker_density: self.marker_density(),
            indented_line_ratio: self.ratio(self.indented_lines),
            blank_line_ratio: if all_lines == 0 {
                0.0
            } else {
                self.blank_lines as f32 / all_lines as f32
            },
            list_glyphs: self.list_glyphs.clone(),
        }
    }

    fn ratio(&self, count: usize) -> f32 {
        if self.non_blank_lines == 0 {
            0.0
        } else {
            count as f32 / self.non_blank_lines as f32
        }
    }
}
