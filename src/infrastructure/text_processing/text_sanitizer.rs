use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static HYPHEN_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<prefix>\w)-[ \t]*\r?\n[ \t]*(?P<suffix>\w)").unwrap());

const TAB_WIDTH: usize = 4;

/// NFKC, joins words hyphenated across a line break, collapses blank runs to a single blank
/// line and internal whitespace to single spaces. Leading indentation is kept with tabs
/// expanded, since list and code detection read it.
pub fn sanitize_extracted_text(raw: &str) -> String {
    let normalized: String = raw.nfkc().filter(|c| !is_stray_control(*c)).collect();
    let de_hyphenated = HYPHEN_NEWLINE.replace_all(&normalized, "$prefix$suffix");

    let mut result = String::with_capacity(de_hyphenated.len());
    let mut prev_was_blank = false;
    let mut first_content = true;

    for line in de_hyphenated.lines() {
        let content = line.trim();

        if content.is_empty() {
            prev_was_blank = true;
            continue;
        }
        if !first_content && prev_was_blank {
            result.push_str("\n\n");
        } else if !first_content {
            result.push('\n');
        }
        push_indent(line, &mut result);
        collapse_internal_whitespace(content, &mut result);
        prev_was_blank = false;
        first_content = false;
    }

    result
}

fn is_stray_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\n' | '\r' | '\t')
}

fn push_indent(line: &str, out: &mut String) {
    let width: usize = line
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum();
    out.extend(std::iter::repeat_n(' ', width));
}

fn collapse_internal_whitespace(line: &str, out: &mut String) {
    let mut prev_was_space = false;

    for ch in line.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                out.push(' ');
                prev_was_space = true;
            }
        } else {
            out.push(ch);
            prev_was_space = false;
        }
    }
}
