use docroute::domain::{
    LineKind, LineProfile, MarkerKind, classify_line, ends_with_terminal_punctuation,
    is_wrapped_continuation,
};

#[test]
fn given_glyph_prefixed_lines_when_classifying_then_returns_bullet() {
    for line in ["• first point", "- second point", "  * nested point", "▪ boxed"] {
        assert_eq!(
            classify_line(line),
            LineKind::Marker(MarkerKind::Bullet),
            "{line}"
        );
    }
}

#[test]
fn given_hyphenated_word_when_classifying_then_is_not_bullet() {
    assert_eq!(classify_line("-based pricing was dropped."), LineKind::Text);
}

#[test]
fn given_enumerated_lines_when_classifying_then_returns_numbered() {
    for line in ["1. Review the logs", "2) Sign off", "(a) first clause", "iv. fourth item", "3.2 Scope"] {
        assert_eq!(
            classify_line(line),
            LineKind::Marker(MarkerKind::Numbered),
            "{line}"
        );
    }
}

#[test]
fn given_short_line_ending_with_colon_when_classifying_then_returns_section_label() {
    assert_eq!(
        classify_line("Requirements:"),
        LineKind::Marker(MarkerKind::SectionLabel)
    );
}

#[test]
fn given_caps_or_title_case_line_when_classifying_then_returns_heading() {
    assert_eq!(
        classify_line("EXECUTIVE SUMMARY"),
        LineKind::Marker(MarkerKind::Heading)
    );
    assert_eq!(
        classify_line("Results of the Field Study"),
        LineKind::Marker(MarkerKind::Heading)
    );
}

#[test]
fn given_sentence_when_classifying_then_returns_text() {
    assert_eq!(
        classify_line("The committee approved the budget."),
        LineKind::Text
    );
    assert_eq!(classify_line("   "), LineKind::Blank);
}

#[test]
fn given_line_without_terminal_punctuation_when_next_starts_lowercase_then_is_continuation() {
    assert!(is_wrapped_continuation(
        "The committee postponed the",
        "vote until Friday."
    ));
    assert!(!is_wrapped_continuation(
        "The committee postponed the vote.",
        "later it met again."
    ));
    assert!(!is_wrapped_continuation("The committee postponed the", "Vote later."));
}

#[test]
fn given_quoted_sentence_when_checking_terminal_punctuation_then_sees_through_quotes() {
    assert!(ends_with_terminal_punctuation("He said \"stop.\""));
    assert!(!ends_with_terminal_punctuation("and then the"));
}

#[test]
fn given_mixed_text_when_profiling_then_counts_markers_and_cues() {
    let profile = LineProfile::from_text(
        "OVERVIEW\n\n- alpha\n- beta\n  indented prose continues here\nPlain closing sentence.",
    );

    assert_eq!(profile.non_blank_lines, 5);
    assert_eq!(profile.blank_lines, 1);
    assert_eq!(profile.count(MarkerKind::Bullet), 2);
    assert_eq!(profile.count(MarkerKind::Heading), 1);
    assert!((profile.marker_density() - 0.6).abs() < 1e-6);

    let cues = profile.formatting_cues();
    assert!(cues.list_glyphs.contains(&'-'));
    assert!((cues.indented_line_ratio - 0.2).abs() < 1e-6);
}
