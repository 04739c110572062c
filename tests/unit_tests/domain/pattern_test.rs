use std::collections::BTreeSet;

use docroute::domain::{DocumentPattern, FlowType, FormattingCues};

fn pattern(boundaries: Vec<usize>, page_count: usize) -> DocumentPattern {
    DocumentPattern::new(
        FlowType::Mixed,
        BTreeSet::new(),
        boundaries,
        FormattingCues::default(),
        page_count,
    )
}

#[test]
fn given_unsorted_duplicate_boundaries_when_building_then_normalizes_them() {
    let pattern = pattern(vec![7, 3, 3, 12, 5], 10);

    assert_eq!(pattern.section_boundaries(), &[3, 5, 7]);
    assert!(pattern.is_section_start(5));
    assert!(!pattern.is_section_start(4));
}

#[test]
fn given_boundaries_when_checking_range_then_upper_bound_is_inclusive() {
    let pattern = pattern(vec![4], 10);

    assert!(pattern.has_boundary_between(3, 4));
    assert!(!pattern.has_boundary_between(4, 6));
    assert!(!pattern.has_boundary_between(0, 3));
}

#[test]
fn given_empty_pattern_when_inspecting_then_is_flowing_without_boundaries() {
    let pattern = DocumentPattern::empty();

    assert_eq!(pattern.flow_type(), FlowType::Flowing);
    assert!(pattern.section_boundaries().is_empty());
    assert!(!pattern.is_degraded());
    assert!(pattern.degraded().is_degraded());
}

#[test]
fn given_out_of_range_confidence_when_setting_then_clamps() {
    let pattern = pattern(Vec::new(), 1).with_flow_confidence(1.7);
    assert_eq!(pattern.flow_confidence(), 1.0);
}
