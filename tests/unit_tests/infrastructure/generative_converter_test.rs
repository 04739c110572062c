use docroute::application::ports::{
    AttemptSummary, ConversionHints, ConverterError, TierConverter,
};
use docroute::application::services::count_tokens;
use docroute::domain::{FlowType, Tier};
use docroute::infrastructure::converters::OpenAiGenerativeConverter;

use crate::helpers::{enhance, flowing_document};

fn converter(max_prompt_tokens: usize) -> OpenAiGenerativeConverter {
    OpenAiGenerativeConverter::new("http://127.0.0.1:9/", "test-model", "sk-test", max_prompt_tokens)
}

#[test]
fn given_hints_when_building_prompt_then_includes_guidance_and_document() {
    let document = enhance(flowing_document(2), FlowType::Flowing);
    let hints = ConversionHints {
        flow_type: Some(FlowType::Flowing),
        section_boundaries: vec![1],
        previous_attempt: Some(AttemptSummary {
            tier: Tier::LayoutAware,
            quality_score: Some(0.55),
        }),
        ..ConversionHints::default()
    };

    let (prompt, truncated) = converter(6000).build_prompt(&document, &hints);

    assert!(!truncated);
    assert!(prompt.contains("The document flow is flowing."));
    assert!(prompt.contains("New sections start on pages 2."));
    assert!(prompt.contains("A layout_aware conversion scored 0.55"));
    assert!(prompt.ends_with(document.text()));
}

#[test]
fn given_failed_previous_attempt_when_building_prompt_then_mentions_failure() {
    let document = enhance(flowing_document(1), FlowType::Flowing);
    let hints = ConversionHints {
        previous_attempt: Some(AttemptSummary {
            tier: Tier::Fast,
            quality_score: None,
        }),
        ..ConversionHints::default()
    };

    let (prompt, _) = converter(6000).build_prompt(&document, &hints);

    assert!(prompt.starts_with("A fast conversion failed."));
}

#[test]
fn given_small_token_budget_when_building_prompt_then_truncates_document() {
    let document = enhance(flowing_document(20), FlowType::Flowing);

    let (prompt, truncated) = converter(50).build_prompt(&document, &ConversionHints::default());

    assert!(truncated);
    assert!(prompt.starts_with("Document:\n"));
    assert!(count_tokens(&prompt) <= 60);
}

#[tokio::test]
async fn given_unreachable_endpoint_when_converting_then_reports_unavailable() {
    let document = enhance(flowing_document(1), FlowType::Flowing);

    let outcome = converter(6000)
        .convert(&document, &ConversionHints::default())
        .await;

    assert!(matches!(outcome, Err(ConverterError::Unavailable(_))));
    assert_eq!(converter(10).tier(), Tier::GenerativeAssisted);
}
