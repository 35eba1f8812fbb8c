use super::*;
use crate::diagnosis::Taxonomy;
use crate::llm::LlmError;
use crate::test_helpers::MockGenerator;
use dispatch::DispatchError;

fn leaf_spot() -> Candidate {
    Candidate {
        name: "leaf spot".into(),
        probability: 0.8123,
        description: String::new(),
        treatment: None,
        taxonomy: Some(Taxonomy {
            kingdom: "Fungi".into(),
            family: "Mycosphaerellaceae".into(),
            genus: "Septoria".into(),
            ..Taxonomy::default()
        }),
        common_names: Some(vec!["septoria leaf spot".into(), "blotch".into()]),
        url: None,
    }
}

#[test]
fn prompt_carries_candidate_details() {
    let prompt = disease_guide_prompt(&leaf_spot());
    assert!(prompt.starts_with("You are a plant disease expert specialized in leaf spot."));
    assert!(prompt.contains("- Description: No detailed description available."));
    assert!(prompt.contains("- Probability: 81.23%"));
    assert!(prompt.contains("Kingdom Fungi, Family Mycosphaerellaceae, Genus Septoria"));
    assert!(prompt.contains("- Common names: septoria leaf spot, blotch"));
    assert!(prompt.contains("7. Risk levels to other plants, humans, or pets"));
}

#[test]
fn prompt_omits_missing_taxonomy() {
    let mut candidate = leaf_spot();
    candidate.taxonomy = None;
    candidate.common_names = None;
    let prompt = disease_guide_prompt(&candidate);
    assert!(!prompt.contains("taxonomy"));
    assert!(!prompt.contains("Common names"));
}

#[tokio::test]
async fn returns_generated_text() {
    let generator = MockGenerator::new(vec![Ok("## Leaf spot\n- Remove infected leaves".into())]);
    let text = enhanced_info(generator.as_ref(), &leaf_spot()).await;
    assert!(text.starts_with("## Leaf spot"));
    assert_eq!(generator.prompt_count(), 1);
}

#[tokio::test]
async fn failure_returns_fallback() {
    let generator =
        MockGenerator::new(vec![Err(LlmError::Dispatch(DispatchError::Status { status: 403, body: "denied".into() }))]);
    assert_eq!(enhanced_info(generator.as_ref(), &leaf_spot()).await, GUIDE_FALLBACK);
}
