//! End-to-end tests of the recovery controller against scripted generators.

mod common;

use std::{collections::HashMap, sync::Arc, time::Duration};

use common::{controller, fail, request, text, EchoGenerator, Reply, ScriptedGenerator, VALID_RESPONSE};
use pretty_assertions::assert_eq;
use styleparse::{
    config::{FieldDefaults, RecoveryConfig},
    recovery::{observer::StageKind, CallShape, GenerationRequest, Tier},
    response::AnalysisResponse,
    schema::{ListField, Violation},
};

// ============================================================================
// Structured tier
// ============================================================================

#[tokio::test]
async fn test_first_structured_attempt_succeeds() {
    let generator = Arc::new(ScriptedGenerator::new([text(VALID_RESPONSE)]));
    let (controller, _) = controller(generator.clone(), RecoveryConfig::default());

    let resolution = controller.analyze(&request()).await.unwrap();

    assert_eq!(resolution.tier, Tier::Structured { attempt: 1 });
    assert_eq!(resolution.raw_text, None);
    assert_eq!(resolution.result.core_style, vec!["Nordic", "Minimal"]);
    assert_eq!(resolution.result.confidence_score, 0.87);
    assert_eq!(generator.calls(), vec![CallShape::Structured]);
}

#[tokio::test]
async fn test_retry_recovers_on_second_attempt() {
    let generator = Arc::new(ScriptedGenerator::new([
        text("Sorry, here is a description instead."),
        text(VALID_RESPONSE),
    ]));
    let (controller, _) = controller(generator.clone(), RecoveryConfig::default());

    let resolution = controller.analyze(&request()).await.unwrap();

    assert_eq!(resolution.tier, Tier::Structured { attempt: 2 });
    assert_eq!(
        generator.calls(),
        vec![CallShape::Structured, CallShape::Structured]
    );
}

#[tokio::test]
async fn test_retry_budget_controls_attempt_count() {
    for max_retries in [0u32, 1, 3] {
        let generator = Arc::new(ScriptedGenerator::new(
            std::iter::repeat(fail("unavailable")).take(max_retries as usize + 1),
        ));
        let (controller, _) = controller(generator.clone(), RecoveryConfig::default());

        let resolution = controller.resolve(&request(), max_retries).await.unwrap();

        let structured = generator
            .calls()
            .iter()
            .filter(|shape| **shape == CallShape::Structured)
            .count();
        assert_eq!(structured, max_retries as usize + 1);
        // the script is exhausted by then, so the raw call fails too
        assert_eq!(generator.calls().last(), Some(&CallShape::Raw));
        assert_eq!(resolution.tier, Tier::Fallback);
    }
}

// ============================================================================
// Escalation tiers
// ============================================================================

#[tokio::test]
async fn test_two_failures_then_raw_json_extraction() {
    let raw = "Analysis below.\n{\"core_style\": [\"Hanok\"], \"key_elements\": [\"Ondol\"], \"confidence_score\": 0.72}";
    let generator = Arc::new(ScriptedGenerator::new([
        text("not json at all"),
        fail("connection reset"),
        text(raw),
    ]));
    let (controller, observer) = controller(generator.clone(), RecoveryConfig::default());

    let resolution = controller.resolve(&request(), 1).await.unwrap();

    assert_eq!(resolution.raw_text.as_deref(), Some(raw));
    assert_eq!(resolution.result.check(), Ok(()));
    assert_eq!(resolution.result.core_style, vec!["Hanok"]);
    assert_eq!(resolution.result.confidence_score, 0.72);
    assert_eq!(
        resolution.tier,
        Tier::JsonExtraction {
            strategy: "nested_braces"
        }
    );
    assert_eq!(
        generator.calls(),
        vec![CallShape::Structured, CallShape::Structured, CallShape::Raw]
    );

    let stages: Vec<StageKind> = observer.events().iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            StageKind::Structured,
            StageKind::Structured,
            StageKind::RawRecovery,
            StageKind::JsonExtraction,
            StageKind::Repair,
            StageKind::Done,
        ]
    );
}

#[tokio::test]
async fn test_fenced_json_with_bad_confidence_is_repaired() {
    let raw = "Here you go:\n```json\n{\"core_style\": [\"cozy\"], \"confidence_score\": 1.5}\n```";
    let generator = Arc::new(ScriptedGenerator::new([fail("x"), fail("x"), text(raw)]));
    let (controller, _) = controller(generator, RecoveryConfig::default());

    let resolution = controller.analyze(&request()).await.unwrap();
    let result = resolution.result;
    let defaults = FieldDefaults::default();

    assert_eq!(result.core_style, vec!["cozy"]);
    for field in &ListField::ALL[1..] {
        assert_eq!(result.list(*field), &[defaults.list_default(*field).to_string()]);
    }
    assert_eq!(result.confidence_score, 0.1);
    assert_eq!(
        resolution.tier,
        Tier::JsonExtraction {
            strategy: "code_fence"
        }
    );
}

#[tokio::test]
async fn test_raw_network_error_returns_fallback_with_marker() {
    let generator = Arc::new(ScriptedGenerator::new([
        fail("quota"),
        fail("quota"),
        fail("upstream unavailable"),
    ]));
    let (controller, observer) = controller(generator, RecoveryConfig::default());

    let resolution = controller.analyze(&request()).await.unwrap();

    assert_eq!(resolution.result, controller.tiers().fallback_result());
    assert_eq!(resolution.tier, Tier::Fallback);
    let raw_text = resolution.raw_text.unwrap();
    assert!(raw_text.contains("Error generating content"));
    assert!(raw_text.contains("upstream unavailable"));

    // no extraction is attempted without text
    let stages: Vec<StageKind> = observer.events().iter().map(|e| e.stage).collect();
    assert!(!stages.contains(&StageKind::JsonExtraction));
}

#[tokio::test]
async fn test_prose_goes_to_heuristic_tier() {
    let raw = "디자인: 모던, 미니멀\nThe rooms are bright, with warm wooden floors and a large terrace.";
    let generator = Arc::new(ScriptedGenerator::new([fail("x"), fail("x"), text(raw)]));
    let (controller, _) = controller(generator, RecoveryConfig::default());

    let resolution = controller.analyze(&request()).await.unwrap();

    assert_eq!(resolution.tier, Tier::Heuristic);
    assert_eq!(resolution.result.core_style, vec!["모던", "미니멀"]);
    assert_eq!(resolution.result.memo, raw);
    assert_eq!(resolution.result.confidence_score, 0.1);
    assert_eq!(resolution.raw_text.as_deref(), Some(raw));
}

#[tokio::test]
async fn test_empty_object_falls_through_to_keyword_scan() {
    let raw = "Style: Nordic, Minimal\nresult: {}";
    let generator = Arc::new(ScriptedGenerator::new([fail("x"), fail("x"), text(raw)]));
    let (controller, observer) = controller(generator, RecoveryConfig::default());

    let resolution = controller.analyze(&request()).await.unwrap();

    assert_eq!(resolution.tier, Tier::Heuristic);
    assert_eq!(resolution.result.core_style, vec!["Nordic", "Minimal"]);
    let stages: Vec<StageKind> = observer.events().iter().map(|e| e.stage).collect();
    assert!(stages.contains(&StageKind::HeuristicExtraction));
}

#[tokio::test]
async fn test_empty_raw_text_still_resolves() {
    let generator = Arc::new(ScriptedGenerator::new([fail("x"), fail("x"), text("")]));
    let (controller, _) = controller(generator, RecoveryConfig::default());

    let resolution = controller.analyze(&request()).await.unwrap();

    assert_eq!(resolution.tier, Tier::Heuristic);
    assert_eq!(resolution.result.memo, "Image analysis complete.");
    assert_eq!(resolution.result.check(), Ok(()));
}

// ============================================================================
// Timeouts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_structured_timeout_consumes_a_retry() {
    let generator = Arc::new(ScriptedGenerator::new([Reply::Hang, text(VALID_RESPONSE)]));
    let (controller, observer) = controller(generator, RecoveryConfig::default());

    let resolution = controller.analyze(&request()).await.unwrap();

    assert_eq!(resolution.tier, Tier::Structured { attempt: 2 });
    let errors: Vec<String> = observer.events().into_iter().filter_map(|e| e.error).collect();
    assert_eq!(errors, vec!["generation timed out after 60s".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_raw_timeout_goes_to_fallback() {
    let config = RecoveryConfig {
        call_timeout_secs: 5,
        ..RecoveryConfig::default()
    };
    let generator = Arc::new(ScriptedGenerator::new([fail("x"), fail("x"), Reply::Hang]));
    let (controller, _) = controller(generator, config);

    let started = tokio::time::Instant::now();
    let resolution = controller.analyze(&request()).await.unwrap();

    assert_eq!(resolution.tier, Tier::Fallback);
    assert_eq!(
        resolution.raw_text.as_deref(),
        Some("Error generating content: generation timed out after 5s")
    );
    assert!(started.elapsed() >= Duration::from_secs(5));
}

// ============================================================================
// Terminal failure
// ============================================================================

#[tokio::test]
async fn test_broken_defaults_surface_as_terminal_failure() {
    // bypasses RecoveryConfig::validate on purpose
    let config = RecoveryConfig {
        defaults: FieldDefaults {
            core_style: String::new(),
            ..FieldDefaults::default()
        },
        ..RecoveryConfig::default()
    };
    assert!(config.validate().is_err());

    let generator = Arc::new(ScriptedGenerator::new([fail("x"), fail("x"), fail("down")]));
    let (controller, _) = controller(generator, config);

    let outcome = controller.analyze(&request()).await;
    let failure = outcome.as_ref().unwrap_err();
    assert_eq!(failure.violation, Violation::BlankEntry(ListField::CoreStyle));
    assert!(failure
        .raw_text
        .as_deref()
        .unwrap()
        .starts_with("Error generating content"));

    let response = AnalysisResponse::from_outcome(&outcome);
    assert_eq!(response.status, 500);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runs_do_not_share_state() {
    let (controller, observer) = controller(Arc::new(EchoGenerator), RecoveryConfig::default());
    let controller = Arc::new(controller);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let controller = controller.clone();
            tokio::spawn(async move {
                let prompt = format!("{{\"core_style\": [\"style-{i}\"]}}");
                let resolution = controller
                    .analyze(&GenerationRequest::new(prompt))
                    .await
                    .unwrap();
                (i, resolution)
            })
        })
        .collect();

    for handle in handles {
        let (i, resolution) = handle.await.unwrap();
        assert_eq!(resolution.result.core_style, vec![format!("style-{i}")]);
    }

    let mut runs: HashMap<_, Vec<StageKind>> = HashMap::new();
    for event in observer.events() {
        runs.entry(event.request_id).or_default().push(event.stage);
    }
    assert_eq!(runs.len(), 16);
    for stages in runs.values() {
        assert_eq!(stages.first(), Some(&StageKind::Structured));
        assert_eq!(stages.last(), Some(&StageKind::Done));
        assert_eq!(stages.len(), 6);
    }
}
