//! Call contract of the provider-backed resolver, exercised through the
//! public API with a canned provider.

use super::test_utils::{reply, CannedProvider, VALLEY};
use chirality::error::ProviderError;
use chirality::matrices::{matrix_a, matrix_b};
use chirality::pipeline::{compute_cell_c, Collaborators};
use chirality::prompt::prompt_hash;
use chirality::provider::MessageRole;
use chirality::resolver::{CellResolver, ResolverSettings, RetryPolicy};
use std::time::Duration;

fn resolver(provider: &CannedProvider) -> CellResolver {
    let settings = ResolverSettings {
        retry: RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
        },
        ..ResolverSettings::default()
    };
    CellResolver::new(Box::new(provider.clone()), settings)
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_then_success() {
    let provider = CannedProvider::new(vec![
        Err(ProviderError::RateLimit("slow down".to_string())),
        Ok("not json at all".to_string()),
        reply("Necessary Values"),
    ]);
    let (outcome, metadata) = resolver(&provider)
        .dispatch("system", "user", "multiply")
        .await;

    assert_eq!(outcome.text, "Necessary Values");
    assert_eq!(metadata.attempts, 3);
    assert_eq!(metadata.model_id, "canned-model");
    assert_eq!(metadata.prompt_hash, prompt_hash("system", "user"));
    assert!(metadata.error.is_none());
    assert_eq!(provider.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_budget_degrades() {
    let provider = CannedProvider::new(Vec::new());
    let (outcome, metadata) = resolver(&provider)
        .dispatch("system", "user", "interpret")
        .await;

    assert_eq!(outcome.text, "ERROR: Failed to process interpret");
    assert!(outcome.warnings[0].starts_with("provider_failure: "));
    assert_eq!(metadata.attempts, 4);
    assert_eq!(metadata.phase, "error");
    assert!(metadata.error.is_some());
    assert_eq!(provider.requests().len(), 4);
}

#[tokio::test]
async fn test_request_carries_deterministic_options() {
    let provider = CannedProvider::new(vec![reply("ok")]);
    resolver(&provider).dispatch("sys", "usr", "multiply").await;

    let requests = provider.requests();
    let (messages, options) = &requests[0];
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::System);
    assert_eq!(messages[0].content, "sys");
    assert_eq!(messages[1].role, MessageRole::User);
    assert_eq!(options.top_p, Some(0.0));
    assert_eq!(options.seed, Some(42));
    assert_eq!(options.max_tokens, Some(200));
    assert_eq!(options.temperature, Some(0.7));
}

#[tokio::test]
async fn test_c_cell_through_provider_backed_resolver() {
    let provider = CannedProvider::new(vec![
        reply("r0"),
        reply("r1"),
        reply("r2"),
        reply("r3"),
        reply("lensed result"),
    ]);
    let (a, b) = (matrix_a().unwrap(), matrix_b().unwrap());
    let cell = compute_cell_c(0, 0, &a, &b, &resolver(&provider), VALLEY, &Collaborators::none())
        .await
        .unwrap();

    assert_eq!(cell.value, "lensed result");
    assert_eq!(
        cell.provenance_list("stage_2_resolved").unwrap(),
        vec!["r0", "r1", "r2", "r3"]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 5);
    let first_user = &requests[0].0[1].content;
    assert!(first_user.contains("Values"));
    assert!(first_user.contains("Necessary"));
    let lens_user = &requests[4].0[1].content;
    assert!(lens_user.contains("r0, r1, r2, r3"));
    assert_eq!(requests[4].1.temperature, Some(0.5));
}
