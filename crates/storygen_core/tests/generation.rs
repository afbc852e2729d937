//! crates/storygen_core/tests/generation.rs
//!
//! End-to-end tests for the generation pipeline against a scripted model
//! stub. Time-sensitive tests run on a paused tokio clock so the retry
//! delays are asserted without real waiting.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use storygen_core::domain::{AcStyle, GenerationRequest, StoryStyle};
use storygen_core::generator::{AttemptError, StoryGenerator, MAX_ATTEMPTS};
use storygen_core::parser::ParseError;
use storygen_core::ports::{ChatModelService, PortError, PortResult};

/// One scripted outcome for a model call.
#[derive(Clone)]
enum Reply {
    Text(String),
    NoContent,
    Fail(String),
}

/// A model stub that plays back a fixed script of replies, one per call.
/// If the script runs out, the last entry is repeated (a deterministic
/// model keeps producing the same output).
struct ScriptedModel {
    script: Mutex<VecDeque<Reply>>,
    calls: AtomicU32,
}

impl ScriptedModel {
    fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModelService for ScriptedModel {
    async fn complete(
        &self,
        _system_message: &str,
        _user_message: &str,
    ) -> PortResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let reply = script
            .front()
            .cloned()
            .expect("scripted model called with an empty script");
        if script.len() > 1 {
            script.pop_front();
        }
        match reply {
            Reply::Text(text) => Ok(Some(text)),
            Reply::NoContent => Ok(None),
            Reply::Fail(msg) => Err(PortError::Unexpected(msg)),
        }
    }
}

fn request() -> GenerationRequest {
    GenerationRequest {
        notes: "Users need to reset passwords".to_string(),
        platforms: vec!["Web".to_string()],
        product_phases: vec!["MVP".to_string()],
        story_style: StoryStyle::Scrum,
        ac_style: AcStyle::GivenWhenThen,
        include_test_cases: false,
    }
}

fn valid_story_payload(platform: &str, phase: &str) -> String {
    serde_json::json!({
        "stories": [{
            "title": "Password reset",
            "description": "As a user, I want to reset my password so that I can regain access.",
            "acceptanceCriteria": [
                "Given a registered email, When I request a reset, Then I receive a link"
            ],
            "negativeScenarios": ["Reset link has expired"],
            "platform": platform,
            "phase": phase
        }]
    })
    .to_string()
}

#[tokio::test]
async fn well_formed_response_succeeds_on_first_attempt() {
    let model = ScriptedModel::new(vec![Reply::Text(valid_story_payload("Web", "MVP"))]);
    let generator = StoryGenerator::new(model.clone());

    let result = generator.generate(&request()).await.unwrap();

    assert_eq!(result.stories.len(), 1);
    assert_eq!(result.stories[0].title, "Password reset");
    assert!(result.stories[0].test_cases.is_none());
    assert_eq!(model.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn always_failing_model_stops_after_three_attempts_with_flat_delays() {
    let model = ScriptedModel::new(vec![Reply::Fail("connection refused".to_string())]);
    let generator = StoryGenerator::new(model.clone());

    let start = tokio::time::Instant::now();
    let err = generator.generate(&request()).await.unwrap_err();

    assert_eq!(model.calls(), MAX_ATTEMPTS);
    assert_eq!(err.attempts, MAX_ATTEMPTS);
    assert!(matches!(err.source, AttemptError::Transport(_)));
    // Two inter-attempt delays of 1000 ms, none after the final attempt.
    assert_eq!(start.elapsed(), Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn recovers_on_third_attempt_without_leaking_earlier_content() {
    let model = ScriptedModel::new(vec![
        Reply::Text("{\"stories\": [{\"title\": \"Leaky\"}]}".to_string()),
        Reply::Fail("rate limited".to_string()),
        Reply::Text(valid_story_payload("Web", "MVP")),
    ]);
    let generator = StoryGenerator::new(model.clone());

    let result = generator.generate(&request()).await.unwrap();

    assert_eq!(model.calls(), 3);
    assert_eq!(result.stories.len(), 1);
    assert_eq!(result.stories[0].title, "Password reset");
}

#[tokio::test(start_paused = true)]
async fn empty_response_consumes_the_shared_budget() {
    let model = ScriptedModel::new(vec![
        Reply::NoContent,
        Reply::Text(valid_story_payload("Web", "MVP")),
    ]);
    let generator = StoryGenerator::new(model.clone());

    let result = generator.generate(&request()).await.unwrap();

    assert_eq!(model.calls(), 2);
    assert_eq!(result.stories.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn parse_failures_share_the_retry_loop_with_transport_failures() {
    let model = ScriptedModel::new(vec![
        Reply::Text("not json at all".to_string()),
        Reply::Fail("gateway timeout".to_string()),
        Reply::Text(valid_story_payload("Web", "MVP")),
    ]);
    let generator = StoryGenerator::new(model.clone());

    let result = generator.generate(&request()).await.unwrap();

    assert_eq!(model.calls(), 3);
    assert_eq!(result.stories.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deterministic_tag_violation_exhausts_all_attempts() {
    // The stub keeps answering with a platform outside the request's set,
    // so every attempt fails validation the same way.
    let model = ScriptedModel::new(vec![Reply::Text(valid_story_payload("Mobile", "MVP"))]);
    let generator = StoryGenerator::new(model.clone());

    let err = generator.generate(&request()).await.unwrap_err();

    assert_eq!(model.calls(), MAX_ATTEMPTS);
    match err.source {
        AttemptError::InvalidResponse(ParseError::TagViolation {
            index,
            field,
            value,
        }) => {
            assert_eq!(index, 0);
            assert_eq!(field, "platform");
            assert_eq!(value, "Mobile");
        }
        other => panic!("expected tag violation cause, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn last_error_is_carried_as_the_terminal_cause() {
    let model = ScriptedModel::new(vec![
        Reply::Fail("connection refused".to_string()),
        Reply::Fail("connection refused".to_string()),
        Reply::NoContent,
    ]);
    let generator = StoryGenerator::new(model.clone());

    let err = generator.generate(&request()).await.unwrap_err();
    assert!(matches!(err.source, AttemptError::EmptyResponse));
}
