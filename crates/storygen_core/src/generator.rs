//! crates/storygen_core/src/generator.rs
//!
//! The generation orchestrator: build prompt -> call model -> parse and
//! validate, wrapped in a single flat retry loop.
//!
//! Transport failures, empty responses, and parse/validation failures all
//! draw from the same attempt budget, and every retry re-sends the identical
//! prompt. A deterministic model that keeps producing the same invalid
//! payload will therefore burn the whole budget; the retries only help
//! against transient transport errors and sampling variance.

use crate::domain::{GenerationRequest, GenerationResult};
use crate::parser::{parse_stories, ParseError};
use crate::ports::{ChatModelService, PortError};
use crate::prompt::{build_prompt, ChatPrompt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Total attempts per `generate` call, shared across failure kinds.
pub const MAX_ATTEMPTS: u32 = 3;

/// Flat delay between attempts. No jitter, no backoff.
pub const RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Why a single attempt failed. Logged per attempt, retried transparently.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("Model call failed: {0}")]
    Transport(#[from] PortError),
    #[error("Model returned no textual content")]
    EmptyResponse,
    #[error(transparent)]
    InvalidResponse(#[from] ParseError),
    #[error("Failed to generate stories after multiple attempts")]
    Exhausted,
}

/// Terminal failure surfaced to the caller once the attempt budget is spent.
/// Carries the last attempt's error as its cause.
#[derive(Debug, thiserror::Error)]
#[error("Story generation failed after {attempts} attempts: {source}")]
pub struct GenerationFailed {
    pub attempts: u32,
    #[source]
    pub source: AttemptError,
}

/// Orchestrates story generation against an injected model client.
///
/// Holds no per-call state; concurrent `generate` calls are independent.
#[derive(Clone)]
pub struct StoryGenerator {
    model: Arc<dyn ChatModelService>,
}

impl StoryGenerator {
    /// Creates a new `StoryGenerator` over a configured model client.
    pub fn new(model: Arc<dyn ChatModelService>) -> Self {
        Self { model }
    }

    /// Runs the full pipeline for one request, retrying up to
    /// [`MAX_ATTEMPTS`] times with a [`RETRY_DELAY`] pause between attempts.
    ///
    /// The request is assumed to be validated by the caller
    /// (`GenerationRequest::validate`).
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationFailed> {
        let prompt = build_prompt(request);
        let mut last_error: Option<AttemptError> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(attempt, max_attempts = MAX_ATTEMPTS, "starting generation attempt");

            match self.attempt(&prompt, request).await {
                Ok(result) => {
                    info!(attempt, stories = result.stories.len(), "story generation succeeded");
                    return Ok(result);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "generation attempt failed");
                    last_error = Some(e);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }

        Err(GenerationFailed {
            attempts: MAX_ATTEMPTS,
            source: last_error.unwrap_or(AttemptError::Exhausted),
        })
    }

    async fn attempt(
        &self,
        prompt: &ChatPrompt,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, AttemptError> {
        let reply = self
            .model
            .complete(&prompt.system_message, &prompt.user_message)
            .await?;
        let text = reply.ok_or(AttemptError::EmptyResponse)?;
        Ok(parse_stories(&text, request)?)
    }
}
