//! crates/storygen_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! The generation types double as the wire schema the model is instructed
//! to emit, so they derive serde directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The narrative template a generated story should follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoryStyle {
    Scrum,
    #[serde(rename = "BDD")]
    Bdd,
    Simple,
}

impl StoryStyle {
    /// The template example embedded in the prompt for this style.
    pub fn template(&self) -> &'static str {
        match self {
            StoryStyle::Scrum => "As a [type of user], I want [goal] so that [benefit]",
            StoryStyle::Bdd => "In order to [business value], as a [type of user], I want [goal]",
            StoryStyle::Simple => "I want [goal] so that [benefit]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStyle::Scrum => "Scrum",
            StoryStyle::Bdd => "BDD",
            StoryStyle::Simple => "Simple",
        }
    }
}

/// The format acceptance criteria should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcStyle {
    #[serde(rename = "Given-When-Then")]
    GivenWhenThen,
    Checklist,
}

impl AcStyle {
    /// The template example embedded in the prompt for this format.
    pub fn template(&self) -> &'static str {
        match self {
            AcStyle::GivenWhenThen => "Given [context], When [action], Then [outcome]",
            AcStyle::Checklist => "\u{2022} [criterion]",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AcStyle::GivenWhenThen => "Given-When-Then",
            AcStyle::Checklist => "Checklist",
        }
    }
}

/// A request to turn free-text feature notes into structured user stories.
///
/// Immutable per call; validated once at the boundary with
/// [`GenerationRequest::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub notes: String,
    pub platforms: Vec<String>,
    #[serde(rename = "productPhase")]
    pub product_phases: Vec<String>,
    #[serde(rename = "storyStyle")]
    pub story_style: StoryStyle,
    #[serde(rename = "acStyle")]
    pub ac_style: AcStyle,
    #[serde(rename = "includeTestCases")]
    pub include_test_cases: bool,
}

/// A request-shape violation, reported before any model call is made.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Notes must be at least 10 characters long")]
    NotesTooShort,
    #[error("At least one platform must be selected")]
    NoPlatforms,
    #[error("At least one product phase must be selected")]
    NoProductPhases,
}

impl GenerationRequest {
    /// Checks the request against the minimum shape the generator assumes.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.notes.trim().len() < 10 {
            return Err(RequestError::NotesTooShort);
        }
        if self.platforms.is_empty() {
            return Err(RequestError::NoPlatforms);
        }
        if self.product_phases.is_empty() {
            return Err(RequestError::NoProductPhases);
        }
        Ok(())
    }
}

/// Positive and negative test cases attached to a story when requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCases {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

/// A single validated user story produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedStory {
    pub title: String,
    pub description: String,
    #[serde(rename = "acceptanceCriteria")]
    pub acceptance_criteria: Vec<String>,
    #[serde(rename = "negativeScenarios")]
    pub negative_scenarios: Vec<String>,
    #[serde(rename = "testCases", skip_serializing_if = "Option::is_none")]
    pub test_cases: Option<TestCases>,
    pub platform: String,
    pub phase: String,
}

/// The validated output of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub stories: Vec<GeneratedStory>,
}

/// A story set persisted for a user, as returned by the store.
#[derive(Debug, Clone)]
pub struct StoredStory {
    pub id: i64,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub config: serde_json::Value,
    pub status: String,
    pub story_style: String,
    pub ac_style: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for persisting a new story set.
#[derive(Debug, Clone)]
pub struct NewStory {
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub config: serde_json::Value,
    pub status: Option<String>,
    pub story_style: Option<String>,
    pub ac_style: Option<String>,
}

/// A partial update to a stored story; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct StoryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub config: Option<serde_json::Value>,
    pub status: Option<String>,
    pub story_style: Option<String>,
    pub ac_style: Option<String>,
}

/// Per-owner aggregate counts over stored stories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryStats {
    pub total_stories: i64,
    pub draft_count: i64,
    pub published_count: i64,
    pub archived_count: i64,
}
