//! crates/storygen_core/src/parser.rs
//!
//! Turns raw model output into a validated [`GenerationResult`].
//!
//! Validation is all-or-nothing per response: the first malformed story or
//! out-of-set tag rejects the whole payload, because a partially-correct
//! story set must not be presented as a coherent answer.

use crate::domain::{GeneratedStory, GenerationRequest, GenerationResult};
use regex::Regex;

/// Why a model response was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse model response as JSON: {0}")]
    MalformedJson(String),
    #[error("Invalid response structure: {detail}")]
    SchemaViolation {
        /// Index of the offending story, if the violation is story-level.
        index: Option<usize>,
        detail: String,
    },
    #[error("Invalid {field} \"{value}\" in story at index {index}")]
    TagViolation {
        index: usize,
        field: &'static str,
        value: String,
    },
}

impl ParseError {
    fn story(index: usize, detail: impl Into<String>) -> Self {
        ParseError::SchemaViolation {
            index: Some(index),
            detail: detail.into(),
        }
    }

    fn shape(detail: impl Into<String>) -> Self {
        ParseError::SchemaViolation {
            index: None,
            detail: detail.into(),
        }
    }
}

/// Removes markdown code-fence markers the model may wrap the payload in.
/// Applying it to unfenced content is a no-op.
pub fn strip_code_fences(raw: &str) -> String {
    let fence = Regex::new(r"```json\n?|\n?```").unwrap();
    fence.replace_all(raw, "").trim().to_string()
}

/// Parses and validates one raw model response against the originating request.
pub fn parse_stories(
    raw: &str,
    request: &GenerationRequest,
) -> Result<GenerationResult, ParseError> {
    let cleaned = strip_code_fences(raw);

    let value: serde_json::Value = serde_json::from_str(&cleaned)
        .map_err(|e| ParseError::MalformedJson(e.to_string()))?;

    let entries = value
        .get("stories")
        .and_then(|s| s.as_array())
        .ok_or_else(|| ParseError::shape("missing \"stories\" array"))?;
    if entries.is_empty() {
        return Err(ParseError::shape("\"stories\" array is empty"));
    }

    let mut stories = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let mut story: GeneratedStory = serde_json::from_value(entry.clone())
            .map_err(|e| ParseError::story(index, e.to_string()))?;

        if story.title.trim().is_empty() {
            return Err(ParseError::story(index, "title is empty"));
        }
        if story.description.trim().is_empty() {
            return Err(ParseError::story(index, "description is empty"));
        }
        if story.acceptance_criteria.is_empty() {
            return Err(ParseError::story(index, "acceptance criteria are missing"));
        }
        if story.negative_scenarios.is_empty() {
            return Err(ParseError::story(index, "negative scenarios are missing"));
        }

        if request.include_test_cases {
            match &story.test_cases {
                Some(cases) if !cases.positive.is_empty() && !cases.negative.is_empty() => {}
                Some(_) => {
                    return Err(ParseError::story(index, "test cases are incomplete"));
                }
                None => {
                    return Err(ParseError::story(index, "test cases are missing"));
                }
            }
        } else {
            // Test cases were not asked for; drop any the model volunteered.
            story.test_cases = None;
        }

        if !request.platforms.contains(&story.platform) {
            return Err(ParseError::TagViolation {
                index,
                field: "platform",
                value: story.platform.clone(),
            });
        }
        if !request.product_phases.contains(&story.phase) {
            return Err(ParseError::TagViolation {
                index,
                field: "phase",
                value: story.phase.clone(),
            });
        }

        stories.push(story);
    }

    Ok(GenerationResult { stories })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AcStyle, StoryStyle};

    fn request(include_test_cases: bool) -> GenerationRequest {
        GenerationRequest {
            notes: "Users need to reset passwords".to_string(),
            platforms: vec!["Web".to_string()],
            product_phases: vec!["MVP".to_string()],
            story_style: StoryStyle::Scrum,
            ac_style: AcStyle::GivenWhenThen,
            include_test_cases,
        }
    }

    fn story_json() -> serde_json::Value {
        serde_json::json!({
            "title": "Password reset",
            "description": "As a user, I want to reset my password so that I can regain access.",
            "acceptanceCriteria": ["Given a registered email, When I request a reset, Then I receive a link"],
            "negativeScenarios": ["Reset link has expired"],
            "platform": "Web",
            "phase": "MVP"
        })
    }

    fn payload(story: serde_json::Value) -> String {
        serde_json::json!({ "stories": [story] }).to_string()
    }

    #[test]
    fn well_formed_response_parses() {
        let result = parse_stories(&payload(story_json()), &request(false)).unwrap();
        assert_eq!(result.stories.len(), 1);
        assert_eq!(result.stories[0].title, "Password reset");
        assert!(result.stories[0].test_cases.is_none());
    }

    #[test]
    fn fenced_response_parses_identically() {
        let plain = payload(story_json());
        let fenced = format!("```json\n{}\n```", plain);
        let req = request(false);
        assert_eq!(
            parse_stories(&fenced, &req).unwrap(),
            parse_stories(&plain, &req).unwrap()
        );
    }

    #[test]
    fn bare_fences_are_stripped_too() {
        let fenced = format!("```\n{}\n```", payload(story_json()));
        assert!(parse_stories(&fenced, &request(false)).is_ok());
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_stories("here are your stories!", &request(false)).unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson(_)));
    }

    #[test]
    fn missing_stories_array_is_a_shape_violation() {
        let err = parse_stories(r#"{"story": []}"#, &request(false)).unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation { index: None, .. }
        ));
    }

    #[test]
    fn empty_stories_array_is_rejected() {
        let err = parse_stories(r#"{"stories": []}"#, &request(false)).unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation { index: None, .. }
        ));
    }

    #[test]
    fn story_missing_negative_scenarios_is_rejected() {
        let mut story = story_json();
        story.as_object_mut().unwrap().remove("negativeScenarios");
        let err = parse_stories(&payload(story), &request(false)).unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation { index: Some(0), .. }
        ));
    }

    #[test]
    fn empty_acceptance_criteria_are_rejected() {
        let mut story = story_json();
        story["acceptanceCriteria"] = serde_json::json!([]);
        let err = parse_stories(&payload(story), &request(false)).unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation { index: Some(0), .. }
        ));
    }

    #[test]
    fn out_of_set_platform_is_a_tag_violation() {
        let mut story = story_json();
        story["platform"] = serde_json::json!("Mobile");
        let err = parse_stories(&payload(story), &request(false)).unwrap_err();
        match err {
            ParseError::TagViolation {
                index,
                field,
                value,
            } => {
                assert_eq!(index, 0);
                assert_eq!(field, "platform");
                assert_eq!(value, "Mobile");
            }
            other => panic!("expected tag violation, got {other:?}"),
        }
    }

    #[test]
    fn out_of_set_phase_is_a_tag_violation() {
        let mut story = story_json();
        story["phase"] = serde_json::json!("GA");
        let err = parse_stories(&payload(story), &request(false)).unwrap_err();
        assert!(matches!(
            err,
            ParseError::TagViolation { field: "phase", .. }
        ));
    }

    #[test]
    fn requested_test_cases_must_be_present_and_non_empty() {
        let req = request(true);

        let err = parse_stories(&payload(story_json()), &req).unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation { index: Some(0), .. }
        ));

        let mut story = story_json();
        story["testCases"] = serde_json::json!({ "positive": ["ok"], "negative": [] });
        let err = parse_stories(&payload(story), &req).unwrap_err();
        assert!(matches!(
            err,
            ParseError::SchemaViolation { index: Some(0), .. }
        ));

        let mut story = story_json();
        story["testCases"] =
            serde_json::json!({ "positive": ["reset works"], "negative": ["bad token fails"] });
        let result = parse_stories(&payload(story), &req).unwrap();
        let cases = result.stories[0].test_cases.as_ref().unwrap();
        assert_eq!(cases.positive, vec!["reset works"]);
    }

    #[test]
    fn unrequested_test_cases_are_dropped() {
        let mut story = story_json();
        story["testCases"] =
            serde_json::json!({ "positive": ["reset works"], "negative": ["bad token fails"] });
        let result = parse_stories(&payload(story), &request(false)).unwrap();
        assert!(result.stories[0].test_cases.is_none());
    }

    #[test]
    fn second_story_violation_names_its_index() {
        let mut bad = story_json();
        bad["platform"] = serde_json::json!("Desktop");
        let payload = serde_json::json!({ "stories": [story_json(), bad] }).to_string();
        let err = parse_stories(&payload, &request(false)).unwrap_err();
        assert!(matches!(err, ParseError::TagViolation { index: 1, .. }));
    }
}
