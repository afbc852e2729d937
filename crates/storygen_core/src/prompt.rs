//! crates/storygen_core/src/prompt.rs
//!
//! Builds the chat prompt for story generation. Pure string assembly: the
//! request is assumed to be validated already, so nothing here can fail.

use crate::domain::GenerationRequest;

/// The system and user messages sent to the model for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system_message: String,
    pub user_message: String,
}

/// Assembles the full instruction for a generation request.
///
/// The user message spells out the story and acceptance-criteria templates,
/// the per platform/phase expectations, and the exact JSON shape the parser
/// accepts, and ends by telling the model to return only that JSON object.
pub fn build_prompt(request: &GenerationRequest) -> ChatPrompt {
    let platforms = request.platforms.join(", ");
    let phases = request.product_phases.join(", ");

    let test_case_item = if request.include_test_cases {
        "\n5. Test cases:\n   - Positive test cases (2-3 items)\n   - Negative test cases (2-3 items)"
    } else {
        ""
    };

    // The middle guidelines shift down by one when the test-case guideline
    // is present, so the whole block is selected as a unit.
    let middle_guidelines = if request.include_test_cases {
        "\n4. Test cases should be detailed and cover both happy path and error scenarios\
         \n5. Use active voice and present tense\
         \n6. Focus on business value and user needs\
         \n7. Break down complex features into smaller, manageable stories"
    } else {
        "\n4. Use active voice and present tense\
         \n5. Focus on business value and user needs\
         \n6. Break down complex features into smaller, manageable stories"
    };

    let test_case_schema = if request.include_test_cases {
        ",\n      \"testCases\": {\n        \"positive\": [\"string\"],\n        \"negative\": [\"string\"]\n      }"
    } else {
        ""
    };

    let user_message = format!(
        r#"Based on the following feature notes, generate user stories for each platform ({platforms}) and phase ({phases}).

Feature Notes:
{notes}

For each platform and phase combination, generate user stories in {story_style} format using this template:
{story_template}

And acceptance criteria in {ac_style} format using this template:
{ac_template}

For each user story, include:
1. A clear title
2. A detailed description
3. Acceptance criteria (3-5 items)
4. Negative scenarios (2-3 items){test_case_item}
6. Platform tag ({platforms})
7. Phase tag ({phases})

Guidelines:
1. Each user story should be clear, concise, and focused on a single feature
2. Acceptance criteria should be specific, measurable, and testable
3. Negative scenarios should cover edge cases and error conditions{middle_guidelines}
8. Consider platform-specific requirements and constraints
9. Adapt the story to the specific phase

Format the response as a JSON object with the following structure:
{{
  "stories": [
    {{
      "title": "string",
      "description": "string",
      "acceptanceCriteria": ["string"],
      "negativeScenarios": ["string"]{test_case_schema},
      "platform": "string",
      "phase": "string"
    }}
  ]
}}

Only return the JSON object, no additional text."#,
        platforms = platforms,
        phases = phases,
        notes = request.notes,
        story_style = request.story_style.as_str(),
        story_template = request.story_style.template(),
        ac_style = request.ac_style.as_str(),
        ac_template = request.ac_style.template(),
        test_case_item = test_case_item,
        middle_guidelines = middle_guidelines,
        test_case_schema = test_case_schema,
    );

    let test_case_persona = if request.include_test_cases {
        ", and test cases"
    } else {
        ""
    };

    let system_message = format!(
        "You are an expert Agile Product Owner and QA Engineer who generates comprehensive \
         user stories, acceptance criteria, negative scenarios{test_case_persona}. You are \
         precise, clear, and follow best practices in Agile requirements engineering and \
         software testing. You understand platform-specific requirements and can adapt \
         stories to different phases of product development."
    );

    ChatPrompt {
        system_message,
        user_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AcStyle, GenerationRequest, StoryStyle};

    fn request(include_test_cases: bool) -> GenerationRequest {
        GenerationRequest {
            notes: "Users need to reset passwords".to_string(),
            platforms: vec!["Web".to_string(), "Mobile".to_string()],
            product_phases: vec!["MVP".to_string()],
            story_style: StoryStyle::Scrum,
            ac_style: AcStyle::GivenWhenThen,
            include_test_cases,
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let req = request(false);
        assert_eq!(build_prompt(&req), build_prompt(&req));
    }

    #[test]
    fn prompt_carries_notes_templates_and_tags() {
        let prompt = build_prompt(&request(false));
        assert!(prompt.user_message.contains("Users need to reset passwords"));
        assert!(prompt
            .user_message
            .contains("As a [type of user], I want [goal] so that [benefit]"));
        assert!(prompt
            .user_message
            .contains("Given [context], When [action], Then [outcome]"));
        assert!(prompt.user_message.contains("Web, Mobile"));
        assert!(prompt.user_message.contains("MVP"));
        assert!(prompt
            .user_message
            .contains("Only return the JSON object, no additional text."));
    }

    #[test]
    fn test_case_sections_appear_only_when_requested() {
        let without = build_prompt(&request(false));
        assert!(!without.user_message.contains("testCases"));
        assert!(!without.system_message.contains("test cases"));

        let with = build_prompt(&request(true));
        assert!(with.user_message.contains("Positive test cases (2-3 items)"));
        assert!(with.user_message.contains("\"testCases\""));
        assert!(with.system_message.contains("test cases"));
    }

    #[test]
    fn bdd_and_checklist_templates_are_used() {
        let mut req = request(false);
        req.story_style = StoryStyle::Bdd;
        req.ac_style = AcStyle::Checklist;
        let prompt = build_prompt(&req);
        assert!(prompt
            .user_message
            .contains("In order to [business value], as a [type of user], I want [goal]"));
        assert!(prompt.user_message.contains("\u{2022} [criterion]"));
    }
}
