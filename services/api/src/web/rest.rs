//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Failures are logged with full detail server-side; response bodies carry
//! only generic messages so internal error text never reaches the end user.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storygen_core::domain::{
    AcStyle, GenerationRequest, GenerationResult, NewStory, StoredStory, StoryPatch, StoryStyle,
};
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_stories_handler,
        list_stories_handler,
        create_story_handler,
        search_stories_handler,
        story_stats_handler,
        get_story_handler,
        update_story_handler,
        delete_story_handler,
    ),
    components(
        schemas(
            GenerateStoriesPayload,
            GenerateStoriesResponse,
            CreateStoryPayload,
            UpdateStoryPayload,
            StoryResponse,
            StatsResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "Story Generator API", description = "API endpoints for generating and managing user stories.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The uniform error envelope returned on every failed request.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    success: bool,
    message: String,
}

/// The request payload for the story generation endpoint.
#[derive(Deserialize, ToSchema)]
pub struct GenerateStoriesPayload {
    notes: String,
    platforms: Vec<String>,
    #[serde(rename = "productPhase")]
    product_phase: Vec<String>,
    #[serde(rename = "storyStyle")]
    story_style: String,
    #[serde(rename = "acStyle")]
    ac_style: String,
    #[serde(rename = "includeTestCases")]
    include_test_cases: Option<bool>,
}

/// The response payload sent after a successful generation.
#[derive(Serialize, ToSchema)]
pub struct GenerateStoriesResponse {
    success: bool,
    message: String,
    #[schema(value_type = Object)]
    data: GenerationResult,
}

/// The request payload for persisting a story set.
#[derive(Deserialize, ToSchema)]
pub struct CreateStoryPayload {
    title: String,
    content: String,
    #[schema(value_type = Option<Object>)]
    config: Option<serde_json::Value>,
    status: Option<String>,
    story_style: Option<String>,
    ac_style: Option<String>,
}

/// A partial update to a stored story; omitted fields are left untouched.
#[derive(Deserialize, ToSchema)]
pub struct UpdateStoryPayload {
    title: Option<String>,
    content: Option<String>,
    #[schema(value_type = Option<Object>)]
    config: Option<serde_json::Value>,
    status: Option<String>,
    story_style: Option<String>,
    ac_style: Option<String>,
}

/// A stored story as returned by the API.
#[derive(Serialize, ToSchema)]
pub struct StoryResponse {
    id: i64,
    user_id: String,
    title: String,
    content: String,
    #[schema(value_type = Object)]
    config: serde_json::Value,
    status: String,
    story_style: String,
    ac_style: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<StoredStory> for StoryResponse {
    fn from(story: StoredStory) -> Self {
        Self {
            id: story.id,
            user_id: story.owner_id,
            title: story.title,
            content: story.content,
            config: story.config,
            status: story.status,
            story_style: story.story_style,
            ac_style: story.ac_style,
            created_at: story.created_at,
            updated_at: story.updated_at,
        }
    }
}

/// Per-user aggregate counts over stored stories.
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    total_stories: i64,
    draft_count: i64,
    published_count: i64,
    archived_count: i64,
}

/// Query parameters for the story search endpoint.
#[derive(Deserialize, IntoParams)]
pub struct SearchQuery {
    term: String,
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn failure(status: StatusCode, message: &str) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            success: false,
            message: message.to_string(),
        }),
    )
}

fn bad_request(message: &str) -> HandlerError {
    failure(StatusCode::BAD_REQUEST, message)
}

/// Extracts the owner's ID from the `x-user-id` header.
fn owner_id(headers: &HeaderMap) -> Result<String, HandlerError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .ok_or_else(|| bad_request("User ID is required"))
}

//=========================================================================================
// Generation Handler
//=========================================================================================

/// Generate user stories from free-text feature notes.
///
/// Builds a prompt from the request, calls the configured model with retries,
/// and returns the validated story set. Terminal generation failures map to a
/// generic 500; the underlying cause is logged server-side only.
#[utoipa::path(
    post,
    path = "/generate-stories",
    request_body = GenerateStoriesPayload,
    responses(
        (status = 200, description = "Stories generated successfully", body = GenerateStoriesResponse),
        (status = 400, description = "Malformed or incomplete request", body = ErrorResponse),
        (status = 500, description = "Generation failed after exhausting retries", body = ErrorResponse)
    )
)]
pub async fn generate_stories_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<GenerateStoriesPayload>,
) -> Result<impl IntoResponse, HandlerError> {
    let story_style = match payload.story_style.as_str() {
        "Scrum" => StoryStyle::Scrum,
        "BDD" => StoryStyle::Bdd,
        "Simple" => StoryStyle::Simple,
        _ => {
            return Err(bad_request(
                "Invalid story style. Must be one of: Scrum, BDD, Simple",
            ))
        }
    };
    let ac_style = match payload.ac_style.as_str() {
        "Given-When-Then" => AcStyle::GivenWhenThen,
        "Checklist" => AcStyle::Checklist,
        _ => {
            return Err(bad_request(
                "Invalid AC style. Must be one of: Given-When-Then, Checklist",
            ))
        }
    };

    let request = GenerationRequest {
        notes: payload.notes,
        platforms: payload.platforms,
        product_phases: payload.product_phase,
        story_style,
        ac_style,
        include_test_cases: payload.include_test_cases.unwrap_or(true),
    };
    if let Err(e) = request.validate() {
        return Err(bad_request(&e.to_string()));
    }

    match app_state.generator.generate(&request).await {
        Ok(result) => Ok(Json(GenerateStoriesResponse {
            success: true,
            message: "Stories generated successfully".to_string(),
            data: result,
        })),
        Err(e) => {
            error!(error = %e, "Story generation failed");
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate stories. Please try again later.",
            ))
        }
    }
}

//=========================================================================================
// Story CRUD Handlers
//=========================================================================================

/// List all stories belonging to the requesting user, newest first.
#[utoipa::path(
    get,
    path = "/stories",
    responses(
        (status = 200, description = "Stories fetched successfully", body = [StoryResponse]),
        (status = 400, description = "Missing user ID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_stories_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let owner = owner_id(&headers)?;
    match app_state.store.list_stories(&owner).await {
        Ok(stories) => Ok(Json(
            stories
                .into_iter()
                .map(StoryResponse::from)
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            error!(error = %e, "Failed to list stories");
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get stories",
            ))
        }
    }
}

/// Persist a generated story set.
#[utoipa::path(
    post,
    path = "/stories",
    request_body = CreateStoryPayload,
    responses(
        (status = 201, description = "Story created successfully", body = StoryResponse),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_story_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateStoryPayload>,
) -> Result<impl IntoResponse, HandlerError> {
    let owner = owner_id(&headers)?;
    if payload.title.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(bad_request("Missing required fields"));
    }

    let story = NewStory {
        owner_id: owner,
        title: payload.title,
        content: payload.content,
        config: payload.config.unwrap_or_else(|| serde_json::json!({})),
        status: payload.status,
        story_style: payload.story_style,
        ac_style: payload.ac_style,
    };

    match app_state.store.save_story(story).await {
        Ok(stored) => Ok((StatusCode::CREATED, Json(StoryResponse::from(stored)))),
        Err(e) => {
            error!(error = %e, "Failed to create story");
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create story",
            ))
        }
    }
}

/// Search the user's stories by a case-insensitive term over title and content.
#[utoipa::path(
    get,
    path = "/stories/search",
    params(
        SearchQuery,
        ("x-user-id" = String, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Search completed", body = [StoryResponse]),
        (status = 400, description = "Missing user ID or search term", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn search_stories_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let owner = owner_id(&headers)?;
    if query.term.trim().is_empty() {
        return Err(bad_request("User ID and search term are required"));
    }
    match app_state.store.search_stories(&owner, &query.term).await {
        Ok(stories) => Ok(Json(
            stories
                .into_iter()
                .map(StoryResponse::from)
                .collect::<Vec<_>>(),
        )),
        Err(e) => {
            error!(error = %e, "Failed to search stories");
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to search stories",
            ))
        }
    }
}

/// Aggregate story counts for the requesting user, bucketed by status.
#[utoipa::path(
    get,
    path = "/stories/stats",
    responses(
        (status = 200, description = "Statistics fetched successfully", body = StatsResponse),
        (status = 400, description = "Missing user ID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("x-user-id" = String, Header, description = "The unique ID of the user.")
    )
)]
pub async fn story_stats_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let owner = owner_id(&headers)?;
    match app_state.store.story_stats(&owner).await {
        Ok(stats) => Ok(Json(StatsResponse {
            total_stories: stats.total_stories,
            draft_count: stats.draft_count,
            published_count: stats.published_count,
            archived_count: stats.archived_count,
        })),
        Err(e) => {
            error!(error = %e, "Failed to get story stats");
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get story statistics",
            ))
        }
    }
}

/// Fetch a single story by ID.
#[utoipa::path(
    get,
    path = "/stories/{id}",
    params(
        ("id" = i64, Path, description = "The story's ID."),
        ("x-user-id" = String, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Story fetched successfully", body = StoryResponse),
        (status = 404, description = "Story not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_story_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let owner = owner_id(&headers)?;
    match app_state.store.get_story(id, &owner).await {
        Ok(Some(story)) => Ok(Json(StoryResponse::from(story))),
        Ok(None) => Err(failure(StatusCode::NOT_FOUND, "Story not found")),
        Err(e) => {
            error!(error = %e, story_id = id, "Failed to get story");
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get story",
            ))
        }
    }
}

/// Update a stored story. Only the provided fields are changed.
#[utoipa::path(
    put,
    path = "/stories/{id}",
    request_body = UpdateStoryPayload,
    params(
        ("id" = i64, Path, description = "The story's ID."),
        ("x-user-id" = String, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 200, description = "Story updated successfully", body = StoryResponse),
        (status = 404, description = "Story not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn update_story_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<UpdateStoryPayload>,
) -> Result<impl IntoResponse, HandlerError> {
    let owner = owner_id(&headers)?;
    let patch = StoryPatch {
        title: payload.title,
        content: payload.content,
        config: payload.config,
        status: payload.status,
        story_style: payload.story_style,
        ac_style: payload.ac_style,
    };
    match app_state.store.update_story(id, &owner, patch).await {
        Ok(Some(story)) => Ok(Json(StoryResponse::from(story))),
        Ok(None) => Err(failure(StatusCode::NOT_FOUND, "Story not found")),
        Err(e) => {
            error!(error = %e, story_id = id, "Failed to update story");
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update story",
            ))
        }
    }
}

/// Delete a stored story.
#[utoipa::path(
    delete,
    path = "/stories/{id}",
    params(
        ("id" = i64, Path, description = "The story's ID."),
        ("x-user-id" = String, Header, description = "The unique ID of the user.")
    ),
    responses(
        (status = 204, description = "Story deleted successfully"),
        (status = 404, description = "Story not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn delete_story_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let owner = owner_id(&headers)?;
    match app_state.store.delete_story(id, &owner).await {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(failure(StatusCode::NOT_FOUND, "Story not found")),
        Err(e) => {
            error!(error = %e, story_id = id, "Failed to delete story");
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete story",
            ))
        }
    }
}
