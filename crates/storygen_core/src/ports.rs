//! crates/storygen_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{NewStory, StoredStory, StoryPatch, StoryStats};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The text-generation model behind story generation.
///
/// Implementations send one system message and one user message and hand back
/// whatever text the model produced. `Ok(None)` means the call itself
/// succeeded but carried no textual content; the generator treats that as an
/// attempt failure.
#[async_trait]
pub trait ChatModelService: Send + Sync {
    async fn complete(&self, system_message: &str, user_message: &str)
        -> PortResult<Option<String>>;
}

/// Owner-scoped persistence for generated story sets.
///
/// Everything here is conventional CRUD; the generator itself never touches
/// the store, callers persist results after a successful generation.
#[async_trait]
pub trait StoryStoreService: Send + Sync {
    async fn save_story(&self, story: NewStory) -> PortResult<StoredStory>;

    async fn get_story(&self, id: i64, owner_id: &str) -> PortResult<Option<StoredStory>>;

    async fn list_stories(&self, owner_id: &str) -> PortResult<Vec<StoredStory>>;

    async fn update_story(
        &self,
        id: i64,
        owner_id: &str,
        patch: StoryPatch,
    ) -> PortResult<Option<StoredStory>>;

    /// Returns `true` if a row was deleted, `false` if nothing matched.
    async fn delete_story(&self, id: i64, owner_id: &str) -> PortResult<bool>;

    /// Case-insensitive substring search over title and content.
    async fn search_stories(&self, owner_id: &str, term: &str) -> PortResult<Vec<StoredStory>>;

    async fn story_stats(&self, owner_id: &str) -> PortResult<StoryStats>;
}
