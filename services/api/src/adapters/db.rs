//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StoryStoreService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use storygen_core::domain::{NewStory, StoredStory, StoryPatch, StoryStats};
use storygen_core::ports::{PortError, PortResult, StoryStoreService};

const STORY_COLUMNS: &str =
    "id, user_id, title, content, config, status, story_style, ac_style, created_at, updated_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StoryStoreService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StoryRecord {
    id: i64,
    user_id: String,
    title: String,
    content: String,
    config: serde_json::Value,
    status: String,
    story_style: String,
    ac_style: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl StoryRecord {
    fn to_domain(self) -> StoredStory {
        StoredStory {
            id: self.id,
            owner_id: self.user_id,
            title: self.title,
            content: self.content,
            config: self.config,
            status: self.status,
            story_style: self.story_style,
            ac_style: self.ac_style,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct StatsRecord {
    total_stories: i64,
    draft_count: i64,
    published_count: i64,
    archived_count: i64,
}
impl StatsRecord {
    fn to_domain(self) -> StoryStats {
        StoryStats {
            total_stories: self.total_stories,
            draft_count: self.draft_count,
            published_count: self.published_count,
            archived_count: self.archived_count,
        }
    }
}

//=========================================================================================
// `StoryStoreService` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoryStoreService for DbAdapter {
    async fn save_story(&self, story: NewStory) -> PortResult<StoredStory> {
        let sql = format!(
            "INSERT INTO stories (user_id, title, content, config, status, story_style, ac_style) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {STORY_COLUMNS}"
        );
        let record = sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(&story.owner_id)
            .bind(&story.title)
            .bind(&story.content)
            .bind(&story.config)
            .bind(story.status.as_deref().unwrap_or("draft"))
            .bind(story.story_style.as_deref().unwrap_or("Scrum"))
            .bind(story.ac_style.as_deref().unwrap_or("Given-When-Then"))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_story(&self, id: i64, owner_id: &str) -> PortResult<Option<StoredStory>> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 AND user_id = $2");
        let record = sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(StoryRecord::to_domain))
    }

    async fn list_stories(&self, owner_id: &str) -> PortResult<Vec<StoredStory>> {
        let sql = format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let records = sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(StoryRecord::to_domain).collect())
    }

    async fn update_story(
        &self,
        id: i64,
        owner_id: &str,
        patch: StoryPatch,
    ) -> PortResult<Option<StoredStory>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE stories SET updated_at = CURRENT_TIMESTAMP");
        if let Some(title) = &patch.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(content) = &patch.content {
            builder.push(", content = ").push_bind(content);
        }
        if let Some(config) = &patch.config {
            builder.push(", config = ").push_bind(config);
        }
        if let Some(status) = &patch.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(story_style) = &patch.story_style {
            builder.push(", story_style = ").push_bind(story_style);
        }
        if let Some(ac_style) = &patch.ac_style {
            builder.push(", ac_style = ").push_bind(ac_style);
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.push(" AND user_id = ").push_bind(owner_id);
        builder.push(" RETURNING ");
        builder.push(STORY_COLUMNS);

        let record = builder
            .build_query_as::<StoryRecord>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.map(StoryRecord::to_domain))
    }

    async fn delete_story(&self, id: i64, owner_id: &str) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn search_stories(&self, owner_id: &str, term: &str) -> PortResult<Vec<StoredStory>> {
        let sql = format!(
            "SELECT {STORY_COLUMNS} FROM stories \
             WHERE user_id = $1 AND (title ILIKE $2 OR content ILIKE $2) \
             ORDER BY created_at DESC"
        );
        let pattern = format!("%{}%", term);
        let records = sqlx::query_as::<_, StoryRecord>(&sql)
            .bind(owner_id)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(StoryRecord::to_domain).collect())
    }

    async fn story_stats(&self, owner_id: &str) -> PortResult<StoryStats> {
        let record = sqlx::query_as::<_, StatsRecord>(
            "SELECT \
               COUNT(*) AS total_stories, \
               COUNT(CASE WHEN status = 'draft' THEN 1 END) AS draft_count, \
               COUNT(CASE WHEN status = 'published' THEN 1 END) AS published_count, \
               COUNT(CASE WHEN status = 'archived' THEN 1 END) AS archived_count \
             FROM stories WHERE user_id = $1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }
}
