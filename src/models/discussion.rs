// src/models/discussion.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'discussions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Discussion {
    pub id: i64,
    pub course_id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Discussion joined with its author name for listings.
#[derive(Debug, Serialize, FromRow)]
pub struct DiscussionWithAuthor {
    pub id: i64,
    pub course_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub reply_count: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'discussion_replies' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DiscussionReply {
    pub id: i64,
    pub discussion_id: i64,
    pub author_id: i64,
    pub content: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for opening a discussion thread.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiscussionRequest {
    pub course_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

/// DTO for replying to a discussion.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}
