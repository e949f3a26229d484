use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::User;
use crate::error::DomainError;

/// Maximum accepted title length, in characters.
pub const TITLE_MAX_LEN: usize = 100;
/// Minimum accepted content length, in characters.
pub const CONTENT_MIN_LEN: usize = 10;

/// Post entity - a text post with display tags, owned by exactly one author.
///
/// `author_id` is immutable after creation. The `views` and `likes` counters
/// are persisted and displayed but no operation increments them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub views: i32,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post after validating the field constraints.
    pub fn new(
        author_id: Uuid,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Result<Self, DomainError> {
        Self::validate(&title, &content)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            tags,
            views: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the editable fields and refresh `updated_at`.
    pub fn apply_edit(
        &mut self,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Result<(), DomainError> {
        Self::validate(&title, &content)?;
        self.title = title;
        self.content = content;
        self.tags = tags;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Author-only mutation check.
    pub fn ensure_author(&self, user_id: Uuid, action: &str) -> Result<(), DomainError> {
        if self.author_id != user_id {
            return Err(DomainError::Forbidden(format!(
                "Not authorized to {action} this post"
            )));
        }
        Ok(())
    }

    fn validate(title: &str, content: &str) -> Result<(), DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::Validation("Title is required".to_string()));
        }
        if title.chars().count() > TITLE_MAX_LEN {
            return Err(DomainError::Validation(format!(
                "Title must be at most {TITLE_MAX_LEN} characters"
            )));
        }
        if content.trim().chars().count() < CONTENT_MIN_LEN {
            return Err(DomainError::Validation(format!(
                "Content must be at least {CONTENT_MIN_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// A post together with its (possibly vanished) author record.
#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Option<User>,
}

/// Listing filter: substring search over title/content plus an exact tag match.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub search: Option<String>,
    pub tag: Option<String>,
}

/// One page of a filtered, newest-first listing.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<PostWithAuthor>,
    pub total_posts: u64,
    pub total_pages: u64,
}
