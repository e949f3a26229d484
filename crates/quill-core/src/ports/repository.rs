use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, PostFilter, PostPage, PostWithAuthor, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Persist changes to an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with the lookups the auth flow needs.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Fetch a post together with its author record.
    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError>;

    /// Newest-first page of posts matching the filter, authors populated.
    ///
    /// `page` is 1-indexed. `per_page` carries no enforced upper bound.
    async fn find_page(
        &self,
        filter: &PostFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PostPage, RepoError>;
}
