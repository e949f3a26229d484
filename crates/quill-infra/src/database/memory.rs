//! In-memory repositories using HashMaps behind async RwLocks.
//!
//! Used when no database is configured and by handler-level tests.
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, PostFilter, PostPage, PostWithAuthor, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

/// Shared backing maps for the in-memory repositories.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// In-memory user repository.
pub struct InMemoryUserRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryUserRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.store.users.write().await;
        // Mirror the unique constraints the database schema enforces.
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(RepoError::Constraint(
                "username or email already exists".to_string(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.store.users.write().await;
        if !users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .store
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .store
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

/// In-memory post repository.
pub struct InMemoryPostRepository {
    store: Arc<InMemoryStore>,
}

impl InMemoryPostRepository {
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self { store }
    }
}

fn matches(post: &Post, filter: &PostFilter) -> bool {
    if let Some(search) = filter.search.as_deref() {
        let needle = search.to_lowercase();
        if !post.title.to_lowercase().contains(&needle)
            && !post.content.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    if let Some(tag) = filter.tag.as_deref() {
        if !post.tags.iter().any(|t| t == tag) {
            return false;
        }
    }
    true
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.store.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("post id already exists".to_string()));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.store.posts.write().await;
        if !posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let post = match self.store.posts.read().await.get(&id) {
            Some(post) => post.clone(),
            None => return Ok(None),
        };
        let author = self.store.users.read().await.get(&post.author_id).cloned();
        Ok(Some(PostWithAuthor { post, author }))
    }

    async fn find_page(
        &self,
        filter: &PostFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PostPage, RepoError> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let mut matching: Vec<Post> = self
            .store
            .posts
            .read()
            .await
            .values()
            .filter(|p| matches(p, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total_posts = matching.len() as u64;
        let total_pages = total_posts.div_ceil(per_page);

        let users = self.store.users.read().await;
        let posts = matching
            .into_iter()
            .skip(((page - 1) * per_page) as usize)
            .take(per_page as usize)
            .map(|post| {
                let author = users.get(&post.author_id).cloned();
                PostWithAuthor { post, author }
            })
            .collect();

        Ok(PostPage {
            posts,
            total_posts,
            total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn repos() -> (Arc<InMemoryStore>, InMemoryUserRepository, InMemoryPostRepository) {
        let store = Arc::new(InMemoryStore::new());
        (
            store.clone(),
            InMemoryUserRepository::new(store.clone()),
            InMemoryPostRepository::new(store),
        )
    }

    fn post_at(author_id: Uuid, title: &str, content: &str, tags: &[&str], offset: i64) -> Post {
        let mut post = Post::new(
            author_id,
            title.to_string(),
            content.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        )
        .unwrap();
        // Pin timestamps so ordering assertions are deterministic.
        post.created_at += TimeDelta::seconds(offset);
        post.updated_at = post.created_at;
        post
    }

    #[tokio::test]
    async fn duplicate_email_is_a_constraint_violation() {
        let (_, users, _) = repos();

        users
            .insert(User::new(
                "amy".to_string(),
                "a@x.com".to_string(),
                "hash".to_string(),
            ))
            .await
            .unwrap();

        let err = users
            .insert(User::new(
                "someone-else".to_string(),
                "a@x.com".to_string(),
                "hash".to_string(),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn page_two_of_seven_posts_has_two_entries() {
        let (_, users, posts) = repos();
        let author = User::new("amy".to_string(), "a@x.com".to_string(), "hash".to_string());
        users.insert(author.clone()).await.unwrap();

        for i in 0..7 {
            posts
                .insert(post_at(
                    author.id,
                    &format!("Post {i}"),
                    "some post content",
                    &[],
                    i,
                ))
                .await
                .unwrap();
        }

        let page = posts
            .find_page(&PostFilter::default(), 2, 5)
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.total_posts, 7);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let (_, users, posts) = repos();
        let author = User::new("amy".to_string(), "a@x.com".to_string(), "hash".to_string());
        users.insert(author.clone()).await.unwrap();

        posts
            .insert(post_at(author.id, "Oldest", "some post content", &[], 0))
            .await
            .unwrap();
        posts
            .insert(post_at(author.id, "Newest", "some post content", &[], 60))
            .await
            .unwrap();

        let page = posts
            .find_page(&PostFilter::default(), 1, 5)
            .await
            .unwrap();

        assert_eq!(page.posts[0].post.title, "Newest");
        assert_eq!(page.posts[1].post.title, "Oldest");
    }

    #[tokio::test]
    async fn search_matches_title_or_content_case_insensitively() {
        let (_, users, posts) = repos();
        let author = User::new("amy".to_string(), "a@x.com".to_string(), "hash".to_string());
        users.insert(author.clone()).await.unwrap();

        posts
            .insert(post_at(author.id, "My FIRST post", "hello world out there", &[], 0))
            .await
            .unwrap();
        posts
            .insert(post_at(author.id, "Another one", "the first of many", &[], 1))
            .await
            .unwrap();
        posts
            .insert(post_at(author.id, "Unrelated", "nothing to see here", &[], 2))
            .await
            .unwrap();

        let filter = PostFilter {
            search: Some("first".to_string()),
            tag: None,
        };
        let page = posts.find_page(&filter, 1, 10).await.unwrap();

        assert_eq!(page.total_posts, 2);
        assert!(
            page.posts
                .iter()
                .all(|p| p.post.title.to_lowercase().contains("first")
                    || p.post.content.to_lowercase().contains("first"))
        );
    }

    #[tokio::test]
    async fn tag_filter_requires_exact_membership() {
        let (_, users, posts) = repos();
        let author = User::new("amy".to_string(), "a@x.com".to_string(), "hash".to_string());
        users.insert(author.clone()).await.unwrap();

        posts
            .insert(post_at(author.id, "Tagged", "some post content", &["rust", "web"], 0))
            .await
            .unwrap();
        posts
            .insert(post_at(author.id, "Other", "some post content", &["rustacean"], 1))
            .await
            .unwrap();

        let filter = PostFilter {
            search: None,
            tag: Some("rust".to_string()),
        };
        let page = posts.find_page(&filter, 1, 10).await.unwrap();

        assert_eq!(page.total_posts, 1);
        assert_eq!(page.posts[0].post.title, "Tagged");
    }

    #[tokio::test]
    async fn vanished_author_resolves_to_none() {
        let (_, users, posts) = repos();
        let author = User::new("amy".to_string(), "a@x.com".to_string(), "hash".to_string());
        users.insert(author.clone()).await.unwrap();

        let post = posts
            .insert(post_at(author.id, "Orphaned", "some post content", &[], 0))
            .await
            .unwrap();

        users.delete(author.id).await.unwrap();

        let found = posts.find_with_author(post.id).await.unwrap().unwrap();
        assert!(found.author.is_none());
        assert_eq!(found.post.title, "Orphaned");
    }
}
