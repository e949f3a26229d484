use sea_orm::{DatabaseBackend, MockDatabase};

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};
use quill_core::domain::{Post, User};
use quill_core::ports::{BaseRepository, UserRepository};

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = uuid::Uuid::new_v4();
    let author_id = uuid::Uuid::new_v4();
    let now = chrono::Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post::Model {
            id: post_id,
            author_id,
            title: "Test Post".to_owned(),
            content: "Content of the test post".to_owned(),
            tags: serde_json::json!(["test"]),
            views: 0,
            likes: 0,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let found = result.unwrap();
    assert_eq!(found.id, post_id);
    assert_eq!(found.title, "Test Post");
    assert_eq!(found.tags, vec!["test".to_string()]);
}

#[tokio::test]
async fn test_find_user_by_email() {
    let user_id = uuid::Uuid::new_v4();
    let now = chrono::Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user::Model {
            id: user_id,
            username: "amy".to_owned(),
            email: "a@x.com".to_owned(),
            password_hash: "hash".to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let result: Option<User> = repo.find_by_email("a@x.com").await.unwrap();

    let found = result.unwrap();
    assert_eq!(found.id, user_id);
    assert_eq!(found.username, "amy");
}
