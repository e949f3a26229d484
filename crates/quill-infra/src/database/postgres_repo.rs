//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use quill_core::domain::{PostFilter, PostPage, PostWithAuthor, User};
use quill_core::error::RepoError;
use quill_core::ports::{PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = if local.len() > 1 {
                format!("{}***", &local[..1])
            } else {
                "***".to_string()
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>, RepoError> {
        let row = PostEntity::find_by_id(id)
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(row.map(|(post, author)| PostWithAuthor {
            post: post.into(),
            author: author.map(Into::into),
        }))
    }

    async fn find_page(
        &self,
        filter: &PostFilter,
        page: u64,
        per_page: u64,
    ) -> Result<PostPage, RepoError> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let mut cond = Condition::all();
        if let Some(search) = filter.search.as_deref() {
            let pattern = format!("%{search}%");
            cond = cond.add(
                Condition::any()
                    .add(Expr::col((post::Entity, post::Column::Title)).ilike(pattern.clone()))
                    .add(Expr::col((post::Entity, post::Column::Content)).ilike(pattern)),
            );
        }
        if let Some(tag) = filter.tag.as_deref() {
            // JSONB containment: the tag list must contain the exact value.
            let containment: sea_orm::sea_query::SimpleExpr = Expr::cust_with_values(
                "posts.tags @> $1::jsonb",
                [serde_json::json!([tag]).to_string()],
            )
            .into();
            cond = cond.add(containment);
        }

        let paginator = PostEntity::find()
            .find_also_related(UserEntity)
            .filter(cond)
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let totals = paginator
            .num_items_and_pages()
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;
        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(PostPage {
            posts: rows
                .into_iter()
                .map(|(post, author)| PostWithAuthor {
                    post: post.into(),
                    author: author.map(Into::into),
                })
                .collect(),
            total_posts: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }
}
