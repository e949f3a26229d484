//! Post handlers: public listing/retrieval and author-only mutations.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::{Post, PostFilter, PostWithAuthor};
use quill_core::ports::{BaseRepository, PostRepository};
use quill_shared::dto::{
    AuthorResponse, CreatePostRequest, PostListResponse, PostResponse, UpdatePostRequest,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    5
}

/// Listing query parameters. `limit` deliberately carries no upper bound.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
    pub tag: Option<String>,
}

fn post_response(found: PostWithAuthor) -> PostResponse {
    PostResponse {
        id: found.post.id,
        title: found.post.title,
        content: found.post.content,
        tags: found.post.tags,
        author: found.author.map(|a| AuthorResponse {
            id: a.id,
            username: a.username,
            email: a.email,
        }),
        views: found.post.views,
        likes: found.post.likes,
        created_at: found.post.created_at,
        updated_at: found.post.updated_at,
    }
}

async fn with_author(state: &AppState, post: Post) -> AppResult<PostResponse> {
    let author = state.users.find_by_id(post.author_id).await?;
    Ok(post_response(PostWithAuthor { post, author }))
}

/// GET /posts?page&limit&search&tag
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let page = q.page.max(1);
    let filter = PostFilter {
        search: q.search,
        tag: q.tag,
    };

    let result = state.posts.find_page(&filter, page, q.limit).await?;

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts: result.posts.into_iter().map(post_response).collect(),
        total_pages: result.total_pages,
        current_page: page,
        total_posts: result.total_posts,
    }))
}

/// POST /posts - Protected route
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let post = Post::new(identity.user_id, req.title, req.content, req.tags)?;
    let post = state.posts.insert(post).await?;

    tracing::info!(post_id = %post.id, author_id = %identity.user_id, "post created");

    let response = with_author(state.get_ref(), post).await?;
    Ok(HttpResponse::Created().json(response))
}

/// GET /posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let found = state
        .posts
        .find_with_author(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(post_response(found)))
}

/// PUT /posts/{id} - Protected route
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let req = body.into_inner();

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    post.ensure_author(identity.user_id, "update")?;
    post.apply_edit(req.title, req.content, req.tags)?;

    let post = state.posts.update(post).await?;

    let response = with_author(state.get_ref(), post).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// DELETE /posts/{id} - Protected route
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    post.ensure_author(identity.user_id, "delete")?;

    state.posts.delete(post.id).await?;

    tracing::info!(post_id = %id, author_id = %identity.user_id, "post deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted successfully"
    })))
}
