//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/me", web::get().to(auth::me)),
        )
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::list))
                .route("", web::post().to(posts::create))
                .route("/{id}", web::get().to(posts::get_post))
                .route("/{id}", web::put().to(posts::update))
                .route("/{id}", web::delete().to(posts::delete)),
        );
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::Arc;

    use quill_core::ports::{PasswordService, TokenService};
    use quill_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
    use quill_infra::database::{InMemoryPostRepository, InMemoryStore, InMemoryUserRepository};

    use crate::state::AppState;

    pub(crate) fn test_state() -> AppState {
        let store = Arc::new(InMemoryStore::new());
        AppState {
            users: Arc::new(InMemoryUserRepository::new(store.clone())),
            posts: Arc::new(InMemoryPostRepository::new(store)),
            db: None,
        }
    }

    pub(crate) fn test_token_service() -> Arc<dyn TokenService> {
        Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "quill-test".to_string(),
        }))
    }

    pub(crate) fn test_password_service() -> Arc<dyn PasswordService> {
        Arc::new(Argon2PasswordService::new())
    }

    /// Build an in-memory test application over the given state.
    macro_rules! test_app {
        ($state:expr) => {{
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data(actix_web::web::Data::new($state))
                    .app_data(actix_web::web::Data::new(
                        crate::handlers::test_utils::test_token_service(),
                    ))
                    .app_data(actix_web::web::Data::new(
                        crate::handlers::test_utils::test_password_service(),
                    ))
                    .configure(crate::handlers::configure_routes),
            )
            .await
        }};
    }

    /// Register a user over HTTP and return `(token, user_id)`.
    macro_rules! register_user {
        ($app:expr, $username:expr, $email:expr) => {{
            let req = actix_web::test::TestRequest::post()
                .uri("/auth/register")
                .set_json(serde_json::json!({
                    "username": $username,
                    "email": $email,
                    "password": "secret123",
                }))
                .to_request();
            let body: serde_json::Value =
                actix_web::test::call_and_read_body_json(&$app, req).await;
            let token = body["token"].as_str().expect("token in response").to_string();
            let user_id: uuid::Uuid = body["user"]["id"]
                .as_str()
                .expect("user id in response")
                .parse()
                .unwrap();
            (token, user_id)
        }};
    }

    pub(crate) use register_user;
    pub(crate) use test_app;
}
