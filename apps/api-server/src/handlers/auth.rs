//! Authentication handlers: register, login, current user.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use quill_core::domain::User;
use quill_core::ports::{BaseRepository, PasswordService, TokenService, UserRepository};
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const USERNAME_MIN_LEN: usize = 3;
const PASSWORD_MIN_LEN: usize = 6;

// Bad credentials and unknown email answer identically so the endpoint
// leaks no account-existence signal.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub(crate) fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        created_at: user.created_at,
    }
}

/// POST /auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    // Validate input
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide all required fields".to_string(),
        ));
    }
    if username.chars().count() < USERNAME_MIN_LEN {
        return Err(AppError::Validation(format!(
            "Username must be at least {USERNAME_MIN_LEN} characters"
        )));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if req.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }

    // The email check runs first so an email conflict wins the reported
    // message when both fields collide.
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = password_service.hash(&req.password)?;

    let user = state
        .users
        .insert(User::new(username, email, password_hash))
        .await?;

    let token = token_service.generate_token(user.id)?;

    tracing::info!(user_id = %user.id, "new user registered");

    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User registered successfully".to_string(),
        user: user_response(&user),
        token,
    }))
}

/// POST /auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide email and password".to_string(),
        ));
    }

    let user = state
        .users
        .find_by_email(req.email.trim())
        .await?
        .ok_or_else(|| AppError::Auth(INVALID_CREDENTIALS.to_string()))?;

    let valid = password_service.verify(&req.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::Auth(INVALID_CREDENTIALS.to_string()));
    }

    let token = token_service.generate_token(user.id)?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".to_string(),
        user: user_response(&user),
        token,
    }))
}

/// GET /auth/me - Protected route.
///
/// The one guarded path that goes back to the store, so the caller gets
/// fresh profile data rather than the token's snapshot.
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(user_response(&user)))
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use quill_core::ports::BaseRepository;

    use crate::handlers::test_utils::{register_user, test_app, test_state};

    #[actix_rt::test]
    async fn register_returns_user_and_token_without_password() {
        let app = test_app!(test_state());

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(serde_json::json!({
                "username": "amy",
                "email": "a@x.com",
                "password": "secret123",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["username"], "amy");
        assert_eq!(body["user"]["email"], "a@x.com");
        assert!(!body["token"].as_str().unwrap().is_empty());
        // The password hash must never be serialized outward.
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("passwordHash").is_none());
        assert!(body["user"].get("password_hash").is_none());
    }

    #[actix_rt::test]
    async fn register_rejects_missing_fields() {
        let app = test_app!(test_state());

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(serde_json::json!({
                "username": "amy",
                "email": "a@x.com",
                "password": "",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_rt::test]
    async fn duplicate_email_conflicts_regardless_of_username() {
        let app = test_app!(test_state());
        register_user!(app, "amy", "a@x.com");

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(serde_json::json!({
                "username": "totally-different",
                "email": "a@x.com",
                "password": "secret123",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Email already registered");
    }

    #[actix_rt::test]
    async fn duplicate_username_conflicts_when_email_is_new() {
        let app = test_app!(test_state());
        register_user!(app, "amy", "a@x.com");

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(serde_json::json!({
                "username": "amy",
                "email": "b@x.com",
                "password": "secret123",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "Username already taken");
    }

    #[actix_rt::test]
    async fn login_succeeds_with_correct_credentials() {
        let app = test_app!(test_state());
        register_user!(app, "amy", "a@x.com");

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(serde_json::json!({
                "email": "a@x.com",
                "password": "secret123",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["username"], "amy");
        assert!(!body["token"].as_str().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn login_failure_does_not_reveal_which_credential_was_wrong() {
        let app = test_app!(test_state());
        register_user!(app, "amy", "a@x.com");

        let wrong_password = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(serde_json::json!({
                "email": "a@x.com",
                "password": "not-the-password",
            }))
            .to_request();
        let resp1 = test::call_service(&app, wrong_password).await;
        assert_eq!(resp1.status(), 401);
        let body1: serde_json::Value = test::read_body_json(resp1).await;

        let unknown_email = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(serde_json::json!({
                "email": "nobody@x.com",
                "password": "secret123",
            }))
            .to_request();
        let resp2 = test::call_service(&app, unknown_email).await;
        assert_eq!(resp2.status(), 401);
        let body2: serde_json::Value = test::read_body_json(resp2).await;

        assert_eq!(body1, body2);
    }

    #[actix_rt::test]
    async fn me_returns_the_registered_user() {
        let app = test_app!(test_state());
        let (token, _) = register_user!(app, "amy", "a@x.com");

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["username"], "amy");
        assert!(body.get("password").is_none());
    }

    #[actix_rt::test]
    async fn me_requires_a_bearer_token() {
        let app = test_app!(test_state());

        let req = test::TestRequest::get().uri("/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(("Authorization", "Bearer not-a-real-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_rt::test]
    async fn me_is_not_found_when_the_user_vanished() {
        let state = test_state();
        let app = test_app!(state.clone());
        let (token, user_id) = register_user!(app, "amy", "a@x.com");

        state.users.delete(user_id).await.unwrap();

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
