//! Tourist account routes
//!
//! Minimal registration and login for the pilot:
//! - POST register (name, email, password -> token + public profile)
//! - POST login (email, password -> fresh token)
//! - GET me (bearer token -> public profile)
//!
//! Accounts and tokens live in process memory and vanish on restart.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared account state
#[derive(Clone)]
pub struct AuthState {
    /// Keyed by lowercased email
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    /// Bearer token -> lowercased email
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl AuthState {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    // Plaintext for the pilot. In production, this would be hashed at rest
    password: String,
}

// ========== Request/Response Types ==========

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile without credential fields
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&UserRecord> for PublicUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

// ========== Route Handlers ==========

/// Create an account and log it in
pub async fn register(
    State(state): State<AuthState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Name must not be empty".to_string()));
    }

    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Invalid email address: {}", req.email),
        ));
    }

    if req.password.len() < 8 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let mut users = state.users.write().await;
    if users.contains_key(&email) {
        return Err((
            StatusCode::CONFLICT,
            format!("An account already exists for {}", email),
        ));
    }

    let record = UserRecord {
        id: Uuid::new_v4(),
        name,
        email: email.clone(),
        password: req.password,
    };
    let user = PublicUser::from(&record);
    users.insert(email.clone(), record);
    drop(users);

    let token = issue_token(&state, &email).await;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Exchange credentials for a fresh token
pub async fn login(
    State(state): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let email = req.email.trim().to_lowercase();

    let users = state.users.read().await;
    let user = users
        .get(&email)
        .filter(|record| record.password == req.password)
        .map(PublicUser::from)
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        ))?;
    drop(users);

    let token = issue_token(&state, &email).await;

    Ok(Json(AuthResponse { token, user }))
}

/// Profile for the bearer token
pub async fn me(
    State(state): State<AuthState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let tokens = state.tokens.read().await;
    let email = tokens
        .get(bearer.token())
        .cloned()
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Invalid or expired token".to_string(),
        ))?;
    drop(tokens);

    let users = state.users.read().await;
    let record = users.get(&email).ok_or((
        StatusCode::UNAUTHORIZED,
        "Invalid or expired token".to_string(),
    ))?;

    Ok(Json(PublicUser::from(record)))
}

async fn issue_token(state: &AuthState, email: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    state
        .tokens
        .write()
        .await
        .insert(token.clone(), email.to_string());
    token
}

// ========== Router ==========

pub fn auth_routes(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Asha Verma".to_string(),
            email: email.to_string(),
            password: "correct-horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_returns_token_and_public_user() {
        let state = AuthState::new();
        let (status, Json(resp)) =
            register(State(state), Json(register_req("asha@example.com")))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(!resp.token.is_empty());
        assert_eq!(resp.user.email, "asha@example.com");
        assert_eq!(resp.user.name, "Asha Verma");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let state = AuthState::new();
        register(State(state.clone()), Json(register_req("asha@example.com")))
            .await
            .unwrap();

        // Same address with different case still collides
        let err = register(State(state), Json(register_req("Asha@Example.com")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_validates_fields() {
        let state = AuthState::new();

        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                name: "  ".to_string(),
                email: "asha@example.com".to_string(),
                password: "correct-horse".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = register(
            State(state.clone()),
            Json(RegisterRequest {
                name: "Asha".to_string(),
                email: "not-an-email".to_string(),
                password: "correct-horse".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("email"));

        let err = register(
            State(state),
            Json(RegisterRequest {
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                password: "short".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("8 characters"));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let state = AuthState::new();
        register(State(state.clone()), Json(register_req("asha@example.com")))
            .await
            .unwrap();

        let err = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "asha@example.com".to_string(),
                password: "wrong".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
        assert_eq!(err.1, "Invalid email or password");

        let Json(resp) = login(
            State(state),
            Json(LoginRequest {
                email: "asha@example.com".to_string(),
                password: "correct-horse".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.user.email, "asha@example.com");
    }

    #[tokio::test]
    async fn test_me_resolves_bearer_token() {
        let state = AuthState::new();
        let (_, Json(resp)) =
            register(State(state.clone()), Json(register_req("asha@example.com")))
                .await
                .unwrap();

        let auth = Authorization::bearer(&resp.token).unwrap();
        let Json(user) = me(State(state.clone()), TypedHeader(auth)).await.unwrap();
        assert_eq!(user.email, "asha@example.com");

        let auth = Authorization::bearer("bogus-token").unwrap();
        let err = me(State(state), TypedHeader(auth)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }
}
