use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::auth::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};
use crate::auth::extractors::CurrentUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::error::{is_unique_violation, ApiError};
use crate::json::Json;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_register(payload: &RegisterRequest) -> Result<(), ApiError> {
    let required = [
        ("firstName", &payload.first_name),
        ("lastName", &payload.last_name),
        ("username", &payload.username),
        ("email", &payload.email),
        ("password", &payload.password),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ApiError::validation(format!("{} is required", field)));
        }
    }
    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("Invalid email"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation("Password too short"));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();
    validate_register(&payload)?;

    // Hashing is CPU-bound; keep it off the request-dispatch threads.
    let hash_cfg = state.config.hash.clone();
    let password = payload.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&hash_cfg, &password))
        .await
        .map_err(|e| ApiError::Unexpected(e.into()))??;

    let user = User::create(
        &state.db,
        payload.first_name.trim(),
        payload.last_name.trim(),
        &payload.username,
        &payload.email,
        &hash,
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            warn!(username = %payload.username, "duplicate username or email");
            ApiError::validation("Username or email already taken")
        } else {
            ApiError::Unexpected(e.into())
        }
    })?;

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    // Same externally-visible outcome for unknown username and wrong
    // password, to avoid user enumeration.
    let user = User::find_by_username(&state.db, payload.username.trim())
        .await?
        .ok_or_else(|| {
            warn!("login with unknown username");
            ApiError::unauthenticated("Invalid credentials")
        })?;

    let password = payload.password;
    let stored_hash = user.password_hash.clone();
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::Unexpected(e.into()))??;

    if !ok {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::unauthenticated("Invalid credentials"));
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(
        first_name: &str,
        last_name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> RegisterRequest {
        RegisterRequest {
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape_validation() {
        assert!(is_valid_email("j@x.com"));
        assert!(is_valid_email("jane.doe+tag@example.co.uk"));
        assert!(!is_valid_email("jane.doe"));
        assert!(!is_valid_email("jane@doe"));
        assert!(!is_valid_email("jane doe@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn register_requires_all_fields() {
        let err = validate_register(&request("", "Doe", "jdoe", "j@x.com", "secret123"))
            .expect_err("missing first_name should fail");
        assert!(matches!(err, ApiError::Validation(_)));

        let err = validate_register(&request("Jane", "Doe", "  ", "j@x.com", "secret123"))
            .expect_err("blank username should fail");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn register_rejects_malformed_email_and_short_password() {
        let err = validate_register(&request("Jane", "Doe", "jdoe", "not-an-email", "secret123"))
            .expect_err("bad email should fail");
        assert!(matches!(err, ApiError::Validation(_)));

        let err = validate_register(&request("Jane", "Doe", "jdoe", "j@x.com", "short"))
            .expect_err("short password should fail");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn register_accepts_a_valid_payload() {
        validate_register(&request("Jane", "Doe", "jdoe", "j@x.com", "secret123"))
            .expect("valid payload should pass");
    }

    #[test]
    fn register_request_accepts_camel_case_payload() {
        let payload: RegisterRequest = serde_json::from_str(
            r#"{"username":"jdoe","email":"j@x.com","password":"secret123",
                "firstName":"Jane","lastName":"Doe"}"#,
        )
        .expect("deserialize");
        assert_eq!(payload.first_name, "Jane");
        assert_eq!(payload.last_name, "Doe");
        validate_register(&payload).expect("payload should validate");
    }

    #[test]
    fn public_user_json_has_no_password_hash() {
        let user = crate::auth::repo::User {
            id: uuid::Uuid::new_v4(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            username: "jdoe".into(),
            email: "j@x.com".into(),
            password_hash: "$argon2id$v=19$secret".into(),
            created_at: time::OffsetDateTime::now_utc(),
            updated_at: time::OffsetDateTime::now_utc(),
        };
        let public: PublicUser = user.into();
        let json = serde_json::to_string(&public).expect("serialize");
        assert!(json.contains("jdoe"));
        assert!(json.contains("firstName"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password"));
    }
}
