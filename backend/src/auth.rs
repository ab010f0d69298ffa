use axum::{extract::State, http::StatusCode, Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use common::{Credentials, RefreshPayload, RegisterPayload, RegisterResponse, TokenPair, UserProfile};
use serde::{Deserialize, Serialize};

use base64::engine::{general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;

use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::{
    extract::WithRejection,
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};

use crate::config::JwtConfig;
use crate::db::DbConnection;
use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::user_store::{self, User};
use crate::web_server::AppState;
use rand::Rng;
use sha2::{Digest, Sha256};
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // Subject (user id)
    pub exp: usize,    // Expiration time
    pub nonce: String, // Nonce for access token uniqueness
}

// --- Helper struct for reading the token from the database ---
#[derive(sqlx::FromRow)]
struct RefreshTokenRecord {
    user_id: i64,
    expires_at: DateTime<Utc>,
}

fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signs a short-lived access token for `user_id`.
pub fn encode_access_token(user_id: i64, jwt_config: &JwtConfig) -> Result<String, AppError> {
    // Random nonce so two tokens issued in the same second still differ
    let nonce: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let exp = (Utc::now() + Duration::minutes(jwt_config.access_token_expires_minutes)).timestamp()
        as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        nonce,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_ref()),
    )?)
}

/// Resolves the user id from an access token, rejecting bad signatures and expired tokens.
pub fn decode_access_token(token: &str, jwt_config: &JwtConfig) -> Result<i64, AppError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_ref()),
        &validation,
    )
    .map_err(|e| {
        tracing::warn!("Rejected access token: {}", e);
        AppError::Unauthorized
    })?;

    token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized)
}

/// Creates a new access token and a new refresh token for a user.
///
/// The refresh token is stored hashed, replacing any existing one for the
/// user. Runs on the caller's connection so registration can commit the user
/// and its session together.
async fn issue_tokens(
    user_id: i64,
    conn: &mut DbConnection,
    jwt_config: &JwtConfig,
) -> Result<TokenPair, AppError> {
    let access = encode_access_token(user_id, jwt_config)?;

    let mut refresh_token_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut refresh_token_bytes);
    let refresh = general_purpose::URL_SAFE_NO_PAD.encode(refresh_token_bytes);
    let refresh_hash = hash_refresh_token(&refresh);
    let refresh_exp = Utc::now() + Duration::days(jwt_config.refresh_token_expires_days);

    // A new login invalidates any other session of the same user.
    sqlx::query(
        "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)
         ON CONFLICT(user_id) DO UPDATE SET token_hash = excluded.token_hash, expires_at = excluded.expires_at",
    )
    .bind(user_id)
    .bind(&refresh_hash)
    .bind(refresh_exp)
    .execute(&mut *conn)
    .await?;

    Ok(TokenPair { refresh, access })
}

fn registration_errors(payload: &RegisterPayload) -> ValidationErrors {
    let mut errors = payload.validate().err().unwrap_or_else(ValidationErrors::new);
    if let Some(confirmation) = &payload.password2 {
        if confirmation != &payload.password {
            errors.add(
                "password",
                ValidationError::new("password_mismatch")
                    .with_message("Password fields didn't match.".into()),
            );
        }
    }
    errors
}

fn username_taken() -> ValidationError {
    ValidationError::new("unique").with_message("A user with that username already exists.".into())
}

/// Inserts the account, reporting a username claimed by a concurrent
/// registration as the same field error the up-front check gives.
pub async fn create_account(
    conn: &mut DbConnection,
    payload: &RegisterPayload,
    password_hash: &str,
) -> Result<User, AppError> {
    match user_store::insert(&mut *conn, payload, password_hash).await {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            tracing::info!("Username taken during registration: {}", &payload.username);
            let mut errors = ValidationErrors::new();
            errors.add("username", username_taken());
            Err(AppError::ValidationError(errors))
        }
        Err(e) => Err(e.into()),
    }
}

// --- API Handlers ---

/// ## Register a new user
/// Validates the account fields, stores the user and returns a fresh session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Field-level validation errors"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterPayload>, AppError>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let mut errors = registration_errors(&payload);

    if !errors.field_errors().contains_key("username")
        && user_store::find_by_username(&state.db_pool, &payload.username)
            .await?
            .is_some()
    {
        errors.add("username", username_taken());
    }

    if !errors.is_empty() {
        return Err(AppError::ValidationError(errors));
    }

    tracing::info!("Registering user: {}", &payload.username);
    let password_hash = hash(&payload.password, DEFAULT_COST)?;

    let mut tx = state.db_pool.begin().await?;
    let user = create_account(&mut tx, &payload, &password_hash).await?;
    let tokens = issue_tokens(user.id, &mut tx, &state.app_config.jwt).await?;
    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            refresh: tokens.refresh,
            access: tokens.access,
            user: user.profile(),
        }),
    ))
}

/// ## Obtain a token pair
/// Exchanges username and password for a refresh/access pair.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    tag = "Auth",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = TokenPair),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<Credentials>, AppError>,
) -> Result<Json<TokenPair>, AppError> {
    tracing::info!("Logging in user: {}", &payload.username);
    let user = user_store::find_by_username(&state.db_pool, &payload.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify(&payload.password, &user.password_hash)? {
        tracing::warn!("Wrong password for user: {}", &payload.username);
        return Err(AppError::Unauthorized);
    }

    let mut tx = state.db_pool.begin().await?;
    let tokens = issue_tokens(user.id, &mut tx, &state.app_config.jwt).await?;
    tx.commit().await?;

    Ok(Json(tokens))
}

/// ## Rotate a refresh token
/// Returns a new pair; the refresh token that was sent stops working.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token/refresh",
    tag = "Auth",
    request_body = RefreshPayload,
    responses(
        (status = 200, description = "Token refreshed", body = TokenPair),
        (status = 401, description = "Invalid or expired refresh token"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RefreshPayload>, AppError>,
) -> Result<Json<TokenPair>, AppError> {
    let incoming_token_hash = hash_refresh_token(&payload.refresh);

    let mut tx = state.db_pool.begin().await?;

    // Claiming the token by deleting it makes it single use: of two
    // concurrent refreshes only one gets the row back.
    let record = sqlx::query_as::<_, RefreshTokenRecord>(
        "DELETE FROM refresh_tokens WHERE token_hash = $1 RETURNING user_id, expires_at",
    )
    .bind(&incoming_token_hash)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if record.expires_at < Utc::now() {
        // Keep the cleanup; the request fails either way
        tx.commit().await?;
        return Err(AppError::Unauthorized);
    }

    let tokens = issue_tokens(record.user_id, &mut tx, &state.app_config.jwt).await?;
    tx.commit().await?;

    Ok(Json(tokens))
}

/// ## Current user's profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The authenticated user", body = UserProfile),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn profile(user: AuthUser) -> Json<UserProfile> {
    Json(user.0)
}

// --- Middleware for JWT Authentication ---

pub async fn auth_middleware(
    State(state): State<AppState>,
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = auth_header?.token().to_owned();

    let user_id = decode_access_token(&token, &state.app_config.jwt)?;

    // A valid token for a deleted account is still rejected
    let user = user_store::find_by_id(&state.db_pool, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser(user.profile()));

    Ok(next.run(request).await)
}
