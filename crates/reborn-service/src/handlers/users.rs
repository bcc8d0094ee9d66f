//! User account handlers: registration, login, profile, points.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use reborn_core::{validate, AccountStatus, StoreCategory, User};
use reborn_store::{NewStore, NewUser, UserProfileUpdate};

use crate::auth::{issue_token, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Public view of a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User id.
    pub user_id: String,
    /// Login id.
    pub login_id: String,
    /// E-mail address.
    pub email: String,
    /// Nickname.
    pub nickname: String,
    /// Address.
    pub address: String,
    /// Category of interest.
    pub likes: StoreCategory,
    /// Profile image URL.
    pub image_url: Option<String>,
    /// Point balance.
    pub point: i64,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            login_id: user.login_id.clone(),
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            address: user.address.clone(),
            likes: user.likes,
            image_url: user.image_url.clone(),
            point: user.point,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Neighbor sign-up request.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    /// Login id, 4-16 alphanumeric.
    pub login_id: String,
    /// E-mail address.
    pub email: String,
    /// Plaintext password, 8-16 characters.
    pub password: String,
    /// Nickname.
    pub nickname: String,
    /// Address.
    pub address: String,
    /// Category of interest.
    pub likes: StoreCategory,
    /// Birth date (`YYYYMMDD`).
    pub birth_date: Option<String>,
    /// Profile image URL.
    pub image_url: Option<String>,
}

/// Register a neighbor account.
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate::login_id(&body.login_id)?;
    validate::email(&body.email)?;
    validate::password(&body.password)?;
    validate::nickname(&body.nickname)?;
    validate::non_empty("address", &body.address)?;
    if let Some(birth_date) = &body.birth_date {
        validate::birth_date(birth_date)?;
    }

    if state.db.login_id_exists(&body.login_id).await? {
        return Err(ApiError::Conflict("Login id already taken".into()));
    }

    let password_hash = hash_password(&body.password)?;
    let user = state
        .db
        .create_user(NewUser {
            login_id: body.login_id,
            email: body.email,
            password_hash,
            nickname: body.nickname,
            address: body.address,
            likes: body.likes,
            birth_date: body.birth_date,
            image_url: body.image_url,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Neighbor account created");

    Ok(Json(UserResponse::from(&user)))
}

/// Store sign-up request: the account plus its store row.
#[derive(Debug, Deserialize)]
pub struct SignUpStoreRequest {
    /// Login id, 4-16 alphanumeric.
    pub login_id: String,
    /// E-mail address.
    pub email: String,
    /// Plaintext password, 8-16 characters.
    pub password: String,
    /// Owner nickname.
    pub nickname: String,
    /// Owner address.
    pub address: String,
    /// Store display name.
    pub store_name: String,
    /// Business registration number (`000-00-00000`).
    pub registration_number: String,
    /// Store street address.
    pub store_address: String,
    /// Store category.
    pub category: StoreCategory,
    /// Store banner image URL.
    pub store_image_url: Option<String>,
}

/// Store sign-up response.
#[derive(Debug, Serialize)]
pub struct SignUpStoreResponse {
    /// User id of the owner account.
    pub user_id: String,
    /// Store id.
    pub store_id: String,
    /// Login id.
    pub login_id: String,
    /// Store name.
    pub store_name: String,
}

/// Register a store account.
pub async fn sign_up_store(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpStoreRequest>,
) -> Result<Json<SignUpStoreResponse>, ApiError> {
    validate::login_id(&body.login_id)?;
    validate::email(&body.email)?;
    validate::password(&body.password)?;
    validate::nickname(&body.nickname)?;
    validate::non_empty("address", &body.address)?;
    validate::nickname(&body.store_name)?;
    validate::registration_number(&body.registration_number)?;
    validate::non_empty("store_address", &body.store_address)?;

    if state.db.login_id_exists(&body.login_id).await? {
        return Err(ApiError::Conflict("Login id already taken".into()));
    }

    let password_hash = hash_password(&body.password)?;
    let (user, store) = state
        .db
        .create_store_account(
            NewUser {
                login_id: body.login_id,
                email: body.email,
                password_hash,
                nickname: body.nickname,
                address: body.address,
                likes: body.category,
                birth_date: None,
                image_url: None,
            },
            NewStore {
                name: body.store_name,
                registration_number: body.registration_number,
                address: body.store_address,
                image_url: body.store_image_url,
                category: body.category,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, store_id = %store.id, "Store account created");

    Ok(Json(SignUpStoreResponse {
        user_id: user.id.to_string(),
        store_id: store.id.to_string(),
        login_id: user.login_id,
        store_name: store.name,
    }))
}

/// Login-id availability query.
#[derive(Debug, Deserialize)]
pub struct CheckDuplicateQuery {
    /// Login id to check.
    pub login_id: String,
}

/// Check whether a login id is still available.
pub async fn check_duplicate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckDuplicateQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate::login_id(&query.login_id)?;
    let taken = state.db.login_id_exists(&query.login_id).await?;
    Ok(Json(serde_json::json!({ "available": !taken })))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LogInRequest {
    /// Login id.
    pub login_id: String,
    /// Plaintext password.
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LogInResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// User id.
    pub user_id: String,
    /// Nickname.
    pub nickname: String,
    /// Store id, present for store-account logins only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
}

/// Log in as a neighbor.
pub async fn log_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LogInRequest>,
) -> Result<Json<LogInResponse>, ApiError> {
    let user = authenticate(&state, &body).await?;
    let token = issue_token(user.id, &state)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LogInResponse {
        token,
        user_id: user.id.to_string(),
        nickname: user.nickname,
        store_id: None,
    }))
}

/// Log in as a store owner; also returns the store id.
pub async fn log_in_store(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LogInRequest>,
) -> Result<Json<LogInResponse>, ApiError> {
    let user = authenticate(&state, &body).await?;
    let store = state
        .db
        .get_store_by_owner(user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    let token = issue_token(user.id, &state)?;

    tracing::info!(user_id = %user.id, store_id = %store.id, "Store owner logged in");

    Ok(Json(LogInResponse {
        token,
        user_id: user.id.to_string(),
        nickname: user.nickname,
        store_id: Some(store.id.to_string()),
    }))
}

/// Get the current user's profile.
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = require_user(&state, auth).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Get the current user's point balance.
pub async fn get_point(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, auth).await?;
    Ok(Json(serde_json::json!({ "point": user.point })))
}

/// Point adjustment request.
#[derive(Debug, Deserialize)]
pub struct AdjustPointRequest {
    /// Points to add (negative to spend or cancel).
    pub delta: i64,
}

/// Earn or spend points.
pub async fn adjust_point(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<AdjustPointRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let point = state.db.adjust_user_point(auth.user_id, body.delta).await?;

    tracing::info!(user_id = %auth.user_id, delta = body.delta, point, "Points adjusted");

    Ok(Json(serde_json::json!({ "point": point })))
}

/// Profile update request.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New nickname.
    pub nickname: String,
    /// New address.
    pub address: String,
    /// New category of interest.
    pub likes: StoreCategory,
    /// New profile image URL, when replaced.
    pub image_url: Option<String>,
}

/// Update the current user's profile.
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate::nickname(&body.nickname)?;
    validate::non_empty("address", &body.address)?;

    state
        .db
        .update_user_profile(
            auth.user_id,
            UserProfileUpdate {
                nickname: body.nickname,
                address: body.address,
                likes: body.likes,
                image_url: body.image_url,
            },
        )
        .await?;

    tracing::info!(user_id = %auth.user_id, "Profile updated");

    Ok(Json(serde_json::json!({ "updated": true })))
}

/// Password change request.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current plaintext password.
    pub current_password: String,
    /// New plaintext password.
    pub new_password: String,
}

/// Change the current user's password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = require_user(&state, auth).await?;

    if !verify_password(&body.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized);
    }
    validate::password(&body.new_password)?;

    let password_hash = hash_password(&body.new_password)?;
    state
        .db
        .update_user_password(user.id, &password_hash)
        .await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(Json(serde_json::json!({ "updated": true })))
}

/// Soft-delete the current neighbor account.
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .db
        .set_user_status(auth.user_id, AccountStatus::Deleted)
        .await?;

    tracing::info!(user_id = %auth.user_id, "Account deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Soft-delete the current store account and its store.
pub async fn delete_store_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .db
        .set_store_status_by_owner(auth.user_id, AccountStatus::Deleted)
        .await?;
    state
        .db
        .set_user_status(auth.user_id, AccountStatus::Deleted)
        .await?;

    tracing::info!(user_id = %auth.user_id, "Store account deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Load the caller's account, rejecting deleted accounts.
async fn require_user(state: &AppState, auth: AuthUser) -> Result<User, ApiError> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("account not found".into()))?;
    if user.status == AccountStatus::Deleted {
        return Err(ApiError::Unauthorized);
    }
    Ok(user)
}

/// Verify a login attempt: account lookup, status check, password check.
async fn authenticate(state: &AppState, body: &LogInRequest) -> Result<User, ApiError> {
    let user = state
        .db
        .get_user_by_login_id(&body.login_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    if !user.is_active() {
        return Err(ApiError::Unauthorized);
    }
    if !verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized);
    }
    Ok(user)
}

fn hash_password(plaintext: &str) -> Result<String, ApiError> {
    bcrypt::hash(plaintext, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

fn verify_password(plaintext: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(plaintext, hash)
        .map_err(|e| ApiError::Internal(format!("failed to verify password: {e}")))
}
