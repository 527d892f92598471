use axum::extract::{multipart::MultipartRejection, Multipart, State};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::middleware::{ApiResponse, AuthUser, FormParts, JsonBody, RecordId};
use crate::services::user_service::{BanRequest, EditUserRequest, LoginRequest, SignupForm};
use crate::services::UserService;
use crate::state::AppState;

/// POST /api/users/signup - Multipart registration with profile image
pub async fn signup(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<Value>> {
    let mut parts = FormParts::read(multipart).await?;
    let form = SignupForm {
        name: parts.text("name"),
        email: parts.text("email"),
        password: parts.text("password"),
        image: parts.take_file("image"),
    };

    let authenticated = UserService::new(&state).signup(form).await?;
    Ok(ApiResponse::created(json!({
        "userId": authenticated.user.id,
        "role": authenticated.user.role,
        "token": authenticated.token,
    })))
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let authenticated = UserService::new(&state).login(request).await?;
    Ok(ApiResponse::success(json!({
        "userId": authenticated.user.id,
        "email": authenticated.user.email,
        "role": authenticated.user.role,
        "token": authenticated.token,
    })))
}

/// GET /api/users/:user_id
pub async fn show(State(state): State<AppState>, RecordId(user_id): RecordId) -> ApiResult<ApiResponse<Value>> {
    let user = UserService::new(&state).get(user_id).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// GET /api/users - Admin only
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> ApiResult<ApiResponse<Value>> {
    let users = UserService::new(&state).list(auth.user_id).await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}

/// POST /api/users/ban - Admin only
pub async fn ban(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<BanRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let message = UserService::new(&state).set_ban(auth.user_id, request).await?;
    Ok(ApiResponse::success(json!({ "message": message })))
}

/// PATCH /api/users/:user_id - Admin only
pub async fn edit(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(user_id): RecordId,
    JsonBody(request): JsonBody<EditUserRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let user = UserService::new(&state).edit(auth.user_id, user_id, request).await?;
    Ok(ApiResponse::created(json!({ "user": user })))
}
