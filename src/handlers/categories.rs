use axum::extract::{multipart::MultipartRejection, Multipart, State};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::middleware::{ApiResponse, AuthUser, FormParts, JsonBody, RecordId};
use crate::services::category_service::{AudioUpload, CategoryRequest};
use crate::services::CategoryService;
use crate::state::AppState;

/// GET /api/categories
pub async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Value>> {
    let categories = CategoryService::new(&state).list().await?;
    Ok(ApiResponse::success(json!({ "categories": categories })))
}

/// GET /api/categories/:ctg_id - Category with its tracks
pub async fn show(State(state): State<AppState>, RecordId(category_id): RecordId) -> ApiResult<ApiResponse<Value>> {
    let category = CategoryService::new(&state).show(category_id).await?;
    Ok(ApiResponse::success(json!({ "category": category })))
}

/// POST /api/categories - Admin only
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let category = CategoryService::new(&state).create(auth.user_id, request).await?;
    Ok(ApiResponse::created(json!({
        "ctgId": category.id,
        "ctgName": category.name,
    })))
}

/// POST /api/categories/:ctg_id - Admin only, multipart audio upload
pub async fn create_audio(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(category_id): RecordId,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<Value>> {
    let mut parts = FormParts::read(multipart).await?;
    let upload = AudioUpload {
        title: parts.text("title"),
        artist: parts.text("artist"),
        image: parts.take_file("image"),
        audio: parts.take_file("audio"),
    };

    let audio = CategoryService::new(&state)
        .create_audio(auth.user_id, category_id, upload)
        .await?;
    Ok(ApiResponse::created(json!({ "audio": audio })))
}

/// PATCH /api/categories/:ctg_id - Admin only
pub async fn rename(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(category_id): RecordId,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let category = CategoryService::new(&state)
        .rename(auth.user_id, category_id, request)
        .await?;
    Ok(ApiResponse::created(json!({ "category": category })))
}

/// DELETE /api/categories/:ctg_id - Admin only, removes its audios too
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(category_id): RecordId,
) -> ApiResult<ApiResponse<Value>> {
    CategoryService::new(&state).delete(auth.user_id, category_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Category deleted" })))
}
