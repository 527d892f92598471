use axum::extract::State;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::middleware::{ApiResponse, AuthUser, JsonBody, RecordId};
use crate::services::audio_service::{CommentRequest, SearchRequest, UpdateAudioRequest};
use crate::services::AudioService;
use crate::state::AppState;

/// GET /api/audios
pub async fn list(State(state): State<AppState>) -> ApiResult<ApiResponse<Value>> {
    let audios = AudioService::new(&state).list().await?;
    Ok(ApiResponse::success(json!({ "audios": audios })))
}

/// GET /api/audios/:audio_id - Counts a view
pub async fn show(State(state): State<AppState>, RecordId(audio_id): RecordId) -> ApiResult<ApiResponse<Value>> {
    let audio = AudioService::new(&state).show(audio_id).await?;
    Ok(ApiResponse::success(json!({ "audio": audio })))
}

/// POST /api/audios/search
pub async fn search(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SearchRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let audios = AudioService::new(&state).search(request).await?;
    Ok(ApiResponse::success(json!({ "audios": audios })))
}

/// PATCH /api/audios/:audio_id - Admin only
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(audio_id): RecordId,
    JsonBody(request): JsonBody<UpdateAudioRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let audio = AudioService::new(&state).update(auth.user_id, audio_id, request).await?;
    Ok(ApiResponse::created(json!({ "audio": audio })))
}

/// DELETE /api/audios/:audio_id - Admin only
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(audio_id): RecordId,
) -> ApiResult<ApiResponse<Value>> {
    AudioService::new(&state).delete(auth.user_id, audio_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Audio was deleted" })))
}

/// POST /api/audios/:audio_id/comments
pub async fn comment(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(audio_id): RecordId,
    JsonBody(request): JsonBody<CommentRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let comment = AudioService::new(&state).comment(auth.user_id, audio_id, request).await?;
    Ok(ApiResponse::created(json!({ "comment": comment })))
}
