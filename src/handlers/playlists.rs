use axum::extract::State;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::middleware::{ApiResponse, AuthUser, JsonBody, RecordId};
use crate::services::playlist_service::{AddTrackRequest, PlaylistRequest};
use crate::services::PlaylistService;
use crate::state::AppState;

/// GET /api/playlists/:playlist_id - Owner only
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(playlist_id): RecordId,
) -> ApiResult<ApiResponse<Value>> {
    let playlist = PlaylistService::new(&state).show(auth.user_id, playlist_id).await?;
    Ok(ApiResponse::success(json!({ "playlist": playlist })))
}

/// GET /api/playlists/user/:user_id
pub async fn for_user(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(user_id): RecordId,
) -> ApiResult<ApiResponse<Value>> {
    let playlists = PlaylistService::new(&state).for_user(auth.user_id, user_id).await?;
    Ok(ApiResponse::success(json!({ "userPlaylists": playlists })))
}

/// POST /api/playlists
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(request): JsonBody<PlaylistRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let playlist = PlaylistService::new(&state).create(auth.user_id, request).await?;
    Ok(ApiResponse::created(json!({
        "playlistId": playlist.id,
        "playlistName": playlist.name,
    })))
}

/// POST /api/playlists/:playlist_id - Owner only, adds a track
pub async fn add_track(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(playlist_id): RecordId,
    JsonBody(request): JsonBody<AddTrackRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let playlist = PlaylistService::new(&state)
        .add_track(auth.user_id, playlist_id, request)
        .await?;
    Ok(ApiResponse::success(json!({ "playlist": playlist })))
}

/// POST /api/playlists/liked/add/:audio_id
pub async fn like(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(audio_id): RecordId,
) -> ApiResult<ApiResponse<Value>> {
    let playlist = PlaylistService::new(&state).like(auth.user_id, audio_id).await?;
    Ok(ApiResponse::created(json!({ "playlist": playlist })))
}

/// PATCH /api/playlists/:playlist_id - Owner only
pub async fn rename(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(playlist_id): RecordId,
    JsonBody(request): JsonBody<PlaylistRequest>,
) -> ApiResult<ApiResponse<Value>> {
    let playlist = PlaylistService::new(&state)
        .rename(auth.user_id, playlist_id, request)
        .await?;
    Ok(ApiResponse::created(json!({ "playlist": playlist })))
}

/// DELETE /api/playlists/:playlist_id - Owner only
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    RecordId(playlist_id): RecordId,
) -> ApiResult<ApiResponse<Value>> {
    PlaylistService::new(&state).delete(auth.user_id, playlist_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Playlist deleted" })))
}
