use serde::Deserialize;
use uuid::Uuid;

use crate::api::PlaylistDetail;
use crate::database::models::{Playlist, LIKED_PLAYLIST_NAME};
use crate::database::Session;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::validation::required;
use super::{cascade, policy};

#[derive(Debug, Deserialize)]
pub struct PlaylistRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackRequest {
    pub audio_id: Option<String>,
}

pub struct PlaylistService<'a> {
    state: &'a AppState,
}

/// Name for a new or renamed playlist. "Liked" is reserved for the
/// per-user favourites list.
fn playlist_name(request: &PlaylistRequest) -> ApiResult<String> {
    let name = required(request.name.as_deref(), "name")?;
    if name == LIKED_PLAYLIST_NAME {
        return Err(ApiError::conflict("Liked playlist already exists"));
    }
    Ok(name)
}

/// Existence first, then ownership, before anything in the request body is
/// looked at.
async fn owned_playlist(session: &mut dyn Session, caller_id: Uuid, playlist_id: Uuid) -> ApiResult<Playlist> {
    let caller = policy::load_caller(session, caller_id).await?;
    let playlist = session
        .playlist(playlist_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;
    policy::require_owner(&caller, &playlist)?;
    Ok(playlist)
}

impl<'a> PlaylistService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Owner only
    pub async fn show(&self, caller_id: Uuid, playlist_id: Uuid) -> ApiResult<PlaylistDetail> {
        let mut session = self.state.store.begin().await?;
        let playlist = owned_playlist(&mut *session, caller_id, playlist_id).await?;

        let tracks = session.audios_by_ids(&playlist.tracks).await?;
        Ok(PlaylistDetail::new(playlist, tracks))
    }

    /// Playlists of any user, in the order they were created
    pub async fn for_user(&self, caller_id: Uuid, user_id: Uuid) -> ApiResult<Vec<Playlist>> {
        let mut session = self.state.store.begin().await?;
        policy::load_caller(&mut *session, caller_id).await?;
        let user = session
            .user(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Playlist for user not found"))?;

        Ok(session.playlists_by_ids(&user.playlists).await?)
    }

    pub async fn create(&self, caller_id: Uuid, request: PlaylistRequest) -> ApiResult<Playlist> {
        let name = playlist_name(&request)?;

        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;

        let playlist = Playlist::new(name, caller.id);
        session.insert_playlist(&playlist).await?;
        session.push_user_playlist(caller.id, playlist.id).await?;
        session.commit().await?;

        Ok(playlist)
    }

    /// Owner only. A track can appear at most once.
    pub async fn add_track(&self, caller_id: Uuid, playlist_id: Uuid, request: AddTrackRequest) -> ApiResult<Playlist> {
        let mut session = self.state.store.begin().await?;
        let mut playlist = owned_playlist(&mut *session, caller_id, playlist_id).await?;
        let raw = required(request.audio_id.as_deref(), "audioId")?;
        let audio_id = Uuid::parse_str(&raw).map_err(|_| ApiError::not_found("Audio not found"))?;
        if session.audio(audio_id).await?.is_none() {
            return Err(ApiError::not_found("Audio not found"));
        }

        if !session.push_playlist_track(playlist.id, audio_id).await? {
            return Err(ApiError::conflict("You have already added this track into this playlist"));
        }
        session.commit().await?;

        playlist.tracks.push(audio_id);
        Ok(playlist)
    }

    /// Append to the caller's Liked playlist and bump the like counter.
    pub async fn like(&self, caller_id: Uuid, audio_id: Uuid) -> ApiResult<Playlist> {
        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        if session.audio(audio_id).await?.is_none() {
            return Err(ApiError::not_found("Audio not found"));
        }

        let mut liked = session
            .playlist_by_owner_and_name(caller.id, LIKED_PLAYLIST_NAME)
            .await?
            .ok_or_else(|| ApiError::not_found("Liked playlist not found"))?;
        if !session.push_playlist_track(liked.id, audio_id).await? {
            return Err(ApiError::conflict("You have already liked this track"));
        }
        session.increment_likes(audio_id).await?;
        session.commit().await?;

        liked.tracks.push(audio_id);
        Ok(liked)
    }

    /// Owner only. The Liked playlist keeps its name.
    pub async fn rename(&self, caller_id: Uuid, playlist_id: Uuid, request: PlaylistRequest) -> ApiResult<Playlist> {
        let mut session = self.state.store.begin().await?;
        let mut playlist = owned_playlist(&mut *session, caller_id, playlist_id).await?;
        if playlist.is_liked() {
            return Err(ApiError::validation("The Liked playlist cannot be renamed"));
        }
        let name = playlist_name(&request)?;

        playlist.name = name;
        session.update_playlist(&playlist).await?;
        session.commit().await?;

        Ok(playlist)
    }

    /// Owner only. The Liked playlist cannot be deleted.
    pub async fn delete(&self, caller_id: Uuid, playlist_id: Uuid) -> ApiResult<()> {
        let mut session = self.state.store.begin().await?;
        let playlist = owned_playlist(&mut *session, caller_id, playlist_id).await?;
        if playlist.is_liked() {
            return Err(ApiError::validation("The Liked playlist cannot be deleted"));
        }

        cascade::delete_playlist(&mut *session, &playlist).await?;
        session.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liked_name_is_reserved() {
        let reserved = PlaylistRequest {
            name: Some("Liked".to_string()),
        };
        assert!(matches!(playlist_name(&reserved), Err(ApiError::Conflict(_))));

        let blank = PlaylistRequest { name: Some(" ".to_string()) };
        assert!(matches!(playlist_name(&blank), Err(ApiError::ValidationError(_))));

        let fine = PlaylistRequest {
            name: Some(" Road trip ".to_string()),
        };
        assert_eq!(playlist_name(&fine).unwrap(), "Road trip");
    }
}
