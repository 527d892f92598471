use serde::Deserialize;
use uuid::Uuid;

use crate::api::AudioDetail;
use crate::database::models::{Audio, Comment};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::validation::required;
use super::{cascade, policy};

#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAudioRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
    pub author: Option<Uuid>,
}

pub struct AudioService<'a> {
    state: &'a AppState,
}

impl<'a> AudioService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self) -> ApiResult<Vec<Audio>> {
        let mut session = self.state.store.begin().await?;
        Ok(session.audios().await?)
    }

    /// Every read counts as a view.
    pub async fn show(&self, audio_id: Uuid) -> ApiResult<AudioDetail> {
        let mut session = self.state.store.begin().await?;
        let audio = session
            .increment_views(audio_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Audio not found"))?;
        let comments = session.comments_by_ids(&audio.comments).await?;
        session.commit().await?;

        Ok(AudioDetail::new(audio, comments))
    }

    /// Exact title match
    pub async fn search(&self, request: SearchRequest) -> ApiResult<Vec<Audio>> {
        let mut session = self.state.store.begin().await?;
        Ok(session.audios_by_title(&request.title).await?)
    }

    /// Admin only
    pub async fn update(&self, caller_id: Uuid, audio_id: Uuid, request: UpdateAudioRequest) -> ApiResult<Audio> {
        let title = required(request.title.as_deref(), "title")?;
        let artist = required(request.artist.as_deref(), "artist")?;

        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;

        let mut audio = session
            .audio(audio_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Audio not found"))?;
        audio.title = title;
        audio.artist = artist;
        session.update_audio(&audio).await?;
        session.commit().await?;

        Ok(audio)
    }

    /// Admin only. Removes the audio, its comments and every reference to
    /// it, then unlinks its media files.
    pub async fn delete(&self, caller_id: Uuid, audio_id: Uuid) -> ApiResult<()> {
        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;

        let audio = session
            .audio(audio_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Audio not found"))?;
        cascade::delete_audio(&mut *session, &audio).await?;
        session.commit().await?;

        for path in audio.media_paths() {
            self.state.files.remove(path).await;
        }
        tracing::info!("Audio {} deleted by {}", audio.id, caller.id);
        Ok(())
    }

    /// Attach a comment authored by the caller
    pub async fn comment(&self, caller_id: Uuid, audio_id: Uuid, request: CommentRequest) -> ApiResult<Comment> {
        let text = required(request.text.as_deref(), "text")?;

        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        if request.author.is_some_and(|author| author != caller.id) {
            tracing::warn!("User {} tried to comment as another user", caller.id);
            return Err(ApiError::forbidden("You can only comment as yourself"));
        }

        let comment = Comment::new(text, caller.id);
        session.insert_comment(&comment).await?;
        if !session.push_audio_comment(audio_id, comment.id).await? {
            return Err(ApiError::not_found("Audio not found"));
        }
        session.commit().await?;

        Ok(comment)
    }
}
