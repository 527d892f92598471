use serde::Deserialize;
use uuid::Uuid;

use crate::api::CategoryDetail;
use crate::database::models::{Audio, Category};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::file_storage::{MediaKind, StagedUpload, UploadedFile};
use super::validation::required;
use super::{cascade, policy};

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}

/// Parts of the multipart form that creates an audio inside a category
#[derive(Debug, Default)]
pub struct AudioUpload {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub image: Option<UploadedFile>,
    pub audio: Option<UploadedFile>,
}

pub struct CategoryService<'a> {
    state: &'a AppState,
}

impl<'a> CategoryService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub async fn list(&self) -> ApiResult<Vec<Category>> {
        let mut session = self.state.store.begin().await?;
        Ok(session.categories().await?)
    }

    pub async fn show(&self, category_id: Uuid) -> ApiResult<CategoryDetail> {
        let mut session = self.state.store.begin().await?;
        let category = session
            .category(category_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        let tracks = session.audios_by_ids(&category.tracks).await?;

        Ok(CategoryDetail::new(category, tracks))
    }

    /// Admin only
    pub async fn create(&self, caller_id: Uuid, request: CategoryRequest) -> ApiResult<Category> {
        let name = required(request.name.as_deref(), "name")?;

        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;

        let category = Category::new(name);
        session.insert_category(&category).await?;
        session.commit().await?;

        Ok(category)
    }

    /// Admin only. Stores both media files and registers the new audio in
    /// the category's track list.
    pub async fn create_audio(&self, caller_id: Uuid, category_id: Uuid, upload: AudioUpload) -> ApiResult<Audio> {
        let title = required(upload.title.as_deref(), "title")?;
        let artist = required(upload.artist.as_deref(), "artist")?;
        let image = upload
            .image
            .as_ref()
            .ok_or_else(|| ApiError::validation("Invalid inputs: image is required"))?;
        let track = upload
            .audio
            .as_ref()
            .ok_or_else(|| ApiError::validation("Invalid inputs: audio is required"))?;

        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;
        if session.category(category_id).await?.is_none() {
            return Err(ApiError::not_found("Category not found"));
        }

        let mut staged = StagedUpload::new();
        let image = self.state.files.store_upload(&mut staged, MediaKind::Picture, image).await?;
        let track = self.state.files.store_upload(&mut staged, MediaKind::Audio, track).await?;

        let audio = Audio::new(title, artist, track, image, category_id);
        session.insert_audio(&audio).await?;
        session.push_category_track(category_id, audio.id).await?;
        session.commit().await?;
        staged.commit();

        tracing::info!("Audio {} added to category {}", audio.id, category_id);
        Ok(audio)
    }

    /// Admin only
    pub async fn rename(&self, caller_id: Uuid, category_id: Uuid, request: CategoryRequest) -> ApiResult<Category> {
        let name = required(request.name.as_deref(), "name")?;

        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;

        let mut category = session
            .category(category_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        category.name = name;
        session.update_category(&category).await?;
        session.commit().await?;

        Ok(category)
    }

    /// Admin only. Deep cascade: every audio of the category goes with it.
    pub async fn delete(&self, caller_id: Uuid, category_id: Uuid) -> ApiResult<()> {
        let mut session = self.state.store.begin().await?;
        let caller = policy::load_caller(&mut *session, caller_id).await?;
        policy::require_admin(&caller)?;

        let category = session
            .category(category_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        let removed = cascade::delete_category(&mut *session, &category).await?;
        session.commit().await?;

        for audio in &removed {
            for path in audio.media_paths() {
                self.state.files.remove(path).await;
            }
        }
        tracing::info!(
            "Category {} deleted by {} with {} audios",
            category.id,
            caller.id,
            removed.len()
        );
        Ok(())
    }
}
