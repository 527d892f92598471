use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Audio, Category, Comment, Playlist, User};

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Corrupt record in {collection}: {detail}")]
    Corrupt {
        collection: &'static str,
        detail: String,
    },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store holding the users, audios, categories, playlists and
/// comments collections.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Open a unit of work. Nothing written through the session is visible to
    /// other sessions until [`Session::commit`]; dropping it discards the work.
    async fn begin(&self) -> StoreResult<Box<dyn Session>>;

    /// Liveness probe used by `/health`.
    async fn ping(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Primitive document operations executed inside one unit of work.
///
/// Reference-list maintenance (cascades, ownership lists) is composed out of
/// these by the service layer, so both backends share one implementation of
/// the business rules. `update_*` write scalar fields only; reference lists
/// change through the `push_*`/`pull_*` operations and counters through
/// `increment_*`.
#[async_trait]
pub trait Session: Send {
    // users
    async fn user(&mut self, id: Uuid) -> StoreResult<Option<User>>;
    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;
    async fn users(&mut self) -> StoreResult<Vec<User>>;
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn insert_user(&mut self, user: &User) -> StoreResult<()>;
    /// Writes name, image, role and ban flag.
    async fn update_user(&mut self, user: &User) -> StoreResult<()>;
    /// Append to the owner's playlist list. False when the user is missing.
    async fn push_user_playlist(&mut self, user: Uuid, playlist: Uuid) -> StoreResult<bool>;
    async fn pull_user_playlist(&mut self, user: Uuid, playlist: Uuid) -> StoreResult<bool>;

    // audios
    async fn audio(&mut self, id: Uuid) -> StoreResult<Option<Audio>>;
    async fn audios(&mut self) -> StoreResult<Vec<Audio>>;
    /// Records in the order of `ids`; unknown IDs are skipped.
    async fn audios_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Audio>>;
    async fn audios_by_title(&mut self, title: &str) -> StoreResult<Vec<Audio>>;
    async fn insert_audio(&mut self, audio: &Audio) -> StoreResult<()>;
    /// Writes title, artist, media paths and category.
    async fn update_audio(&mut self, audio: &Audio) -> StoreResult<()>;
    async fn push_audio_comment(&mut self, audio: Uuid, comment: Uuid) -> StoreResult<bool>;
    /// Atomically bump the view counter and return the updated record.
    async fn increment_views(&mut self, id: Uuid) -> StoreResult<Option<Audio>>;
    /// Atomically bump the like counter and return the updated record.
    async fn increment_likes(&mut self, id: Uuid) -> StoreResult<Option<Audio>>;
    async fn delete_audios(&mut self, ids: &[Uuid]) -> StoreResult<u64>;

    // categories
    async fn category(&mut self, id: Uuid) -> StoreResult<Option<Category>>;
    async fn categories(&mut self) -> StoreResult<Vec<Category>>;
    async fn insert_category(&mut self, category: &Category) -> StoreResult<()>;
    /// Writes the name.
    async fn update_category(&mut self, category: &Category) -> StoreResult<()>;
    async fn push_category_track(&mut self, category: Uuid, track: Uuid) -> StoreResult<bool>;
    async fn delete_category(&mut self, id: Uuid) -> StoreResult<bool>;
    /// Remove `track` from every category's track list.
    async fn pull_track_from_categories(&mut self, track: Uuid) -> StoreResult<u64>;

    // playlists
    async fn playlist(&mut self, id: Uuid) -> StoreResult<Option<Playlist>>;
    /// Records in the order of `ids`; unknown IDs are skipped.
    async fn playlists_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Playlist>>;
    async fn playlist_by_owner_and_name(&mut self, owner: Uuid, name: &str) -> StoreResult<Option<Playlist>>;
    async fn insert_playlist(&mut self, playlist: &Playlist) -> StoreResult<()>;
    /// Writes the name.
    async fn update_playlist(&mut self, playlist: &Playlist) -> StoreResult<()>;
    /// Append `track` unless already present. False when the playlist is
    /// missing or already holds the track.
    async fn push_playlist_track(&mut self, playlist: Uuid, track: Uuid) -> StoreResult<bool>;
    async fn delete_playlist(&mut self, id: Uuid) -> StoreResult<bool>;
    /// Remove `track` from every playlist's track list.
    async fn pull_track_from_playlists(&mut self, track: Uuid) -> StoreResult<u64>;

    // comments
    /// Records in the order of `ids`; unknown IDs are skipped.
    async fn comments_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Comment>>;
    async fn insert_comment(&mut self, comment: &Comment) -> StoreResult<()>;
    async fn delete_comments(&mut self, ids: &[Uuid]) -> StoreResult<u64>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
