use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::models::{Audio, Category, Comment, Playlist, User};
use super::repository::{Session, Store, StoreError, StoreResult};

#[derive(Debug, Default, Clone)]
struct Collections {
    users: Vec<User>,
    audios: Vec<Audio>,
    categories: Vec<Category>,
    playlists: Vec<Playlist>,
    comments: Vec<Comment>,
}

/// Process-local store for development and tests.
///
/// Sessions are serialized: a session owns the collection lock for its whole
/// lifetime. Reads go to the live data until the first write, which stages a
/// copy that replaces the live data on commit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn Session>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(MemorySession { guard, staged: None }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

struct MemorySession {
    guard: OwnedMutexGuard<Collections>,
    /// Copy of the live data, taken on the first write
    staged: Option<Collections>,
}

impl MemorySession {
    fn view(&self) -> &Collections {
        self.staged.as_ref().unwrap_or(&*self.guard)
    }

    fn stage(&mut self) -> &mut Collections {
        let live = &self.guard;
        self.staged.get_or_insert_with(|| Collections::clone(live))
    }
}

fn pick<T: Clone>(items: &[T], ids: &[Uuid], id_of: impl Fn(&T) -> Uuid) -> Vec<T> {
    ids.iter()
        .filter_map(|id| items.iter().find(|item| id_of(item) == *id).cloned())
        .collect()
}

fn find_mut<T>(items: &mut [T], id: Uuid, id_of: impl Fn(&T) -> Uuid) -> Option<&mut T> {
    items.iter_mut().find(|item| id_of(item) == id)
}

fn pull_everywhere<T>(items: &mut [T], value: Uuid, list_of: impl Fn(&mut T) -> &mut Vec<Uuid>) -> u64 {
    let mut touched = 0;
    for item in items.iter_mut() {
        let list = list_of(item);
        let before = list.len();
        list.retain(|v| *v != value);
        if list.len() != before {
            touched += 1;
        }
    }
    touched
}

fn remove_ids<T>(items: &mut Vec<T>, ids: &[Uuid], id_of: impl Fn(&T) -> Uuid) -> u64 {
    let before = items.len();
    items.retain(|item| !ids.contains(&id_of(item)));
    (before - items.len()) as u64
}

#[async_trait]
impl Session for MemorySession {
    async fn user(&mut self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.view().users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.view().users.iter().find(|u| u.email == email).cloned())
    }

    async fn users(&mut self) -> StoreResult<Vec<User>> {
        Ok(self.view().users.clone())
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        if self.view().users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email.clone()));
        }
        self.stage().users.push(user.clone());
        Ok(())
    }

    async fn update_user(&mut self, user: &User) -> StoreResult<()> {
        if let Some(stored) = find_mut(&mut self.stage().users, user.id, |u| u.id) {
            stored.name = user.name.clone();
            stored.image = user.image.clone();
            stored.role = user.role;
            stored.is_banned = user.is_banned;
        }
        Ok(())
    }

    async fn push_user_playlist(&mut self, user: Uuid, playlist: Uuid) -> StoreResult<bool> {
        Ok(find_mut(&mut self.stage().users, user, |u| u.id)
            .map(|u| u.playlists.push(playlist))
            .is_some())
    }

    async fn pull_user_playlist(&mut self, user: Uuid, playlist: Uuid) -> StoreResult<bool> {
        Ok(match find_mut(&mut self.stage().users, user, |u| u.id) {
            Some(u) => {
                let before = u.playlists.len();
                u.playlists.retain(|p| *p != playlist);
                u.playlists.len() != before
            }
            None => false,
        })
    }

    async fn audio(&mut self, id: Uuid) -> StoreResult<Option<Audio>> {
        Ok(self.view().audios.iter().find(|a| a.id == id).cloned())
    }

    async fn audios(&mut self) -> StoreResult<Vec<Audio>> {
        Ok(self.view().audios.clone())
    }

    async fn audios_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Audio>> {
        Ok(pick(&self.view().audios, ids, |a| a.id))
    }

    async fn audios_by_title(&mut self, title: &str) -> StoreResult<Vec<Audio>> {
        Ok(self
            .view()
            .audios
            .iter()
            .filter(|a| a.title == title)
            .cloned()
            .collect())
    }

    async fn insert_audio(&mut self, audio: &Audio) -> StoreResult<()> {
        self.stage().audios.push(audio.clone());
        Ok(())
    }

    async fn update_audio(&mut self, audio: &Audio) -> StoreResult<()> {
        if let Some(stored) = find_mut(&mut self.stage().audios, audio.id, |a| a.id) {
            stored.title = audio.title.clone();
            stored.artist = audio.artist.clone();
            stored.track = audio.track.clone();
            stored.image = audio.image.clone();
            stored.category = audio.category;
        }
        Ok(())
    }

    async fn push_audio_comment(&mut self, audio: Uuid, comment: Uuid) -> StoreResult<bool> {
        Ok(find_mut(&mut self.stage().audios, audio, |a| a.id)
            .map(|a| a.comments.push(comment))
            .is_some())
    }

    async fn increment_views(&mut self, id: Uuid) -> StoreResult<Option<Audio>> {
        Ok(find_mut(&mut self.stage().audios, id, |a| a.id).map(|audio| {
            audio.views += 1;
            audio.clone()
        }))
    }

    async fn increment_likes(&mut self, id: Uuid) -> StoreResult<Option<Audio>> {
        Ok(find_mut(&mut self.stage().audios, id, |a| a.id).map(|audio| {
            audio.likes += 1;
            audio.clone()
        }))
    }

    async fn delete_audios(&mut self, ids: &[Uuid]) -> StoreResult<u64> {
        Ok(remove_ids(&mut self.stage().audios, ids, |a| a.id))
    }

    async fn category(&mut self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.view().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn categories(&mut self) -> StoreResult<Vec<Category>> {
        Ok(self.view().categories.clone())
    }

    async fn insert_category(&mut self, category: &Category) -> StoreResult<()> {
        self.stage().categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&mut self, category: &Category) -> StoreResult<()> {
        if let Some(stored) = find_mut(&mut self.stage().categories, category.id, |c| c.id) {
            stored.name = category.name.clone();
        }
        Ok(())
    }

    async fn push_category_track(&mut self, category: Uuid, track: Uuid) -> StoreResult<bool> {
        Ok(find_mut(&mut self.stage().categories, category, |c| c.id)
            .map(|c| c.tracks.push(track))
            .is_some())
    }

    async fn delete_category(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(remove_ids(&mut self.stage().categories, &[id], |c| c.id) > 0)
    }

    async fn pull_track_from_categories(&mut self, track: Uuid) -> StoreResult<u64> {
        Ok(pull_everywhere(&mut self.stage().categories, track, |c| &mut c.tracks))
    }

    async fn playlist(&mut self, id: Uuid) -> StoreResult<Option<Playlist>> {
        Ok(self.view().playlists.iter().find(|p| p.id == id).cloned())
    }

    async fn playlists_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Playlist>> {
        Ok(pick(&self.view().playlists, ids, |p| p.id))
    }

    async fn playlist_by_owner_and_name(&mut self, owner: Uuid, name: &str) -> StoreResult<Option<Playlist>> {
        Ok(self
            .view()
            .playlists
            .iter()
            .find(|p| p.owner == owner && p.name == name)
            .cloned())
    }

    async fn insert_playlist(&mut self, playlist: &Playlist) -> StoreResult<()> {
        self.stage().playlists.push(playlist.clone());
        Ok(())
    }

    async fn update_playlist(&mut self, playlist: &Playlist) -> StoreResult<()> {
        if let Some(stored) = find_mut(&mut self.stage().playlists, playlist.id, |p| p.id) {
            stored.name = playlist.name.clone();
        }
        Ok(())
    }

    async fn push_playlist_track(&mut self, playlist: Uuid, track: Uuid) -> StoreResult<bool> {
        Ok(match find_mut(&mut self.stage().playlists, playlist, |p| p.id) {
            Some(p) if !p.contains(track) => {
                p.tracks.push(track);
                true
            }
            _ => false,
        })
    }

    async fn delete_playlist(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(remove_ids(&mut self.stage().playlists, &[id], |p| p.id) > 0)
    }

    async fn pull_track_from_playlists(&mut self, track: Uuid) -> StoreResult<u64> {
        Ok(pull_everywhere(&mut self.stage().playlists, track, |p| &mut p.tracks))
    }

    async fn comments_by_ids(&mut self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        Ok(pick(&self.view().comments, ids, |c| c.id))
    }

    async fn insert_comment(&mut self, comment: &Comment) -> StoreResult<()> {
        self.stage().comments.push(comment.clone());
        Ok(())
    }

    async fn delete_comments(&mut self, ids: &[Uuid]) -> StoreResult<u64> {
        Ok(remove_ids(&mut self.stage().comments, ids, |c| c.id))
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemorySession { mut guard, staged } = *self;
        if let Some(staged) = staged {
            *guard = staged;
        }
        Ok(())
    }
}
