use serde::Serialize;
use uuid::Uuid;

/// Name of the per-user favourites playlist created at signup.
pub const LIKED_PLAYLIST_NAME: &str = "Liked";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub tracks: Vec<Uuid>,
    pub owner: Uuid,
}

impl Playlist {
    pub fn new(name: String, owner: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            tracks: Vec::new(),
            owner,
        }
    }

    pub fn liked(owner: Uuid) -> Self {
        Self::new(LIKED_PLAYLIST_NAME.to_string(), owner)
    }

    pub fn is_liked(&self) -> bool {
        self.name == LIKED_PLAYLIST_NAME
    }

    pub fn contains(&self, track: Uuid) -> bool {
        self.tracks.contains(&track)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner == user_id
    }
}
