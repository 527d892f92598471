use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Audio {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    /// Relative path of the uploaded audio file.
    pub track: String,
    /// Relative path of the uploaded cover image.
    pub image: String,
    pub views: i64,
    pub likes: i64,
    pub comments: Vec<Uuid>,
    pub category: Uuid,
}

impl Audio {
    pub fn new(title: String, artist: String, track: String, image: String, category: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            artist,
            track,
            image,
            views: 0,
            likes: 0,
            comments: Vec::new(),
            category,
        }
    }

    /// Paths of the media files backing this record.
    pub fn media_paths(&self) -> [&str; 2] {
        [self.track.as_str(), self.image.as_str()]
    }
}
