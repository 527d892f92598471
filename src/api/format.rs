/// Public response shapes for records whose references are resolved
/// before they leave the service layer.
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Audio, Category, Comment, Playlist};

/// Audio with its comment records in place of comment IDs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDetail {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub track: String,
    pub image: String,
    pub views: i64,
    pub likes: i64,
    pub comments: Vec<Comment>,
    pub category: Uuid,
}

impl AudioDetail {
    pub fn new(audio: Audio, comments: Vec<Comment>) -> Self {
        Self {
            id: audio.id,
            title: audio.title,
            artist: audio.artist,
            track: audio.track,
            image: audio.image,
            views: audio.views,
            likes: audio.likes,
            comments,
            category: audio.category,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    pub category_id: Uuid,
    pub category_name: String,
    pub category_tracks: Vec<Audio>,
}

impl CategoryDetail {
    pub fn new(category: Category, tracks: Vec<Audio>) -> Self {
        Self {
            category_id: category.id,
            category_name: category.name,
            category_tracks: tracks,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub playlist_id: Uuid,
    pub playlist_name: String,
    pub owner: Uuid,
    pub playlist_tracks: Vec<Audio>,
}

impl PlaylistDetail {
    pub fn new(playlist: Playlist, tracks: Vec<Audio>) -> Self {
        Self {
            playlist_id: playlist.id,
            playlist_name: playlist.name,
            owner: playlist.owner,
            playlist_tracks: tracks,
        }
    }
}
