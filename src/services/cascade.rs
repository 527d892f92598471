/// Reference cleanup run inside a single session, so a failure part-way
/// leaves every collection untouched.
use uuid::Uuid;

use crate::database::models::{Audio, Category, Playlist};
use crate::database::{Session, StoreResult};

/// Drop the audio's comments and pull it out of every playlist and category.
async fn detach_audio(session: &mut dyn Session, audio: &Audio) -> StoreResult<()> {
    if !audio.comments.is_empty() {
        session.delete_comments(&audio.comments).await?;
    }
    session.pull_track_from_playlists(audio.id).await?;
    session.pull_track_from_categories(audio.id).await?;
    Ok(())
}

pub async fn delete_audio(session: &mut dyn Session, audio: &Audio) -> StoreResult<()> {
    detach_audio(session, audio).await?;
    session.delete_audios(&[audio.id]).await?;
    Ok(())
}

/// Delete a category together with every audio it lists. Returns the removed
/// audios so their media files can be unlinked after commit.
pub async fn delete_category(session: &mut dyn Session, category: &Category) -> StoreResult<Vec<Audio>> {
    let audios = session.audios_by_ids(&category.tracks).await?;
    for audio in &audios {
        detach_audio(session, audio).await?;
    }

    let ids: Vec<Uuid> = audios.iter().map(|a| a.id).collect();
    session.delete_audios(&ids).await?;
    session.delete_category(category.id).await?;
    Ok(audios)
}

pub async fn delete_playlist(session: &mut dyn Session, playlist: &Playlist) -> StoreResult<()> {
    session.pull_user_playlist(playlist.owner, playlist.id).await?;
    session.delete_playlist(playlist.id).await?;
    Ok(())
}
