pub mod audios;
pub mod categories;
pub mod playlists;
pub mod system;
pub mod users;
