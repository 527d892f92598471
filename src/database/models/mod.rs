pub mod audio;
pub mod category;
pub mod comment;
pub mod playlist;
pub mod user;

pub use audio::Audio;
pub use category::Category;
pub use comment::Comment;
pub use playlist::{Playlist, LIKED_PLAYLIST_NAME};
pub use user::{Role, User};
