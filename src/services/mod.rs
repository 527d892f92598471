pub mod audio_service;
pub mod cascade;
pub mod category_service;
pub mod file_storage;
pub mod playlist_service;
pub mod policy;
pub mod user_service;
pub mod validation;

pub use audio_service::AudioService;
pub use category_service::CategoryService;
pub use file_storage::{FileStorage, MediaKind, StagedUpload, StorageError, UploadedFile};
pub use playlist_service::PlaylistService;
pub use user_service::UserService;
