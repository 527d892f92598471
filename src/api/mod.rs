pub mod format;

pub use format::{AudioDetail, CategoryDetail, PlaylistDetail};
