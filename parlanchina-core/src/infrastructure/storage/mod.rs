//! Default collaborator implementations: sessions in memory, images on disk.

pub mod chat;
pub mod error;
pub mod images;

pub use chat::{ChatStore, InMemoryChatStore};
pub use error::{ImageStoreError, StoreError};
pub use images::{FsImageStore, ImageMeta, ImageStore};
