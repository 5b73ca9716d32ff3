pub mod database;
pub mod error;
pub mod http;
pub mod interactions;
pub mod media;
pub mod utils;

pub use database::Store;
pub use error::{GalleryError, Result};
pub use http::{build_router, AppState};
pub use interactions::InteractionEngine;
pub use utils::config::{ServerConfig, StoreConfig};
