//! Arthropod Gallery core
//!
//! Everything behind the desktop application that is not a widget:
//! the taxonomy and photo stores, the tree pipeline (ancestor closure,
//! forest assembly, layout), taxonomy ingestion and gallery thumbnails.

pub mod config;
pub mod error;
pub mod ingest;
pub mod photo;
pub mod state;
pub mod tree;

pub use error::{GalleryError, Result};

/// Install the `tracing` subscriber used by both binaries.
///
/// Filter from `ARTHROPOD_GALLERY_LOG`, then `RUST_LOG`, then `info`.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = std::env::var("ARTHROPOD_GALLERY_LOG")
        .ok()
        .and_then(|filter| EnvFilter::try_new(filter).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
