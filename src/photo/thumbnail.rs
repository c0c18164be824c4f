use image::{imageops::FilterType, DynamicImage};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::state::data::PhotoAssociation;

/// Size of generated thumbnails (bounding square)
pub const THUMBNAIL_SIZE: u32 = 256;

/// Get the thumbnail cache directory of a collection
/// Returns ~/.cache/arthropod-gallery/thumbnails/<collection> on Linux
pub fn thumbnail_cache_dir(collection: &str) -> PathBuf {
    let mut path = dirs_next::cache_dir()
        .or_else(dirs_next::home_dir)
        .unwrap_or_else(std::env::temp_dir);

    path.push("arthropod-gallery");
    path.push("thumbnails");
    path.push(collection);
    path
}

/// Get the thumbnail path for a photo ID (doesn't generate, just returns the expected path)
pub fn thumbnail_path(cache_dir: &Path, photo_id: i64) -> PathBuf {
    cache_dir.join(format!("{}.jpg", photo_id))
}

/// Generate (or reuse) the cached thumbnail for one photo
pub fn generate_thumbnail(photo: &PhotoAssociation, cache_dir: &Path) -> Result<PathBuf> {
    let target = thumbnail_path(cache_dir, photo.photo_id);
    if target.exists() {
        return Ok(target);
    }

    fs::create_dir_all(cache_dir)?;

    let img = image::open(&photo.filepath)?;
    let thumbnail = img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3);

    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(thumbnail.to_rgb8()).save(&target)?;

    tracing::debug!("generated thumbnail: {}", target.display());
    Ok(target)
}

/// Thumbnails for a whole gallery, generated on a blocking worker.
///
/// A photo whose thumbnail cannot be made is shown from its original file.
pub async fn load_thumbnails(photos: Vec<PhotoAssociation>, cache_dir: PathBuf) -> Vec<PathBuf> {
    let originals: Vec<PathBuf> = photos.iter().map(|p| p.filepath.clone()).collect();

    let result = tokio::task::spawn_blocking(move || {
        photos
            .iter()
            .map(|photo| match generate_thumbnail(photo, &cache_dir) {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(
                        "thumbnail failed for {}: {}",
                        photo.filepath.display(),
                        e
                    );
                    photo.filepath.clone()
                }
            })
            .collect::<Vec<_>>()
    })
    .await;

    match result {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!("thumbnail worker failed: {}", e);
            originals
        }
    }
}
