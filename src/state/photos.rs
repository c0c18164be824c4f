use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::data::{PhotoAssociation, TaxonId};
use super::source::PhotoSource;
use crate::config::AppConfig;
use crate::error::{GalleryError, Result};
use crate::photo::thumbnail::{thumbnail_cache_dir, thumbnail_path};

/// Extensions offered by the upload picker
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// A PhotoLibrary is one named photo collection.
/// It owns a `<name>.db` catalog and a folder with copies of the uploaded photos.
pub struct PhotoLibrary {
    name: String,
    conn: Connection,
    db_path: PathBuf,
    image_dir: PathBuf,
    thumbnail_dir: PathBuf,
}

impl PhotoLibrary {
    /// Create a new, empty collection
    pub fn create(config: &AppConfig, name: &str) -> Result<Self> {
        validate_name(name)?;
        let db_path = config.collection_db(name);
        if db_path.exists() {
            return Err(GalleryError::CollectionExists(name.to_string()));
        }

        std::fs::create_dir_all(&config.collections_dir)?;
        let library = Self::connect(config, name, db_path)?;
        tracing::info!("created collection {:?}", name);
        Ok(library)
    }

    /// Open an existing collection
    pub fn open(config: &AppConfig, name: &str) -> Result<Self> {
        validate_name(name)?;
        let db_path = config.collection_db(name);
        if !db_path.is_file() {
            return Err(GalleryError::CollectionNotFound(name.to_string()));
        }

        let library = Self::connect(config, name, db_path)?;
        tracing::info!(
            "loaded collection {:?} ({} photos)",
            name,
            library.photo_count()?
        );
        Ok(library)
    }

    fn connect(config: &AppConfig, name: &str, db_path: PathBuf) -> Result<Self> {
        let conn = Connection::open(&db_path)?;
        let library = PhotoLibrary {
            name: name.to_string(),
            conn,
            db_path,
            image_dir: config.collection_images(name),
            thumbnail_dir: thumbnail_cache_dir(name),
        };
        library.init_schema()?;
        Ok(library)
    }

    /// Create the photos table if it doesn't exist.
    /// taxon_id points into the separate taxonomy database, so it carries no foreign key.
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS photos (
                photo_id    INTEGER PRIMARY KEY AUTOINCREMENT,
                taxon_id    INTEGER NOT NULL,
                filepath    TEXT NOT NULL,
                added_at    INTEGER NOT NULL,
                width       INTEGER,
                height      INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_photos_taxon ON photos(taxon_id);",
        )?;
        Ok(())
    }

    /// The collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Folder the uploaded photos are copied into
    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Folder the gallery thumbnails of this collection are cached in
    pub fn thumbnail_dir(&self) -> &Path {
        &self.thumbnail_dir
    }

    /// Cache thumbnails somewhere other than the user cache directory
    pub fn with_thumbnail_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.thumbnail_dir = dir.into();
        self
    }

    /// Names of all collections in `dir`, sorted
    pub fn list_collections(dir: &Path) -> Vec<String> {
        if !dir.is_dir() {
            return Vec::new();
        }

        let mut names: Vec<String> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("db"))
            })
            .filter_map(|e| {
                e.path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        names.sort();
        names
    }

    /// Get a count of photos in the collection
    pub fn photo_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Attach a photo to a taxon.
    ///
    /// The file must decode as an image. It is copied into the collection's
    /// image folder; an existing file of the same name is never overwritten.
    pub fn add_photo(&self, taxon_id: TaxonId, source: &Path) -> Result<PhotoAssociation> {
        let (width, height) = image::image_dimensions(source).map_err(|e| match e {
            image::ImageError::IoError(io) => GalleryError::Io(io),
            _ => GalleryError::UnsupportedImage(source.to_path_buf()),
        })?;

        let file_name = source
            .file_name()
            .ok_or_else(|| GalleryError::UnsupportedImage(source.to_path_buf()))?
            .to_string_lossy()
            .to_string();

        std::fs::create_dir_all(&self.image_dir)?;
        let added_at = Utc::now().timestamp();
        let mut target = self.image_dir.join(&file_name);
        let mut attempt = 1;
        while target.exists() {
            target = self
                .image_dir
                .join(format!("{}_{}_{}", added_at, attempt, file_name));
            attempt += 1;
        }
        std::fs::copy(source, &target)?;

        let filepath = target.to_string_lossy().to_string();
        if let Err(e) = self.conn.execute(
            "INSERT INTO photos (taxon_id, filepath, added_at, width, height)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![taxon_id, filepath, added_at, width, height],
        ) {
            // No row points at the copy, so it must not outlive the failed insert
            if let Err(cleanup) = std::fs::remove_file(&target) {
                tracing::warn!("could not delete {}: {}", target.display(), cleanup);
            }
            return Err(e.into());
        }
        let photo_id = self.conn.last_insert_rowid();

        tracing::info!(
            "added photo {} ({}x{}) to taxon {}",
            target.display(),
            width,
            height,
            taxon_id
        );

        Ok(PhotoAssociation {
            photo_id,
            taxon_id,
            filepath: target,
            added_at,
            width: Some(width),
            height: Some(height),
        })
    }

    /// Remove a photo association, its copied file and its cached thumbnail.
    /// Returns false if no such photo exists.
    pub fn remove_photo(&self, photo_id: i64) -> Result<bool> {
        let filepath: Option<String> = self
            .conn
            .query_row(
                "SELECT filepath FROM photos WHERE photo_id = ?1",
                [photo_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(filepath) = filepath else {
            return Ok(false);
        };

        self.conn
            .execute("DELETE FROM photos WHERE photo_id = ?1", [photo_id])?;

        // Only delete files we copied in ourselves
        let path = Path::new(&filepath);
        if path.starts_with(&self.image_dir) {
            remove_if_present(path);
        }
        remove_if_present(&thumbnail_path(&self.thumbnail_dir, photo_id));
        Ok(true)
    }

    /// Full association rows for one taxon, in upload order
    pub fn associations_for_taxon(&self, taxon_id: TaxonId) -> Result<Vec<PhotoAssociation>> {
        let mut stmt = self.conn.prepare(
            "SELECT photo_id, taxon_id, filepath, added_at, width, height
             FROM photos WHERE taxon_id = ?1 ORDER BY photo_id",
        )?;

        let photos = stmt
            .query_map([taxon_id], |row| {
                Ok(PhotoAssociation {
                    photo_id: row.get(0)?,
                    taxon_id: row.get(1)?,
                    filepath: PathBuf::from(row.get::<_, String>(2)?),
                    added_at: row.get(3)?,
                    width: row.get(4)?,
                    height: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }
}

impl PhotoSource for PhotoLibrary {
    fn photographed_taxon_ids(&self) -> Result<BTreeSet<TaxonId>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT taxon_id FROM photos")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, TaxonId>(0))?
            .collect::<rusqlite::Result<BTreeSet<TaxonId>>>()?;
        Ok(ids)
    }

    fn photos_for_taxon(&self, taxon_id: TaxonId) -> Result<Vec<PathBuf>> {
        Ok(self
            .associations_for_taxon(taxon_id)?
            .into_iter()
            .map(|p| p.filepath)
            .collect())
    }
}

fn remove_if_present(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("could not delete {}: {}", path.display(), e);
        }
    }
}

/// Collection names become file names, so keep them to a safe alphabet
fn validate_name(name: &str) -> Result<()> {
    let ok = !name.trim().is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ' ');
    if ok {
        Ok(())
    } else {
        Err(GalleryError::InvalidCollectionName(name.to_string()))
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for PhotoLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoLibrary")
            .field("name", &self.name)
            .field("db_path", &self.db_path)
            .field("thumbnail_dir", &self.thumbnail_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::thumbnail::generate_thumbnail;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_create_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());

        assert!(matches!(
            PhotoLibrary::open(&config, "bugs"),
            Err(GalleryError::CollectionNotFound(_))
        ));

        PhotoLibrary::create(&config, "bugs").unwrap();
        assert!(matches!(
            PhotoLibrary::create(&config, "bugs"),
            Err(GalleryError::CollectionExists(_))
        ));

        let library = PhotoLibrary::open(&config, "bugs").unwrap();
        assert_eq!(library.name(), "bugs");
        assert_eq!(library.photo_count().unwrap(), 0);
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());

        for name in ["", "  ", "../escape", "a/b"] {
            assert!(matches!(
                PhotoLibrary::create(&config, name),
                Err(GalleryError::InvalidCollectionName(_))
            ));
        }
    }

    #[test]
    fn test_add_photo_copies_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());
        let library = PhotoLibrary::create(&config, "bugs").unwrap();

        let source = dir.path().join("firebug.png");
        write_png(&source, 8, 4);

        let first = library.add_photo(65491, &source).unwrap();
        let second = library.add_photo(65491, &source).unwrap();
        library.add_photo(7399, &source).unwrap();

        assert_eq!(first.width, Some(8));
        assert_eq!(first.height, Some(4));
        assert!(first.filepath.starts_with(library.image_dir()));
        assert!(first.filepath.exists());
        // Same file name twice must not clobber the first copy
        assert_ne!(first.filepath, second.filepath);

        let ids = library.photographed_taxon_ids().unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![7399, 65491]);
        assert_eq!(
            library.photos_for_taxon(65491).unwrap(),
            vec![first.filepath.clone(), second.filepath.clone()]
        );
        assert!(library.photos_for_taxon(1).unwrap().is_empty());
    }

    #[test]
    fn test_add_photo_rejects_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());
        let library = PhotoLibrary::create(&config, "bugs").unwrap();

        let source = dir.path().join("notes.png");
        std::fs::write(&source, b"definitely not a png").unwrap();

        assert!(matches!(
            library.add_photo(1, &source),
            Err(GalleryError::UnsupportedImage(_))
        ));
        assert_eq!(library.photo_count().unwrap(), 0);
    }

    #[test]
    fn test_remove_photo() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());
        let library = PhotoLibrary::create(&config, "bugs")
            .unwrap()
            .with_thumbnail_dir(dir.path().join("thumbs"));
        let source = dir.path().join("ant.png");
        write_png(&source, 2, 2);

        let photo = library.add_photo(7399, &source).unwrap();
        let thumb = generate_thumbnail(&photo, library.thumbnail_dir()).unwrap();
        assert!(thumb.exists());

        assert!(library.remove_photo(photo.photo_id).unwrap());
        assert!(!photo.filepath.exists());
        assert!(!thumb.exists());
        assert!(source.exists());
        assert!(!library.remove_photo(photo.photo_id).unwrap());
        assert!(library.photographed_taxon_ids().unwrap().is_empty());
    }

    #[test]
    fn test_failed_insert_leaves_no_copy() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());
        let library = PhotoLibrary::create(&config, "bugs").unwrap();
        let source = dir.path().join("wasp.png");
        write_png(&source, 2, 2);

        library.conn.execute_batch("DROP TABLE photos").unwrap();

        assert!(matches!(
            library.add_photo(7399, &source),
            Err(GalleryError::Database(_))
        ));
        let leftovers = std::fs::read_dir(library.image_dir()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_list_collections() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());

        assert!(PhotoLibrary::list_collections(&config.collections_dir).is_empty());

        PhotoLibrary::create(&config, "moths").unwrap();
        PhotoLibrary::create(&config, "beetles").unwrap();
        std::fs::write(config.collections_dir.join("readme.txt"), "x").unwrap();

        assert_eq!(
            PhotoLibrary::list_collections(&config.collections_dir),
            vec!["beetles", "moths"]
        );
    }
}
