/// Application configuration
///
/// Paths to the taxonomy and the photo collections, plus the constants
/// that drive the tree layout. Stored as JSON in the data directory:
/// - Linux: ~/.local/share/arthropod-gallery/config.json
/// - macOS: ~/Library/Application Support/arthropod-gallery/config.json
/// - Windows: %APPDATA%\arthropod-gallery\config.json
///
/// `ARTHROPOD_GALLERY_HOME` overrides the data directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GalleryError, Result};

/// Environment variable that relocates the data directory
pub const HOME_ENV: &str = "ARTHROPOD_GALLERY_HOME";

const CONFIG_FILE: &str = "config.json";

/// Geometry constants for the tree layout
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance between the tops of two consecutive ranks
    pub row_height: f32,
    /// Gap between two sibling subtrees
    pub h_spacing: f32,
    /// Horizontal padding on each side of a label
    pub pad_x: f32,
    /// Vertical padding above and below a label
    pub pad_y: f32,
    /// Label font size in pixels
    pub font_size: f32,
    /// Average glyph advance as a fraction of the font size
    pub char_width_factor: f32,
    /// Line height as a fraction of the font size
    pub line_height_factor: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            row_height: 75.0,
            h_spacing: 50.0,
            pad_x: 10.0,
            pad_y: 5.0,
            font_size: 13.0,
            char_width_factor: 0.6,
            line_height_factor: 1.2,
        }
    }
}

impl LayoutConfig {
    /// Convert to JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string; missing fields take their defaults
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Top-level configuration.
///
/// Fields missing from `config.json` take their defaults relative to the
/// directory the file was loaded from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Taxonomy database produced by `import-taxonomy`
    pub taxonomy_db: PathBuf,
    /// Folder holding one `<name>.db` per photo collection
    pub collections_dir: PathBuf,
    /// Folder holding one sub-folder of copied photos per collection
    pub images_dir: PathBuf,
    /// Number of thumbnails per row in the gallery
    pub gallery_columns: usize,
    pub layout: LayoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::rooted_at(&data_dir())
    }
}

impl AppConfig {
    /// Default configuration with every path under `dir`
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            taxonomy_db: dir.join("taxonomy.db"),
            collections_dir: dir.join("databases"),
            images_dir: dir.join("images"),
            gallery_columns: 3,
            layout: LayoutConfig::default(),
        }
    }

    /// Load `config.json` from the data directory, or defaults if it is absent
    pub fn load() -> Result<Self> {
        Self::load_from(&data_dir())
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = config_file(dir);
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::rooted_at(dir));
        }

        let json = std::fs::read_to_string(&path)?;
        let serde_json::Value::Object(overrides) = serde_json::from_str::<serde_json::Value>(&json)? else {
            return Err(GalleryError::Json(serde::de::Error::custom(
                "config root must be a JSON object",
            )));
        };

        // Top-level keys replace the defaults; nested layout keys fall back per field
        let mut merged = serde_json::to_value(Self::rooted_at(dir))?;
        if let Some(defaults) = merged.as_object_mut() {
            defaults.extend(overrides);
        }

        let config: AppConfig = serde_json::from_value(merged)?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the configuration to `config.json` in the data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&data_dir())
    }

    /// Write the configuration to `config.json` in `dir`
    pub fn save_to(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = config_file(dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        tracing::info!("saved config to {}", path.display());
        Ok(())
    }

    /// Path of a collection's database file
    pub fn collection_db(&self, name: &str) -> PathBuf {
        self.collections_dir.join(format!("{}.db", name))
    }

    /// Folder the photos of a collection are copied into
    pub fn collection_images(&self, name: &str) -> PathBuf {
        self.images_dir.join(name)
    }
}

/// Location of `config.json` inside `dir`
pub fn config_file(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// Get the directory where the application keeps its data
pub fn data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(home);
    }

    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    path.push("arthropod-gallery");
    path
}
