/// Error type shared by the taxonomy pipeline, the stores and the importer
use std::path::PathBuf;

use thiserror::Error;

use crate::state::data::TaxonId;

/// Everything that can go wrong between the databases and the tree view
#[derive(Debug, Error)]
pub enum GalleryError {
    /// A taxon (or a parent it points at) has no row in the taxonomy
    #[error("taxon {taxon_id} is referenced but has no record in the taxonomy")]
    DanglingReference { taxon_id: TaxonId },

    /// A node label could not be measured; only that node is dropped
    #[error("cannot measure label {label:?}: {reason}")]
    Measurement { label: String, reason: String },

    #[error("taxon not found: {0}")]
    TaxonNotFound(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("collection already exists: {0}")]
    CollectionExists(String),

    #[error("invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    /// Malformed line in a taxonomy dump
    #[error("line {line}: {reason}")]
    Ingest { line: usize, reason: String },

    #[error("not a supported image: {}", .0.display())]
    UnsupportedImage(PathBuf),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, GalleryError>;
