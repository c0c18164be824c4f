/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the database layer, the tree pipeline and the UI layer.

use std::path::PathBuf;

/// Database ID of a taxon (the NCBI-style numeric id from the dump)
pub type TaxonId = i64;

/// Represents a single taxon in the classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxon {
    pub id: TaxonId,
    /// Latin name (e.g., "Pyrrhocoris apterus")
    pub name: String,
    /// Taxonomic level (e.g., "genus")
    pub rank: String,
    /// None for a root of the classification
    pub parent_id: Option<TaxonId>,
}

impl Taxon {
    pub fn new(id: TaxonId, name: &str, rank: &str, parent_id: Option<TaxonId>) -> Self {
        Self {
            id,
            name: name.to_string(),
            rank: rank.to_string(),
            parent_id,
        }
    }
}

/// A photo attached to a taxon inside one collection
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoAssociation {
    /// Unique database ID within the collection
    pub photo_id: i64,
    pub taxon_id: TaxonId,
    /// Path to the copy stored under the collection's image folder
    pub filepath: PathBuf,
    /// Unix timestamp of the upload
    pub added_at: i64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}
