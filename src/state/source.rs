/// Read-only query seams consumed by the tree pipeline
///
/// The SQLite stores implement these for the application; `TaxonIndex`
/// implements `TaxonSource` in memory for the importer and for tests.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use super::data::{Taxon, TaxonId};
use crate::error::{GalleryError, Result};

/// Lookup of taxon records
pub trait TaxonSource {
    /// Parent of `id` (None for a root).
    ///
    /// Fails with `DanglingReference` when `id` has no record.
    fn parent_of(&self, id: TaxonId) -> Result<Option<TaxonId>>;

    /// All records whose id is in `ids`, fetched in one batch.
    /// Ids without a record are simply absent from the result.
    fn taxa_by_ids(&self, ids: &BTreeSet<TaxonId>) -> Result<Vec<Taxon>>;
}

/// Lookup of photo associations
pub trait PhotoSource {
    /// Every taxon id that has at least one photo
    fn photographed_taxon_ids(&self) -> Result<BTreeSet<TaxonId>>;

    /// File paths of all photos attached to `taxon_id`, in upload order
    fn photos_for_taxon(&self, taxon_id: TaxonId) -> Result<Vec<PathBuf>>;
}

/// In-memory taxonomy keyed by id
#[derive(Debug, Clone, Default)]
pub struct TaxonIndex {
    taxa: HashMap<TaxonId, Taxon>,
}

impl TaxonIndex {
    pub fn new(taxa: impl IntoIterator<Item = Taxon>) -> Self {
        Self {
            taxa: taxa.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    pub fn get(&self, id: TaxonId) -> Option<&Taxon> {
        self.taxa.get(&id)
    }
}

impl TaxonSource for TaxonIndex {
    fn parent_of(&self, id: TaxonId) -> Result<Option<TaxonId>> {
        self.taxa
            .get(&id)
            .map(|t| t.parent_id)
            .ok_or(GalleryError::DanglingReference { taxon_id: id })
    }

    fn taxa_by_ids(&self, ids: &BTreeSet<TaxonId>) -> Result<Vec<Taxon>> {
        Ok(ids.iter().filter_map(|id| self.taxa.get(id).cloned()).collect())
    }
}
