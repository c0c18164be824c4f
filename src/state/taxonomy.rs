use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::data::{Taxon, TaxonId};
use super::source::TaxonSource;
use crate::error::{GalleryError, Result};

/// SQLite caps the number of bound parameters per statement
const MAX_IDS_PER_QUERY: usize = 500;

const TAXON_COLUMNS: &str = "taxon_id, taxon_name, taxon_rank, parent_id";

/// The TaxonomyDb wraps the read-mostly classification database.
/// It is written once by `import-taxonomy` and only queried afterwards.
pub struct TaxonomyDb {
    conn: Connection,
    db_path: PathBuf,
}

impl TaxonomyDb {
    /// Open (or create) the taxonomy database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::info!("taxonomy database opened at {}", path.display());

        let db = TaxonomyDb {
            conn,
            db_path: path.to_path_buf(),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Throwaway database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let db = TaxonomyDb {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Create the taxons table and its indexes if they don't exist
    fn init_schema(&self) -> Result<()> {
        // NULL parent_id marks a root of the classification
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS taxons (
                taxon_id    INTEGER PRIMARY KEY,
                taxon_rank  TEXT NOT NULL,
                taxon_name  TEXT NOT NULL,
                parent_id   INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_taxons_parent ON taxons(parent_id);
            CREATE INDEX IF NOT EXISTS idx_taxons_name ON taxons(taxon_name);",
        )?;
        Ok(())
    }

    /// Insert (or replace) a batch of taxa in a single transaction
    pub fn insert_taxa(&mut self, taxa: &[Taxon]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO taxons (taxon_id, taxon_rank, taxon_name, parent_id)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for taxon in taxa {
                stmt.execute(rusqlite::params![
                    taxon.id,
                    taxon.rank,
                    taxon.name,
                    taxon.parent_id
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!("stored {} taxa", taxa.len());
        Ok(taxa.len())
    }

    /// Get a count of taxa in the database
    pub fn taxon_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM taxons", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Exact name lookup. Homonyms resolve to the lowest id.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Taxon>> {
        let taxon = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM taxons WHERE taxon_name = ?1 ORDER BY taxon_id LIMIT 1",
                    TAXON_COLUMNS
                ),
                [name],
                taxon_from_row,
            )
            .optional()?;
        Ok(taxon)
    }

    /// Like `find_by_name`, but an unknown name is an error
    pub fn require_by_name(&self, name: &str) -> Result<Taxon> {
        self.find_by_name(name)?
            .ok_or_else(|| GalleryError::TaxonNotFound(name.to_string()))
    }

    /// Case-insensitive substring search over names, shortest names first
    pub fn search_names(&self, query: &str, limit: usize) -> Result<Vec<Taxon>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{}%", escaped);

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM taxons
             WHERE taxon_name LIKE ?1 ESCAPE '\\'
             ORDER BY length(taxon_name), taxon_name
             LIMIT ?2",
            TAXON_COLUMNS
        ))?;

        let taxa = stmt
            .query_map(rusqlite::params![pattern, limit as i64], taxon_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(taxa)
    }
}

fn taxon_from_row(row: &Row<'_>) -> rusqlite::Result<Taxon> {
    Ok(Taxon {
        id: row.get(0)?,
        name: row.get(1)?,
        rank: row.get(2)?,
        parent_id: row.get(3)?,
    })
}

impl TaxonSource for TaxonomyDb {
    fn parent_of(&self, id: TaxonId) -> Result<Option<TaxonId>> {
        self.conn
            .query_row(
                "SELECT parent_id FROM taxons WHERE taxon_id = ?1",
                [id],
                |row| row.get::<_, Option<TaxonId>>(0),
            )
            .optional()?
            .ok_or(GalleryError::DanglingReference { taxon_id: id })
    }

    fn taxa_by_ids(&self, ids: &BTreeSet<TaxonId>) -> Result<Vec<Taxon>> {
        let ids: Vec<TaxonId> = ids.iter().copied().collect();
        let mut taxa = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {} FROM taxons WHERE taxon_id IN ({}) ORDER BY taxon_id",
                TAXON_COLUMNS, placeholders
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), taxon_from_row)?;
            for taxon in rows {
                taxa.push(taxon?);
            }
        }

        tracing::debug!("fetched {} of {} requested taxa", taxa.len(), ids.len());
        Ok(taxa)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for TaxonomyDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyDb")
            .field("db_path", &self.db_path)
            .finish()
    }
}
