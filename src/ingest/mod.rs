/// Taxonomy ingestion
///
/// Turns an indented classification dump into flat `Taxon` records with
/// explicit parent references, ready for `TaxonomyDb::insert_taxa`.

pub mod dump;

pub use dump::{parse_dump, DumpReport};
