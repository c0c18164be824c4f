/// Stores → closure → forest → layout, run synchronously per "view tree" action
use super::closure::resolve_closure;
use super::forest::build_forest;
use super::layout::{layout, TreeLayout};
use super::measure::TextMeasurer;
use crate::config::LayoutConfig;
use crate::error::Result;
use crate::state::source::{PhotoSource, TaxonSource};

/// Compute the tree view of every photographed taxon and its ancestors.
///
/// Data-integrity errors abort the whole view; label failures only drop
/// the affected boxes (see `TreeLayout::failures`).
pub fn build_tree_view(
    taxa: &impl TaxonSource,
    photos: &impl PhotoSource,
    measurer: &impl TextMeasurer,
    config: &LayoutConfig,
) -> Result<TreeLayout> {
    let photographed = photos.photographed_taxon_ids()?;
    let closure = resolve_closure(&photographed, taxa)?;
    let forest = build_forest(&closure, taxa, &photographed)?;
    let view = layout(&forest, measurer, config);

    tracing::info!(
        "tree view: {} photographed taxa, {} nodes in {} trees",
        photographed.len(),
        view.boxes.len(),
        forest.len()
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::GalleryError;
    use crate::state::data::Taxon;
    use crate::state::photos::PhotoLibrary;
    use crate::state::taxonomy::TaxonomyDb;
    use crate::tree::measure::MonospaceMeasurer;
    use std::path::Path;

    fn write_png(path: &Path) {
        image::RgbImage::from_pixel(4, 4, image::Rgb([10, 120, 10]))
            .save(path)
            .unwrap();
    }

    fn taxonomy() -> TaxonomyDb {
        let mut db = TaxonomyDb::open_in_memory().unwrap();
        db.insert_taxa(&[
            Taxon::new(1, "Arthropoda", "phylum", None),
            Taxon::new(2, "Insecta", "class", Some(1)),
            Taxon::new(3, "Hemiptera", "order", Some(2)),
            Taxon::new(4, "Arachnida", "class", Some(1)),
            Taxon::new(5, "Hymenoptera", "order", Some(2)),
        ])
        .unwrap();
        db
    }

    #[test]
    fn test_view_over_sqlite_stores() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());
        let taxa = taxonomy();
        let photos = PhotoLibrary::create(&config, "bugs").unwrap();
        let source = dir.path().join("bug.png");
        write_png(&source);
        photos.add_photo(3, &source).unwrap();
        photos.add_photo(5, &source).unwrap();

        let view = build_tree_view(
            &taxa,
            &photos,
            &MonospaceMeasurer::default(),
            &config.layout,
        )
        .unwrap();

        let mut ids: Vec<_> = view.boxes.iter().map(|b| b.taxon_id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 5]);
        assert_eq!(view.lines.len(), 3);

        let interactive: Vec<_> = view
            .boxes
            .iter()
            .filter(|b| b.is_interactive)
            .map(|b| b.taxon_id)
            .collect();
        assert_eq!(interactive, vec![3, 5]);

        let hemiptera = view.find(3).unwrap();
        let hit = view
            .hit_test(hemiptera.center_x(), hemiptera.y + 1.0)
            .unwrap();
        assert_eq!(photos.photos_for_taxon(hit.taxon_id).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_collection_gives_empty_view() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());
        let photos = PhotoLibrary::create(&config, "empty").unwrap();

        let view = build_tree_view(
            &taxonomy(),
            &photos,
            &MonospaceMeasurer::default(),
            &config.layout,
        )
        .unwrap();
        assert!(view.is_empty());
        assert!(view.lines.is_empty());
    }

    #[test]
    fn test_photo_on_unknown_taxon_aborts_view() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::rooted_at(dir.path());
        let photos = PhotoLibrary::create(&config, "bugs").unwrap();
        let source = dir.path().join("bug.png");
        write_png(&source);
        photos.add_photo(999, &source).unwrap();

        let result = build_tree_view(
            &taxonomy(),
            &photos,
            &MonospaceMeasurer::default(),
            &config.layout,
        );
        assert!(matches!(
            result,
            Err(GalleryError::DanglingReference { taxon_id: 999 })
        ));
    }
}
