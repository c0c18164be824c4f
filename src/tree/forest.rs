/// Forest assembly from a pruned set of taxon ids
use std::collections::{BTreeSet, HashMap};

use super::node::TreeNode;
use crate::error::{GalleryError, Result};
use crate::state::data::{Taxon, TaxonId};
use crate::state::source::TaxonSource;

/// Build rooted trees out of the taxa in `closure`.
///
/// A taxon becomes a root when its parent is not itself in `closure`.
/// Children keep the order in which the source returned the records.
/// Every id of `closure` must have a record, otherwise the build fails
/// with `DanglingReference` and no partial forest is returned.
pub fn build_forest(
    closure: &BTreeSet<TaxonId>,
    taxa: &impl TaxonSource,
    photographed: &BTreeSet<TaxonId>,
) -> Result<Vec<TreeNode>> {
    if closure.is_empty() {
        return Ok(Vec::new());
    }

    let mut records: Vec<Option<Taxon>> = Vec::with_capacity(closure.len());
    let mut slot_of: HashMap<TaxonId, usize> = HashMap::with_capacity(closure.len());
    for taxon in taxa.taxa_by_ids(closure)? {
        // Ignore rows outside the request and repeated rows
        if !closure.contains(&taxon.id) || slot_of.contains_key(&taxon.id) {
            continue;
        }
        slot_of.insert(taxon.id, records.len());
        records.push(Some(taxon));
    }

    if let Some(&missing) = closure.iter().find(|id| !slot_of.contains_key(id)) {
        return Err(GalleryError::DanglingReference { taxon_id: missing });
    }

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (slot, taxon) in records.iter().enumerate() {
        let parent_slot = taxon
            .as_ref()
            .and_then(|t| t.parent_id)
            .and_then(|parent| slot_of.get(&parent).copied());
        match parent_slot {
            Some(parent) => children.entry(parent).or_default().push(slot),
            None => roots.push(slot),
        }
    }

    let forest: Vec<TreeNode> = roots
        .into_iter()
        .filter_map(|slot| assemble(slot, &mut records, &children, photographed))
        .collect();

    tracing::debug!(
        "built forest of {} roots from {} taxa",
        forest.len(),
        closure.len()
    );
    Ok(forest)
}

/// Move the record at `slot` and its descendants into an owned subtree
fn assemble(
    slot: usize,
    records: &mut [Option<Taxon>],
    children: &HashMap<usize, Vec<usize>>,
    photographed: &BTreeSet<TaxonId>,
) -> Option<TreeNode> {
    let taxon = records[slot].take()?;
    let has_photos = photographed.contains(&taxon.id);
    let mut node = TreeNode::from_taxon(taxon, has_photos);

    if let Some(child_slots) = children.get(&slot) {
        node.children = child_slots
            .iter()
            .filter_map(|&child| assemble(child, records, children, photographed))
            .collect();
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::source::TaxonIndex;
    use crate::tree::closure::resolve_closure;
    use crate::tree::closure::tests::{arb_photographed, arb_taxonomy, sample_index};
    use proptest::prelude::*;

    fn ids(values: &[TaxonId]) -> BTreeSet<TaxonId> {
        values.iter().copied().collect()
    }

    fn pipeline(index: &TaxonIndex, photographed: &[TaxonId]) -> Result<Vec<TreeNode>> {
        let photographed = ids(photographed);
        let closure = resolve_closure(&photographed, index)?;
        build_forest(&closure, index, &photographed)
    }

    #[test]
    fn test_single_chain_forest() {
        let index = TaxonIndex::new([
            Taxon::new(1, "Arthropoda", "phylum", None),
            Taxon::new(2, "Insecta", "class", Some(1)),
            Taxon::new(3, "Hemiptera", "order", Some(2)),
        ]);
        let forest = pipeline(&index, &[3]).unwrap();

        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!((root.id, root.has_photos), (1, false));
        let insecta = &root.children[0];
        assert_eq!((insecta.id, insecta.has_photos), (2, false));
        let hemiptera = &insecta.children[0];
        assert_eq!((hemiptera.id, hemiptera.has_photos), (3, true));
        assert!(hemiptera.is_leaf());
    }

    #[test]
    fn test_shared_ancestor_forest() {
        let forest = pipeline(&sample_index(), &[3, 5]).unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtree_len(), 4);
        let insecta = &forest[0].children[0];
        let leaves: Vec<_> = insecta.children.iter().map(|c| (c.id, c.has_photos)).collect();
        assert_eq!(leaves, vec![(3, true), (5, true)]);
    }

    #[test]
    fn test_multiple_roots() {
        let forest = pipeline(&sample_index(), &[4, 10]).unwrap();
        let roots: Vec<_> = forest.iter().map(|n| n.id).collect();
        assert_eq!(roots, vec![1, 10]);
    }

    #[test]
    fn test_parent_outside_closure_makes_a_root() {
        // Closure pruned by hand: 2's parent 1 is left out
        let forest = build_forest(&ids(&[2, 3]), &sample_index(), &ids(&[3])).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, 2);
    }

    #[test]
    fn test_empty_closure() {
        assert!(build_forest(&BTreeSet::new(), &sample_index(), &BTreeSet::new())
            .unwrap()
            .is_empty());
        assert!(pipeline(&sample_index(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_record_returns_no_forest() {
        let result = build_forest(&ids(&[1, 2, 99]), &sample_index(), &ids(&[2]));
        assert!(matches!(
            result,
            Err(GalleryError::DanglingReference { taxon_id: 99 })
        ));
    }

    #[test]
    fn test_nonexistent_parent_is_dangling() {
        let index = TaxonIndex::new([
            Taxon::new(1, "Arthropoda", "phylum", None),
            Taxon::new(2, "Insecta", "class", Some(404)),
        ]);
        assert!(matches!(
            pipeline(&index, &[2]),
            Err(GalleryError::DanglingReference { taxon_id: 404 })
        ));
    }

    proptest! {
        #[test]
        fn prop_forest_covers_closure_exactly_once(
            (taxa, photographed) in arb_taxonomy()
                .prop_flat_map(|taxa| {
                    let p = arb_photographed(&taxa);
                    (Just(taxa), p)
                })
        ) {
            let index = TaxonIndex::new(taxa);
            let closure = resolve_closure(&photographed, &index).unwrap();
            let forest = build_forest(&closure, &index, &photographed).unwrap();

            let mut seen = Vec::new();
            for root in &forest {
                root.walk(&mut |n| seen.push(n.id));
            }
            let unique: BTreeSet<_> = seen.iter().copied().collect();
            prop_assert_eq!(seen.len(), unique.len());
            prop_assert_eq!(unique, closure);

            for root in &forest {
                root.walk(&mut |n| assert_eq!(n.has_photos, photographed.contains(&n.id)));
            }
        }
    }
}
