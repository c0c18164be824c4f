/// Ancestor closure of the photographed taxa
///
/// The rendered tree only shows taxa that lie on a path from a photographed
/// taxon up to a root. This is the set of exactly those ids.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::state::data::TaxonId;
use crate::state::source::TaxonSource;

/// Every id in `photographed` plus all of its ancestors up to the roots.
///
/// Each id is looked up once. An id (photographed or ancestor) without a
/// record fails the whole resolution with `DanglingReference`.
pub fn resolve_closure(
    photographed: &BTreeSet<TaxonId>,
    taxa: &impl TaxonSource,
) -> Result<BTreeSet<TaxonId>> {
    let mut closure = photographed.clone();
    let mut stack: Vec<TaxonId> = photographed.iter().copied().collect();

    while let Some(id) = stack.pop() {
        if let Some(parent) = taxa.parent_of(id)? {
            if closure.insert(parent) {
                stack.push(parent);
            }
        }
    }

    tracing::debug!(
        "closure of {} photographed taxa has {} ids",
        photographed.len(),
        closure.len()
    );
    Ok(closure)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::GalleryError;
    use crate::state::data::Taxon;
    use crate::state::source::TaxonIndex;
    use proptest::prelude::*;

    fn ids(values: &[TaxonId]) -> BTreeSet<TaxonId> {
        values.iter().copied().collect()
    }

    /// 1 Arthropoda > 2 Insecta > {3 Hemiptera, 5 Hymenoptera}, 1 > 4 Arachnida, 10 Chordata
    pub(crate) fn sample_index() -> TaxonIndex {
        TaxonIndex::new([
            Taxon::new(1, "Arthropoda", "phylum", None),
            Taxon::new(2, "Insecta", "class", Some(1)),
            Taxon::new(3, "Hemiptera", "order", Some(2)),
            Taxon::new(4, "Arachnida", "class", Some(1)),
            Taxon::new(5, "Hymenoptera", "order", Some(2)),
            Taxon::new(10, "Chordata", "phylum", None),
        ])
    }

    /// Random forest where every node's parent has a smaller index
    pub(crate) fn arb_taxonomy() -> impl Strategy<Value = Vec<Taxon>> {
        prop::collection::vec(prop::option::weighted(0.85, any::<prop::sample::Index>()), 1..40)
            .prop_map(|parents| {
                parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, parent)| {
                        let parent_id = match parent {
                            Some(idx) if i > 0 => Some(idx.index(i) as TaxonId),
                            _ => None,
                        };
                        Taxon::new(i as TaxonId, &format!("Taxon{}", i), "rank", parent_id)
                    })
                    .collect()
            })
    }

    pub(crate) fn arb_photographed(taxa: &[Taxon]) -> impl Strategy<Value = BTreeSet<TaxonId>> {
        let len = taxa.len();
        prop::collection::btree_set(0..len as TaxonId, 0..=len.min(8))
    }

    fn ancestors(index: &TaxonIndex, id: TaxonId) -> Vec<TaxonId> {
        let mut out = Vec::new();
        let mut current = index.get(id).and_then(|t| t.parent_id);
        while let Some(parent) = current {
            out.push(parent);
            current = index.get(parent).and_then(|t| t.parent_id);
        }
        out
    }

    #[test]
    fn test_single_chain() {
        let closure = resolve_closure(&ids(&[3]), &sample_index()).unwrap();
        assert_eq!(closure, ids(&[1, 2, 3]));
    }

    #[test]
    fn test_shared_ancestor_is_included_once() {
        let closure = resolve_closure(&ids(&[3, 5]), &sample_index()).unwrap();
        assert_eq!(closure, ids(&[1, 2, 3, 5]));
    }

    #[test]
    fn test_photographed_inner_node() {
        let closure = resolve_closure(&ids(&[2, 3, 10]), &sample_index()).unwrap();
        assert_eq!(closure, ids(&[1, 2, 3, 10]));
    }

    #[test]
    fn test_empty_input() {
        let closure = resolve_closure(&BTreeSet::new(), &sample_index()).unwrap();
        assert!(closure.is_empty());
    }

    #[test]
    fn test_dangling_parent() {
        let index = TaxonIndex::new([
            Taxon::new(1, "Arthropoda", "phylum", None),
            Taxon::new(2, "Insecta", "class", Some(77)),
        ]);

        match resolve_closure(&ids(&[2]), &index) {
            Err(GalleryError::DanglingReference { taxon_id }) => assert_eq!(taxon_id, 77),
            other => panic!("expected dangling reference, got {:?}", other),
        }
    }

    #[test]
    fn test_dangling_photographed_taxon() {
        assert!(matches!(
            resolve_closure(&ids(&[42]), &sample_index()),
            Err(GalleryError::DanglingReference { taxon_id: 42 })
        ));
    }

    proptest! {
        #[test]
        fn prop_closure_is_minimal(
            (taxa, photographed) in arb_taxonomy()
                .prop_flat_map(|taxa| {
                    let p = arb_photographed(&taxa);
                    (Just(taxa), p)
                })
        ) {
            let index = TaxonIndex::new(taxa);
            let closure = resolve_closure(&photographed, &index).unwrap();

            let mut expected = photographed.clone();
            for &id in &photographed {
                expected.extend(ancestors(&index, id));
            }
            prop_assert_eq!(&closure, &expected);
        }

        #[test]
        fn prop_closure_of_closure_leaves_is_stable(
            (taxa, photographed) in arb_taxonomy()
                .prop_flat_map(|taxa| {
                    let p = arb_photographed(&taxa);
                    (Just(taxa), p)
                })
        ) {
            let index = TaxonIndex::new(taxa);
            let closure = resolve_closure(&photographed, &index).unwrap();

            let parents: BTreeSet<TaxonId> = closure
                .iter()
                .filter_map(|&id| index.get(id).and_then(|t| t.parent_id))
                .collect();
            let leaves: BTreeSet<TaxonId> = closure.difference(&parents).copied().collect();

            prop_assert!(leaves.is_subset(&photographed));
            prop_assert_eq!(resolve_closure(&leaves, &index).unwrap(), closure);
        }
    }
}
