use crate::state::data::{Taxon, TaxonId};

/// One taxon in the rendered forest
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: TaxonId,
    pub name: String,
    pub rank: String,
    /// True iff at least one photo is attached to this taxon
    pub has_photos: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn from_taxon(taxon: Taxon, has_photos: bool) -> Self {
        Self {
            id: taxon.id,
            name: taxon.name,
            rank: taxon.rank,
            has_photos,
            children: Vec::new(),
        }
    }

    /// Text shown in the node's box, e.g. "genus: Pyrrhocoris"
    pub fn label(&self) -> String {
        format!("{}: {}", self.rank, self.name)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::subtree_len).sum::<usize>()
    }

    /// Pre-order walk over this subtree
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
