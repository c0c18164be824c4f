/// Taxonomy tree construction and layout
///
/// The pipeline run for every "view tree" action:
/// - `closure.rs` - photographed taxa plus all of their ancestors
/// - `forest.rs` - assemble those taxa into rooted trees
/// - `layout.rs` - place every node without sibling overlap
/// - `measure.rs` - label sizing used by the layout
/// - `view.rs` - the three steps wired to the stores

pub mod closure;
pub mod forest;
pub mod layout;
pub mod measure;
pub mod node;
pub mod view;

pub use layout::{LayoutBox, LineSegment, TreeLayout};
pub use node::TreeNode;
