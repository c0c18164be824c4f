/// Widgets for the tree and gallery screens
///
/// - `tree_canvas.rs` - canvas program drawing the taxonomy layout
/// - `gallery.rs` - thumbnail grid of one taxon

pub mod gallery;
pub mod tree_canvas;
