/// Tidy top-down layout of the taxonomy forest
///
/// Single post-order pass, left to right. Leaves are packed at a horizontal
/// cursor that only moves forward; every parent is centered over its
/// outermost children. Rows are a fixed `row_height` apart.
use super::measure::{TextMeasurer, TextSize};
use super::node::TreeNode;
use crate::config::LayoutConfig;
use crate::error::GalleryError;
use crate::state::data::TaxonId;

/// On-screen rectangle of one taxon. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBox {
    pub taxon_id: TaxonId,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Clickable: the taxon has photos
    pub is_interactive: bool,
}

impl LayoutBox {
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// Edge from the bottom-center of a parent box to the top-center of a child box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub parent: TaxonId,
    pub child: TaxonId,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// A node that could not be drawn. Its subtree is still laid out.
#[derive(Debug)]
pub struct LayoutFailure {
    pub taxon_id: TaxonId,
    pub error: GalleryError,
}

/// Everything the renderer needs for one view
#[derive(Debug, Default)]
pub struct TreeLayout {
    /// One box per drawn node, in post-order
    pub boxes: Vec<LayoutBox>,
    pub lines: Vec<LineSegment>,
    pub failures: Vec<LayoutFailure>,
    /// Extent of all boxes, measured from the origin
    pub width: f32,
    pub height: f32,
}

impl TreeLayout {
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn find(&self, taxon_id: TaxonId) -> Option<&LayoutBox> {
        self.boxes.iter().find(|b| b.taxon_id == taxon_id)
    }

    /// The interactive box under a point in layout coordinates
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&LayoutBox> {
        self.boxes
            .iter()
            .find(|b| b.is_interactive && b.contains(x, y))
    }
}

/// Lay out `forest` with its roots side by side on the first row
pub fn layout(
    forest: &[TreeNode],
    measurer: &impl TextMeasurer,
    config: &LayoutConfig,
) -> TreeLayout {
    let mut pass = LayoutPass {
        measurer,
        config,
        cursor: 0.0,
        boxes: Vec::new(),
        lines: Vec::new(),
        failures: Vec::new(),
    };

    for root in forest {
        pass.place(root, 0);
    }

    let width = pass.boxes.iter().map(LayoutBox::right).fold(0.0, f32::max);
    let height = pass.boxes.iter().map(LayoutBox::bottom).fold(0.0, f32::max);

    tracing::debug!(
        "laid out {} boxes and {} lines ({}x{})",
        pass.boxes.len(),
        pass.lines.len(),
        width,
        height
    );

    TreeLayout {
        boxes: pass.boxes,
        lines: pass.lines,
        failures: pass.failures,
        width,
        height,
    }
}

/// Where a subtree ended up
#[derive(Debug, Clone, Copy)]
struct Placed {
    id: TaxonId,
    center_x: f32,
    top: f32,
    /// Rightmost box edge anywhere in the subtree
    right: f32,
    drawn: bool,
}

/// State of one `layout` call. Nothing outlives it.
struct LayoutPass<'a, M> {
    measurer: &'a M,
    config: &'a LayoutConfig,
    /// Leftmost x still free on every row
    cursor: f32,
    boxes: Vec<LayoutBox>,
    lines: Vec<LineSegment>,
    failures: Vec<LayoutFailure>,
}

impl<M: TextMeasurer> LayoutPass<'_, M> {
    fn place(&mut self, node: &TreeNode, depth: usize) -> Placed {
        let start = self.cursor;
        let first_box = self.boxes.len();
        let first_line = self.lines.len();
        let y = depth as f32 * self.config.row_height;

        let label = node.label();
        let (text, drawn) = match self.measurer.measure(&label) {
            Ok(size) => (size, true),
            Err(error) => {
                tracing::warn!("taxon {} left out of the view: {}", node.id, error);
                self.failures.push(LayoutFailure {
                    taxon_id: node.id,
                    error,
                });
                (TextSize { width: 0.0, height: 0.0 }, false)
            }
        };
        let width = text.width + 2.0 * self.config.pad_x;
        let height = text.height + 2.0 * self.config.pad_y;

        let mut children = Vec::with_capacity(node.children.len());
        let mut right = start;
        for child in &node.children {
            let placed = self.place(child, depth + 1);
            right = right.max(placed.right);
            children.push(placed);
        }

        let mut center_x = match outer_centers(&children) {
            Some((leftmost, rightmost)) => (leftmost + rightmost) / 2.0,
            None => start + width / 2.0,
        };

        // A label wider than its children would poke out to the left of the
        // cursor; move the whole subtree right instead.
        let overhang = start - (center_x - width / 2.0);
        if overhang > 0.0 {
            self.shift_since(first_box, first_line, overhang);
            for child in &mut children {
                child.center_x += overhang;
                child.right += overhang;
            }
            right += overhang;
            center_x += overhang;
        }

        if drawn {
            for child in children.iter().filter(|c| c.drawn) {
                self.lines.push(LineSegment {
                    parent: node.id,
                    child: child.id,
                    x1: center_x,
                    y1: y + height,
                    x2: child.center_x,
                    y2: child.top,
                });
            }
            self.boxes.push(LayoutBox {
                taxon_id: node.id,
                label,
                x: center_x - width / 2.0,
                y,
                width,
                height,
                is_interactive: node.has_photos,
            });
        }

        let right = right.max(center_x + width / 2.0);
        self.cursor = right + self.config.h_spacing;

        Placed {
            id: node.id,
            center_x,
            top: y,
            right,
            drawn,
        }
    }

    /// Move everything emitted since the given indices `dx` to the right
    fn shift_since(&mut self, first_box: usize, first_line: usize, dx: f32) {
        for b in &mut self.boxes[first_box..] {
            b.x += dx;
        }
        for line in &mut self.lines[first_line..] {
            line.x1 += dx;
            line.x2 += dx;
        }
    }
}

fn outer_centers(children: &[Placed]) -> Option<(f32, f32)> {
    let first = children.first()?;
    Some(children.iter().fold((first.center_x, first.center_x), |(lo, hi), c| {
        (lo.min(c.center_x), hi.max(c.center_x))
    }))
}
