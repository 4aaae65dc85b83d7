//! Read-only traversal of the quadtree structure.
//!
//! Renderers draw the index (points, node boxes and their center lines) by
//! walking it with a [`Visitor`]. [`TreeOutline`] is the stock visitor that
//! flattens the walk into coordinate buffers ready to hand to JavaScript.

use serde::Serialize;

use super::quadtree::Entry;
use super::region::Region;

/// A borrowed view of one node, handed to a [`Visitor`].
#[derive(Debug)]
pub enum NodeView<'a, T> {
    /// A single coordinate with one or more entries.
    Leaf {
        x: f64,
        y: f64,
        entries: &'a [Entry<T>],
    },
    /// A square region with up to four children.
    Internal { region: Region, count: usize },
}

/// Receives every node of the tree, parents before children, children in
/// NW, NE, SW, SE order. `depth` is 0 at the root.
pub trait Visitor<T> {
    fn visit(&mut self, depth: usize, node: NodeView<'_, T>);
}

impl<T, F> Visitor<T> for F
where
    F: FnMut(usize, NodeView<'_, T>),
{
    fn visit(&mut self, depth: usize, node: NodeView<'_, T>) {
        self(depth, node)
    }
}

/// Flat geometry describing the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeOutline {
    /// Leaf coordinates `[x0, y0, x1, y1, ...]`.
    pub points: Vec<f64>,
    /// Internal node squares `[xmin, ymin, xmax, ymax, ...]`.
    pub boxes: Vec<f64>,
    /// Center cross-lines as segments `[x0, y0, x1, y1, ...]`, two per box.
    pub lines: Vec<f64>,
    /// Deepest level visited.
    pub depth: usize,
}

impl<T> Visitor<T> for TreeOutline {
    fn visit(&mut self, depth: usize, node: NodeView<'_, T>) {
        self.depth = self.depth.max(depth);
        match node {
            NodeView::Leaf { x, y, .. } => {
                self.points.extend_from_slice(&[x, y]);
            }
            NodeView::Internal { region, .. } => {
                let (x, y) = (region.x, region.y);
                let (x0, y0, x1, y1) = (region.min_x(), region.min_y(), region.max_x(), region.max_y());
                self.boxes.extend_from_slice(&[x0, y0, x1, y1]);
                self.lines.extend_from_slice(&[x, y0, x, y1]);
                self.lines.extend_from_slice(&[x0, y, x1, y]);
            }
        }
    }
}
