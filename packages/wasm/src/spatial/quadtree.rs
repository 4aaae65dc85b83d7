//! Point quadtree over `f64` coordinates.
//!
//! Supports:
//! - Insertion with automatic region growth (the root region doubles until it
//!   contains the new point)
//! - Removal of every entry matching a predicate
//! - Total and windowed point counts
//! - Nearest-neighbor search under an anisotropic metric
//! - Read-only traversal for drawing the structure

use std::convert::Infallible;

use super::error::IndexError;
use super::metric::{ClosestQuery, Metric};
use super::region::{Quadrant, Region, Window};
use super::visit::{NodeView, TreeOutline, Visitor};

/// Largest accepted coordinate magnitude. Keeps every region the tree can
/// grow to within finite `f64` range.
pub const COORDINATE_LIMIT: f64 = f64::MAX / 256.0;

/// A payload stored in the index, tagged with the index it was inserted under.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    /// Insertion index. Sequential for [`SpatialIndex::insert`], caller-chosen
    /// for [`SpatialIndex::insert_at`].
    pub index: usize,
    pub payload: T,
}

/// Result of a nearest-neighbor search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<'a, T> {
    pub x: f64,
    pub y: f64,
    /// Insertion index of the representative entry.
    pub index: usize,
    /// First payload stored at `(x, y)`.
    pub payload: &'a T,
    /// Distance under the query metric (squared, axis-scaled).
    pub distance: f64,
}

/// All entries sharing one exact coordinate. Never empty.
#[derive(Debug, Clone)]
struct Leaf<T> {
    x: f64,
    y: f64,
    entries: Vec<Entry<T>>,
}

impl<T> Leaf<T> {
    fn new(x: f64, y: f64, entry: Entry<T>) -> Self {
        Self {
            x,
            y,
            entries: vec![entry],
        }
    }

    /// Exact coordinate match. No tolerance is applied.
    #[inline]
    fn is_at(&self, x: f64, y: f64) -> bool {
        self.x == x && self.y == y
    }
}

type Child<T> = Option<Box<Node<T>>>;

#[derive(Debug, Clone)]
struct Internal<T> {
    region: Region,
    /// Sum of the children's counts.
    count: usize,
    /// Indexed by [`Quadrant::slot`].
    children: [Child<T>; 4],
}

#[derive(Debug, Clone)]
enum Node<T> {
    Leaf(Leaf<T>),
    Internal(Internal<T>),
}

impl<T> Node<T> {
    #[inline]
    fn count(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.entries.len(),
            Node::Internal(internal) => internal.count,
        }
    }

    /// Keep only the entries `keep` accepts, pruning emptied subtrees.
    fn retain<F>(self, keep: &mut F) -> Option<Node<T>>
    where
        F: FnMut(&Entry<T>) -> bool,
    {
        match self {
            Node::Leaf(mut leaf) => {
                leaf.entries.retain(|entry| keep(entry));
                (!leaf.entries.is_empty()).then_some(Node::Leaf(leaf))
            }
            Node::Internal(mut internal) => {
                for slot in internal.children.iter_mut() {
                    *slot = slot.take().and_then(|child| (*child).retain(keep)).map(Box::new);
                }
                internal.count = internal.children.iter().flatten().map(|c| c.count()).sum();
                (internal.count > 0).then_some(Node::Internal(internal))
            }
        }
    }

    /// Visit every entry in traversal order.
    fn try_for_each_entry<E>(
        &self,
        f: &mut impl FnMut(&Entry<T>) -> Result<(), E>,
    ) -> Result<(), E> {
        match self {
            Node::Leaf(leaf) => leaf.entries.iter().try_for_each(|entry| f(entry)),
            Node::Internal(internal) => internal
                .children
                .iter()
                .flatten()
                .try_for_each(|child| child.try_for_each_entry(f)),
        }
    }

    fn count_window(&self, window: &Window) -> usize {
        match self {
            Node::Leaf(leaf) => {
                if window.contains(leaf.x, leaf.y) {
                    leaf.entries.len()
                } else {
                    0
                }
            }
            Node::Internal(internal) => {
                if window.misses(&internal.region) {
                    0
                } else if window.covers(&internal.region) {
                    internal.count
                } else {
                    internal
                        .children
                        .iter()
                        .flatten()
                        .map(|child| child.count_window(window))
                        .sum()
                }
            }
        }
    }

    fn walk<V: Visitor<T> + ?Sized>(&self, depth: usize, visitor: &mut V) {
        match self {
            Node::Leaf(leaf) => visitor.visit(
                depth,
                NodeView::Leaf {
                    x: leaf.x,
                    y: leaf.y,
                    entries: &leaf.entries,
                },
            ),
            Node::Internal(internal) => {
                visitor.visit(
                    depth,
                    NodeView::Internal {
                        region: internal.region,
                        count: internal.count,
                    },
                );
                for child in internal.children.iter().flatten() {
                    child.walk(depth + 1, visitor);
                }
            }
        }
    }
}

impl<T> Internal<T> {
    fn empty(region: Region) -> Self {
        Self {
            region,
            count: 0,
            children: [None, None, None, None],
        }
    }

    /// The first internal node, created around a lone root leaf.
    fn around(leaf: Leaf<T>) -> Self {
        let mut node = Self::empty(Region::enclosing(leaf.x, leaf.y));
        node.adopt(leaf);
        node
    }

    /// Place a leaf into an empty quadrant.
    fn adopt(&mut self, leaf: Leaf<T>) {
        let quadrant = self.region.quadrant_of(leaf.x, leaf.y);
        debug_assert!(self.children[quadrant.slot()].is_none());
        self.count += leaf.entries.len();
        self.children[quadrant.slot()] = Some(Box::new(Node::Leaf(leaf)));
    }

    /// Double the region until it contains `(x, y)`. The old root becomes a
    /// quadrant of the new one.
    fn grow_to_contain(mut self, x: f64, y: f64) -> Self {
        while !self.region.contains(x, y) {
            let (region, quadrant) = self.region.grown_toward(x, y);
            log::debug!(
                "growing root from half-size {} to {} around ({}, {})",
                self.region.half_size(),
                region.half_size(),
                region.x,
                region.y
            );
            let mut parent = Self::empty(region);
            parent.count = self.count;
            parent.children[quadrant.slot()] = Some(Box::new(Node::Internal(self)));
            self = parent;
        }
        self
    }

    /// Insert into this subtree. `(x, y)` must lie inside the region.
    fn insert(&mut self, x: f64, y: f64, entry: Entry<T>) {
        let quadrant = self.region.quadrant_of(x, y);
        self.count += 1;
        let slot = &mut self.children[quadrant.slot()];
        let node = match slot.take() {
            None => Node::Leaf(Leaf::new(x, y, entry)),
            Some(child) => match *child {
                Node::Internal(mut internal) => {
                    internal.insert(x, y, entry);
                    Node::Internal(internal)
                }
                Node::Leaf(mut leaf) if leaf.is_at(x, y) => {
                    leaf.entries.push(entry);
                    Node::Leaf(leaf)
                }
                Node::Leaf(leaf) => split(self.region, quadrant, leaf, x, y, entry),
            },
        };
        *slot = Some(Box::new(node));
    }
}

/// Replace `leaf`, sitting in `quadrant` of `parent`, by an internal node
/// holding both it and the new entry.
///
/// Each level narrows the bounds on every axis where the two coordinates
/// differ, so the recursion ends once a center falls between them.
fn split<T>(
    parent: Region,
    quadrant: Quadrant,
    leaf: Leaf<T>,
    x: f64,
    y: f64,
    entry: Entry<T>,
) -> Node<T> {
    let region = parent.child(quadrant);
    log::trace!(
        "splitting leaf ({}, {}) for ({}, {}) at half-size {}",
        leaf.x,
        leaf.y,
        x,
        y,
        region.half_size()
    );
    let mut node = Internal::empty(region);
    node.adopt(leaf);
    node.insert(x, y, entry);
    Node::Internal(node)
}

/// Best candidate so far, threaded through the nearest-neighbor recursion.
struct Best<'a, T> {
    leaf: &'a Leaf<T>,
    distance: f64,
}

struct Search {
    x: f64,
    y: f64,
    metric: Metric,
    /// Squared radius, if bounded.
    limit: Option<f64>,
}

impl Search {
    fn run<'a, T>(&self, node: &'a Node<T>, best: Option<Best<'a, T>>) -> Option<Best<'a, T>> {
        match node {
            Node::Leaf(leaf) => {
                let distance = self.metric.distance(self.x - leaf.x, self.y - leaf.y);
                let better = match &best {
                    Some(best) => distance < best.distance,
                    None => self.limit.is_none_or(|limit| distance <= limit),
                };
                if better {
                    Some(Best { leaf, distance })
                } else {
                    best
                }
            }
            Node::Internal(internal) => {
                let region = &internal.region;
                let threshold = best.as_ref().map(|b| b.distance).or(self.limit);
                if let Some(threshold) = threshold {
                    let (px, py) = region.clamp(self.x, self.y);
                    if self.metric.distance(self.x - px, self.y - py) > threshold {
                        return best;
                    }
                }
                self.order(region)
                    .into_iter()
                    .filter_map(|q| internal.children[q.slot()].as_deref())
                    .fold(best, |best, child| self.run(child, best))
            }
        }
    }

    /// Children visit order: the query's own quadrant, then its neighbor
    /// across the nearer center line, then the other neighbor, then the
    /// opposite quadrant.
    fn order(&self, region: &Region) -> [Quadrant; 4] {
        let own = region.quadrant_of(self.x, self.y);
        let dx = self.metric.distance(self.x - region.x, 0.0);
        let dy = self.metric.distance(0.0, self.y - region.y);
        if dx < dy {
            [own, own.horizontal_neighbor(), own.vertical_neighbor(), own.opposite()]
        } else {
            [own, own.vertical_neighbor(), own.horizontal_neighbor(), own.opposite()]
        }
    }
}

/// Dynamic point index with opaque payloads.
///
/// Points sharing an exact coordinate are stored together in one leaf; every
/// other pair of points ends up in distinct leaves of a square-region
/// quadtree whose root grows by doubling to cover new points and never
/// shrinks.
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    root: Option<Node<T>>,
    next_index: usize,
}

impl<T> SpatialIndex<T> {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            root: None,
            next_index: 0,
        }
    }

    /// Insert a payload at `(x, y)` under the next sequential index.
    ///
    /// Returns the index assigned to the entry.
    pub fn insert(&mut self, x: f64, y: f64, payload: T) -> Result<usize, IndexError> {
        let index = self.next_index;
        self.insert_at(x, y, index, payload)?;
        Ok(index)
    }

    /// Insert a payload at `(x, y)` under a caller-chosen index.
    ///
    /// Fails only for coordinates that are not finite or exceed
    /// [`COORDINATE_LIMIT`]; the index is left untouched in that case.
    pub fn insert_at(&mut self, x: f64, y: f64, index: usize, payload: T) -> Result<(), IndexError> {
        check_coordinate("x", x)?;
        check_coordinate("y", y)?;
        let entry = Entry { index, payload };
        self.next_index = self.next_index.max(index.saturating_add(1));

        let root = match self.root.take() {
            None => {
                self.root = Some(Node::Leaf(Leaf::new(x, y, entry)));
                return Ok(());
            }
            Some(Node::Leaf(mut leaf)) if leaf.is_at(x, y) => {
                leaf.entries.push(entry);
                self.root = Some(Node::Leaf(leaf));
                return Ok(());
            }
            Some(Node::Leaf(leaf)) => Internal::around(leaf),
            Some(Node::Internal(internal)) => internal,
        };

        let mut root = root.grow_to_contain(x, y);
        root.insert(x, y, entry);
        self.root = Some(Node::Internal(root));
        Ok(())
    }

    /// Insert a whole series. Point `i` is stored under index `i` with a
    /// clone of `payload`. Extra coordinates on the longer side are ignored.
    ///
    /// Returns the number of points inserted. Nothing is inserted if any
    /// coordinate is rejected.
    pub fn insert_series(&mut self, xs: &[f64], ys: &[f64], payload: T) -> Result<usize, IndexError>
    where
        T: Clone,
    {
        let points: Vec<(f64, f64)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        for &(x, y) in &points {
            check_coordinate("x", x)?;
            check_coordinate("y", y)?;
        }
        for (i, &(x, y)) in points.iter().enumerate() {
            self.insert_at(x, y, i, payload.clone())?;
        }
        Ok(points.len())
    }

    /// Remove every entry whose payload equals `payload`.
    ///
    /// Returns the number of entries removed.
    pub fn remove(&mut self, payload: &T) -> usize
    where
        T: PartialEq,
    {
        self.remove_where(|p| p == payload)
    }

    /// Remove every entry whose payload satisfies `predicate`.
    ///
    /// Returns the number of entries removed. Regions of surviving nodes are
    /// never shrunk.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let result: Result<usize, Infallible> = self.try_remove_where(|p| Ok(predicate(p)));
        match result {
            Ok(removed) => removed,
            Err(never) => match never {},
        }
    }

    /// Like [`remove_where`](Self::remove_where) with a fallible predicate.
    ///
    /// The predicate sees every entry before anything is removed, so an error
    /// leaves the index unchanged.
    pub fn try_remove_where<F, E>(&mut self, mut predicate: F) -> Result<usize, E>
    where
        F: FnMut(&T) -> Result<bool, E>,
    {
        let Some(root) = self.root.take() else {
            return Ok(0);
        };

        let mut doomed = Vec::with_capacity(root.count());
        if let Err(err) = root.try_for_each_entry(&mut |entry: &Entry<T>| {
            doomed.push(predicate(&entry.payload)?);
            Ok(())
        }) {
            self.root = Some(root);
            return Err(err);
        }

        let before = root.count();
        let mut decisions = doomed.into_iter();
        self.root = root.retain(&mut |_| !decisions.next().unwrap_or(false));
        Ok(before - self.count())
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.root = None;
        self.next_index = 0;
    }

    /// Total number of entries.
    pub fn count(&self) -> usize {
        self.root.as_ref().map_or(0, Node::count)
    }

    /// Number of entries inside the window, edges included.
    pub fn count_window(&self, window: &Window) -> usize {
        self.root.as_ref().map_or(0, |root| root.count_window(window))
    }

    /// Number of entries inside the rectangle spanned by two corners, given
    /// in any order.
    pub fn count_in(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> usize {
        self.count_window(&Window::new(x0, y0, x1, y1))
    }

    /// Number of entries inside the rectangle at `(x, y)` with the given
    /// (possibly negative) width and height.
    pub fn count_extent(&self, x: f64, y: f64, width: f64, height: f64) -> usize {
        self.count_window(&Window::from_extent(x, y, width, height))
    }

    /// Count with a runtime-sized argument list: no bounds for the total, or
    /// `[x0, y0, x1, y1]` for a window.
    pub fn count_bounds(&self, bounds: &[f64]) -> Result<usize, IndexError> {
        match *bounds {
            [] => Ok(self.count()),
            [x0, y0, x1, y1] => Ok(self.count_in(x0, y0, x1, y1)),
            _ => Err(IndexError::ArgumentCount {
                given: bounds.len(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The root's square region. `None` while fewer than two distinct
    /// coordinates have been inserted.
    pub fn region(&self) -> Option<Region> {
        match &self.root {
            Some(Node::Internal(internal)) => Some(internal.region),
            _ => None,
        }
    }

    /// Find the entry closest to `(x, y)`.
    ///
    /// Returns `Ok(None)` when the index is empty or nothing lies within the
    /// query radius. Among equally distant points the first one reached wins.
    pub fn closest(&self, x: f64, y: f64, query: &ClosestQuery) -> Result<Option<Nearest<'_, T>>, IndexError> {
        if x.is_nan() || y.is_nan() {
            return Err(IndexError::InvalidArgument(format!(
                "closest: expected numeric x, y, got ({x}, {y})"
            )));
        }
        let Some(root) = &self.root else {
            return Ok(None);
        };

        let search = Search {
            x,
            y,
            metric: query.metric(),
            limit: query.limit(),
        };
        Ok(search.run(root, None).map(|best| {
            let first = &best.leaf.entries[0];
            Nearest {
                x: best.leaf.x,
                y: best.leaf.y,
                index: first.index,
                payload: &first.payload,
                distance: best.distance,
            }
        }))
    }

    /// Unbounded nearest neighbor under the unit metric.
    pub fn nearest(&self, x: f64, y: f64) -> Option<Nearest<'_, T>> {
        self.closest(x, y, &ClosestQuery::new()).ok().flatten()
    }

    /// Walk every node depth-first, parents first.
    pub fn traverse<V: Visitor<T> + ?Sized>(&self, visitor: &mut V) {
        if let Some(root) = &self.root {
            root.walk(0, visitor);
        }
    }

    /// Flatten the structure into drawable geometry.
    pub fn outline(&self) -> TreeOutline {
        let mut outline = TreeOutline::default();
        self.traverse(&mut outline);
        outline
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_coordinate(axis: &str, value: f64) -> Result<(), IndexError> {
    if value.is_finite() && value.abs() <= COORDINATE_LIMIT {
        Ok(())
    } else {
        Err(IndexError::InvalidArgument(format!(
            "{axis} coordinate {value} is not finite or exceeds {COORDINATE_LIMIT:e}"
        )))
    }
}
