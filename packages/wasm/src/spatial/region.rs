//! Square regions, quadrants and query windows.
//!
//! Every internal node of the quadtree owns a square [`Region`]: a center
//! plus half-open bounds `[x - half, x + half) × [y - half, y + half)`.
//! Half-sizes start as powers of two, so subdividing and doubling are exact
//! for as long as the floating point format allows. Past that, bounds are
//! still shared exactly between parent and child.

/// One of the four children of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Quadrant {
    /// All quadrants in storage (and traversal) order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];

    /// Build a quadrant from its east/north sides.
    #[inline]
    pub fn from_sides(east: bool, north: bool) -> Self {
        match (east, north) {
            (false, true) => Quadrant::NorthWest,
            (true, true) => Quadrant::NorthEast,
            (false, false) => Quadrant::SouthWest,
            (true, false) => Quadrant::SouthEast,
        }
    }

    /// Child slot index, matching [`Quadrant::ALL`].
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            Quadrant::NorthWest => 0,
            Quadrant::NorthEast => 1,
            Quadrant::SouthWest => 2,
            Quadrant::SouthEast => 3,
        }
    }

    #[inline]
    pub fn is_east(self) -> bool {
        matches!(self, Quadrant::NorthEast | Quadrant::SouthEast)
    }

    #[inline]
    pub fn is_north(self) -> bool {
        matches!(self, Quadrant::NorthWest | Quadrant::NorthEast)
    }

    /// The quadrant on the other side of the vertical center line.
    #[inline]
    pub fn horizontal_neighbor(self) -> Self {
        Self::from_sides(!self.is_east(), self.is_north())
    }

    /// The quadrant on the other side of the horizontal center line.
    #[inline]
    pub fn vertical_neighbor(self) -> Self {
        Self::from_sides(self.is_east(), !self.is_north())
    }

    /// The diagonally opposite quadrant.
    #[inline]
    pub fn opposite(self) -> Self {
        Self::from_sides(!self.is_east(), !self.is_north())
    }
}

/// A square region of the plane.
///
/// The bounds are stored rather than derived from the center, so a child
/// always covers exactly the half of its parent that [`Region::quadrant_of`]
/// routes to it, even once the center can no longer be computed exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Center X coordinate, where the region splits east/west.
    pub x: f64,
    /// Center Y coordinate, where the region splits north/south.
    pub y: f64,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Region {
    /// Create a region from its center and half-size.
    pub fn new(x: f64, y: f64, half_size: f64) -> Self {
        Self {
            x,
            y,
            x0: x - half_size,
            y0: y - half_size,
            x1: x + half_size,
            y1: y + half_size,
        }
    }

    /// The first region created around a single point.
    ///
    /// The half-size is the power of two reached by doubling from 1 until the
    /// point fits strictly inside `(-s, s)` on both axes, then, when neither
    /// coordinate is zero, halving for as long as it still does. The center
    /// sits at `(±s, ±s)` on the side of each coordinate, zero counting as
    /// positive, so the point lands inside the half-open square.
    pub fn enclosing(x: f64, y: f64) -> Self {
        let mut size = 1.0_f64;
        while !(x.abs() < size && y.abs() < size) {
            size *= 2.0;
        }
        if x != 0.0 && y != 0.0 {
            while x.abs() < size && y.abs() < size {
                size /= 2.0;
            }
        }
        let cx = if x >= 0.0 { size } else { -size };
        let cy = if y >= 0.0 { size } else { -size };
        Self::new(cx, cy, size)
    }

    #[inline]
    pub fn min_x(&self) -> f64 {
        self.x0
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x1
    }

    #[inline]
    pub fn min_y(&self) -> f64 {
        self.y0
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y1
    }

    /// Half of the side length.
    #[inline]
    pub fn half_size(&self) -> f64 {
        (self.x1 - self.x0) / 2.0
    }

    /// Whether the point lies inside the half-open square.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && y >= self.y0 && x < self.x1 && y < self.y1
    }

    /// The quadrant a point falls in. Points on a center line go east/north.
    #[inline]
    pub fn quadrant_of(&self, x: f64, y: f64) -> Quadrant {
        Quadrant::from_sides(x >= self.x, y >= self.y)
    }

    /// The region of one quadrant.
    ///
    /// Its bounds are this region's center and edges, copied exactly. Its
    /// center is the rounded midpoint of those bounds, which lies strictly
    /// between them whenever any float does.
    pub fn child(&self, quadrant: Quadrant) -> Region {
        let (x0, x1) = if quadrant.is_east() { (self.x, self.x1) } else { (self.x0, self.x) };
        let (y0, y1) = if quadrant.is_north() { (self.y, self.y1) } else { (self.y0, self.y) };
        Region {
            x: midpoint(x0, x1),
            y: midpoint(y0, y1),
            x0,
            y0,
            x1,
            y1,
        }
    }

    /// The doubled region that keeps `self` as one of its quadrants and
    /// extends toward `(x, y)`.
    ///
    /// The new center is a corner of `self`, so the old region stays exactly
    /// one quadrant of the new one. Returns the new region together with the
    /// quadrant `self` occupies in it.
    pub fn grown_toward(&self, x: f64, y: f64) -> (Region, Quadrant) {
        let east = self.x < x;
        let north = self.y < y;
        let width = self.x1 - self.x0;
        let height = self.y1 - self.y0;
        let (cx, x0, x1) = if east {
            (self.x1, self.x0, self.x1 + width)
        } else {
            (self.x0, self.x0 - width, self.x1)
        };
        let (cy, y0, y1) = if north {
            (self.y1, self.y0, self.y1 + height)
        } else {
            (self.y0, self.y0 - height, self.y1)
        };
        let grown = Region {
            x: cx,
            y: cy,
            x0,
            y0,
            x1,
            y1,
        };
        (grown, Quadrant::from_sides(!east, !north))
    }

    /// The point of the square closest to `(x, y)`.
    #[inline]
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.max(self.x0).min(self.x1), y.max(self.y0).min(self.y1))
    }
}

#[inline]
fn midpoint(lo: f64, hi: f64) -> f64 {
    (lo + hi) / 2.0
}

/// An axis-aligned query rectangle, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Window {
    /// Create a window from two opposite corners, in any order.
    ///
    /// A NaN bound is kept as is, so the window contains nothing.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let (xmin, xmax) = ordered(x0, x1);
        let (ymin, ymax) = ordered(y0, y1);
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Create a window from an origin and a (possibly negative) extent.
    pub fn from_extent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Whether the point lies inside the window, edges included.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.xmin <= x && x <= self.xmax && self.ymin <= y && y <= self.ymax
    }

    /// Whether the region lies entirely outside the window.
    #[inline]
    pub fn misses(&self, region: &Region) -> bool {
        self.xmax < region.min_x()
            || self.ymax < region.min_y()
            || self.xmin >= region.max_x()
            || self.ymin >= region.max_y()
    }

    /// Whether the region lies entirely inside the window.
    #[inline]
    pub fn covers(&self, region: &Region) -> bool {
        self.xmin <= region.min_x()
            && self.ymin <= region.min_y()
            && self.xmax >= region.max_x()
            && self.ymax >= region.max_y()
    }
}

#[inline]
fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}
