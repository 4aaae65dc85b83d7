//! Quadtree spatial index for cursor snapping and point counting.
//!
//! This module provides a dynamic square-region quadtree for nearest-point
//! lookup under an anisotropic metric and for windowed point counts on
//! plotted curves.

mod error;
mod metric;
mod quadtree;
mod region;
mod visit;

pub use error::IndexError;
pub use metric::{ClosestQuery, Metric};
pub use quadtree::{COORDINATE_LIMIT, Entry, Nearest, SpatialIndex};
pub use region::{Quadrant, Region, Window};
pub use visit::{NodeView, TreeOutline, Visitor};
