//! Distance metric and nearest-neighbor search options.

/// Squared distance scaled independently per axis.
///
/// `d(dx, dy) = dx² / rx + dy² / ry` where `rx = x_unit²` and `ry = y_unit²`.
/// With units set to the data-space size of one screen pixel this measures
/// on-screen proximity without taking a square root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metric {
    rx: f64,
    ry: f64,
}

impl Metric {
    /// Plain squared Euclidean distance.
    pub const UNIT: Metric = Metric { rx: 1.0, ry: 1.0 };

    /// Build a metric from per-axis units.
    ///
    /// A missing, zero or non-finite `x_unit` means 1. A missing or unusable
    /// `y_unit` falls back to whatever the X axis uses.
    pub fn new(x_unit: Option<f64>, y_unit: Option<f64>) -> Self {
        let rx = squared_unit(x_unit).unwrap_or(1.0);
        let ry = squared_unit(y_unit).unwrap_or(rx);
        Self { rx, ry }
    }

    #[inline]
    pub fn distance(&self, dx: f64, dy: f64) -> f64 {
        dx * dx / self.rx + dy * dy / self.ry
    }
}

impl Default for Metric {
    fn default() -> Self {
        Self::UNIT
    }
}

fn squared_unit(unit: Option<f64>) -> Option<f64> {
    unit.map(|u| u * u).filter(|r| *r > 0.0 && r.is_finite())
}

/// Options for [`SpatialIndex::closest`](super::SpatialIndex::closest).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClosestQuery {
    /// Search radius in metric units. Absent or non-positive means unbounded.
    pub radius: Option<f64>,
    /// Data-space length of one unit along X.
    pub x_unit: Option<f64>,
    /// Data-space length of one unit along Y. Defaults to `x_unit`.
    pub y_unit: Option<f64>,
}

impl ClosestQuery {
    /// An unbounded search with the unit metric.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn with_units(mut self, x_unit: f64, y_unit: f64) -> Self {
        self.x_unit = Some(x_unit);
        self.y_unit = Some(y_unit);
        self
    }

    pub fn metric(&self) -> Metric {
        Metric::new(self.x_unit, self.y_unit)
    }

    /// The squared radius bounding the search, if any.
    pub fn limit(&self) -> Option<f64> {
        self.radius.filter(|r| *r > 0.0).map(|r| r * r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_metric() {
        let m = Metric::default();
        assert_eq!(m.distance(3.0, 4.0), 25.0);
    }

    #[test]
    fn test_anisotropic_metric() {
        let m = Metric::new(Some(2.0), Some(0.5));
        // 4 / 4 + 1 / 0.25
        assert_eq!(m.distance(2.0, 1.0), 5.0);
    }

    #[test]
    fn test_y_unit_defaults_to_x_unit() {
        let m = Metric::new(Some(2.0), None);
        assert_eq!(m.distance(2.0, 2.0), 2.0);
        let zero_y = Metric::new(Some(2.0), Some(0.0));
        assert_eq!(zero_y, m);
    }

    #[test]
    fn test_unusable_units_fall_back() {
        assert_eq!(Metric::new(Some(0.0), None), Metric::UNIT);
        assert_eq!(Metric::new(Some(f64::NAN), None), Metric::UNIT);
        assert_eq!(Metric::new(Some(1e-200), None), Metric::UNIT);
        assert_eq!(Metric::new(None, Some(3.0)).distance(1.0, 3.0), 2.0);
    }

    #[test]
    fn test_query_limit() {
        assert_eq!(ClosestQuery::new().limit(), None);
        assert_eq!(ClosestQuery::new().with_radius(3.0).limit(), Some(9.0));
        assert_eq!(ClosestQuery::new().with_radius(0.0).limit(), None);
        assert_eq!(ClosestQuery::new().with_radius(-2.0).limit(), None);
        assert_eq!(ClosestQuery::new().with_radius(f64::NAN).limit(), None);
    }
}
