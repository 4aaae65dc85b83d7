//! Plot Index - WASM Module
//!
//! This module provides the point index behind the plot library's cursor
//! snapping and automatic legend placement. It is compiled to WebAssembly
//! and exposes a JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `spatial`: square-region quadtree over curve points with opaque
//!   payloads (insert, remove, windowed counts, nearest point, traversal)
//!
//! Logging goes through the `log` facade; [`init`] routes it to the browser
//! console.

use js_sys::{Array, Function, Object, Reflect};
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

pub mod spatial;

use spatial::{ClosestQuery, IndexError, NodeView, SpatialIndex};

/// Forwards `log` records to `console.*`.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&message),
            Level::Warn => web_sys::console::warn_1(&message),
            Level::Info => web_sys::console::info_1(&message),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&message),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Warn);
    }
}

/// Set the console log level: "off", "error", "warn", "info", "debug" or "trace".
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsError> {
    let filter: LevelFilter = level
        .parse()
        .map_err(|_| JsError::new(&format!("unknown log level: {level}")))?;
    log::set_max_level(filter);
    Ok(())
}

/// Main entry point for the point index.
///
/// This struct wraps a [`SpatialIndex`] holding JavaScript payloads and
/// provides the public API exposed to JavaScript.
#[wasm_bindgen]
pub struct PlotIndexWasm {
    index: SpatialIndex<JsValue>,
}

#[wasm_bindgen]
impl PlotIndexWasm {
    /// Create a new empty index.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            index: SpatialIndex::new(),
        }
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Add a payload at (x, y).
    ///
    /// Returns the insertion index assigned to the entry.
    pub fn insert(&mut self, x: f64, y: f64, payload: JsValue) -> Result<u32, JsError> {
        let index = self.index.insert(x, y, payload)?;
        Ok(index as u32)
    }

    /// Add a payload at (x, y) under an explicit index.
    #[wasm_bindgen(js_name = insertAt)]
    pub fn insert_at(&mut self, x: f64, y: f64, index: u32, payload: JsValue) -> Result<(), JsError> {
        self.index.insert_at(x, y, index as usize, payload)?;
        Ok(())
    }

    /// Add every point of a curve, all sharing one payload.
    ///
    /// Point `i` is stored under index `i`. Returns the number of points added.
    #[wasm_bindgen(js_name = addCurve)]
    pub fn add_curve(&mut self, xs: &[f64], ys: &[f64], payload: JsValue) -> Result<u32, JsError> {
        let added = self.index.insert_series(xs, ys, payload)?;
        Ok(added as u32)
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove entries by payload.
    ///
    /// `filter` is either a predicate `(payload) => boolean` or a value
    /// compared with `===`. Returns the number of entries removed. If the
    /// predicate throws, nothing is removed and the exception propagates.
    pub fn remove(&mut self, filter: JsValue) -> Result<u32, JsValue> {
        let removed = match filter.dyn_ref::<Function>() {
            Some(predicate) => self.index.try_remove_where(|payload| {
                predicate
                    .call1(&JsValue::NULL, payload)
                    .map(|matched| matched.is_truthy())
            })?,
            None => self.index.remove(&filter),
        };
        Ok(removed as u32)
    }

    /// Remove every point.
    pub fn clear(&mut self) {
        self.index.clear();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Count points, either all of them (no arguments) or those inside the
    /// rectangle spanned by (x0, y0) and (x1, y1), edges included.
    ///
    /// Throws if only some of the four bounds are given.
    pub fn count(
        &self,
        x0: Option<f64>,
        y0: Option<f64>,
        x1: Option<f64>,
        y1: Option<f64>,
    ) -> Result<u32, JsError> {
        let bounds: Vec<f64> = [x0, y0, x1, y1].into_iter().flatten().collect();
        let count = self.index.count_bounds(&bounds)?;
        Ok(count as u32)
    }

    /// Count points inside the rectangle at (x, y) with the given width and
    /// height. Negative extents are allowed.
    #[wasm_bindgen(js_name = countExtent)]
    pub fn count_extent(&self, x: f64, y: f64, width: f64, height: f64) -> u32 {
        self.index.count_extent(x, y, width, height) as u32
    }

    /// Find the point closest to (x, y).
    ///
    /// `radius` bounds the search when positive. `xUnit` and `yUnit` scale
    /// each axis, e.g. to the data size of one pixel. Returns
    /// `{ x, y, index, payload, distance }` or `null`.
    pub fn closest(
        &self,
        x: JsValue,
        y: JsValue,
        radius: Option<f64>,
        x_unit: Option<f64>,
        y_unit: Option<f64>,
    ) -> Result<JsValue, JsValue> {
        let (Some(x), Some(y)) = (x.as_f64(), y.as_f64()) else {
            let err = IndexError::InvalidArgument("closest: invalid x, y".to_string());
            return Err(JsError::from(err).into());
        };
        let query = ClosestQuery {
            radius,
            x_unit,
            y_unit,
        };
        let Some(hit) = self.index.closest(x, y, &query).map_err(JsError::from)? else {
            return Ok(JsValue::NULL);
        };

        let result = Object::new();
        Reflect::set(&result, &"x".into(), &hit.x.into())?;
        Reflect::set(&result, &"y".into(), &hit.y.into())?;
        Reflect::set(&result, &"index".into(), &(hit.index as u32).into())?;
        Reflect::set(&result, &"payload".into(), hit.payload)?;
        Reflect::set(&result, &"distance".into(), &hit.distance.into())?;
        Ok(result.into())
    }

    /// Get the number of points.
    pub fn len(&self) -> u32 {
        self.index.len() as u32
    }

    /// Check if the index holds no points.
    #[wasm_bindgen(js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Get the root square as [centerX, centerY, halfSize], or None while
    /// fewer than two distinct points are indexed.
    pub fn region(&self) -> Option<Vec<f64>> {
        self.index
            .region()
            .map(|region| vec![region.x, region.y, region.half_size()])
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Walk the tree depth-first, parents first, calling
    /// `visitor(node, depth)` for every node.
    ///
    /// Leaves are `{ leaf: true, x, y, count, indices, payloads }`; internal
    /// nodes are `{ leaf: false, x, y, halfSize, count }`. Stops at the first
    /// exception thrown by the visitor and rethrows it.
    pub fn traverse(&self, visitor: &Function) -> Result<(), JsValue> {
        let mut failure = None;
        self.index
            .traverse(&mut |depth: usize, node: NodeView<'_, JsValue>| {
                if failure.is_some() {
                    return;
                }
                let called = describe(&node)
                    .and_then(|desc| visitor.call2(&JsValue::NULL, &desc, &(depth as u32).into()));
                if let Err(err) = called {
                    failure = Some(err);
                }
            });
        failure.map_or(Ok(()), Err)
    }

    /// Get drawable geometry for the tree:
    /// `{ points, boxes, lines, depth }` with flat coordinate arrays.
    pub fn outline(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.index.outline())?)
    }
}

impl Default for PlotIndexWasm {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the JavaScript object handed to `traverse` visitors.
fn describe(node: &NodeView<'_, JsValue>) -> Result<JsValue, JsValue> {
    let desc = Object::new();
    match node {
        NodeView::Leaf { x, y, entries } => {
            let indices = Array::new();
            let payloads = Array::new();
            for entry in entries.iter() {
                indices.push(&(entry.index as u32).into());
                payloads.push(&entry.payload);
            }
            Reflect::set(&desc, &"leaf".into(), &JsValue::TRUE)?;
            Reflect::set(&desc, &"x".into(), &(*x).into())?;
            Reflect::set(&desc, &"y".into(), &(*y).into())?;
            Reflect::set(&desc, &"count".into(), &(entries.len() as u32).into())?;
            Reflect::set(&desc, &"indices".into(), &indices)?;
            Reflect::set(&desc, &"payloads".into(), &payloads)?;
        }
        NodeView::Internal { region, count } => {
            Reflect::set(&desc, &"leaf".into(), &JsValue::FALSE)?;
            Reflect::set(&desc, &"x".into(), &region.x.into())?;
            Reflect::set(&desc, &"y".into(), &region.y.into())?;
            Reflect::set(&desc, &"halfSize".into(), &region.half_size().into())?;
            Reflect::set(&desc, &"count".into(), &(*count as u32).into())?;
        }
    }
    Ok(desc.into())
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use spatial::Window;

    /// Curve identifiers standing in for the plot's curve objects.
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct CurveId(u32);

    fn sample_plot() -> SpatialIndex<CurveId> {
        let mut index = SpatialIndex::new();
        // A rising line and a flat line, 101 samples each over [0, 100].
        let xs: Vec<f64> = (0..=100).map(f64::from).collect();
        let rising: Vec<f64> = xs.iter().map(|x| x * 2.0).collect();
        let flat = vec![50.0; xs.len()];
        index.insert_series(&xs, &rising, CurveId(0)).unwrap();
        index.insert_series(&xs, &flat, CurveId(1)).unwrap();
        index
    }

    /// Legend placement: pick the candidate box holding the fewest points.
    #[test]
    fn test_legend_placement_by_window_counts() {
        let index = sample_plot();
        assert_eq!(index.count(), 202);

        let candidates = [
            ("nw", Window::from_extent(0.0, 200.0, 20.0, -40.0)),
            ("ne", Window::from_extent(100.0, 200.0, -20.0, -40.0)),
            ("sw", Window::from_extent(0.0, 0.0, 20.0, 40.0)),
            ("se", Window::from_extent(100.0, 0.0, -20.0, 40.0)),
        ];
        let counts: Vec<usize> = candidates
            .iter()
            .map(|(_, window)| index.count_window(window))
            .collect();
        println!("legend candidate counts: {:?}", counts);

        let (best, _) = candidates
            .iter()
            .zip(&counts)
            .min_by_key(|(_, count)| **count)
            .map(|((name, _), count)| (*name, *count))
            .unwrap();
        // The rising line passes through sw (0..20) and ne (80..100).
        assert!(best == "nw" || best == "se", "got {best}");
        assert_eq!(counts[0], 0);
        assert_eq!(counts[3], 0);
        assert_eq!(counts[2], 21, "x = 0..=20 on the rising line");
    }

    /// Cursor snapping with pixel units: the X axis spans 100 units over
    /// 500 px, the Y axis 200 units over 250 px.
    #[test]
    fn test_cursor_snapping_with_pixel_units() {
        let index = sample_plot();
        let query = ClosestQuery::new().with_units(100.0 / 500.0, 200.0 / 250.0);

        let hit = index.closest(30.2, 51.0, &query).unwrap().unwrap();
        assert_eq!(*hit.payload, CurveId(1));
        assert_eq!((hit.x, hit.y), (30.0, 50.0));
        assert_eq!(hit.index, 30);

        let hit = index.closest(70.0, 139.0, &query).unwrap().unwrap();
        assert_eq!(*hit.payload, CurveId(0));
        assert_eq!(hit.index, 70);
    }

    /// Deleting a curve removes all of its points and nothing else.
    #[test]
    fn test_delete_curve() {
        let mut index = sample_plot();
        let removed = index.remove(&CurveId(0));
        assert_eq!(removed, 101);
        assert_eq!(index.count(), 101);
        for x in [0.0, 25.0, 50.0, 100.0] {
            let hit = index.nearest(x, x * 2.0).unwrap();
            assert_eq!(*hit.payload, CurveId(1));
        }
        // The two curves cross at (25, 50): only the flat one is left there.
        assert_eq!(index.count_in(25.0, 50.0, 25.0, 50.0), 1);
    }

    /// Clearing and reloading behaves like a fresh index.
    #[test]
    fn test_clear_and_reload() {
        let mut index = sample_plot();
        index.clear();
        assert_eq!(index.count(), 0);
        assert!(index.nearest(0.0, 0.0).is_none());

        let added = index
            .insert_series(&[1.0, 2.0, 3.0], &[1.0, 4.0, 9.0], CurveId(7))
            .unwrap();
        assert_eq!(added, 3);
        assert_eq!(index.count(), 3);
        assert_eq!(index.count_in(0.0, 0.0, 2.0, 4.0), 2);

        let outline = index.outline();
        assert_eq!(outline.points.len(), 6);
        assert!(!outline.boxes.is_empty());
    }
}
