//! Tests of the JavaScript-facing API. Run with `wasm-pack test --node`.

#![cfg(target_arch = "wasm32")]

use js_sys::{Function, Reflect};
use plot_index_wasm::PlotIndexWasm;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn get(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

fn three_points() -> PlotIndexWasm {
    let mut index = PlotIndexWasm::new();
    index.insert(0.0, 0.0, JsValue::from_str("O")).unwrap();
    index.insert(5.0, 0.0, JsValue::from_str("E")).unwrap();
    index.insert(0.0, 5.0, JsValue::from_str("N")).unwrap();
    index
}

#[wasm_bindgen_test]
fn test_count_total_and_window() {
    let index = three_points();
    assert_eq!(index.count(None, None, None, None).unwrap(), 3);
    assert_eq!(index.count(Some(0.0), Some(0.0), Some(4.0), Some(4.0)).unwrap(), 1);
    assert_eq!(index.count_extent(0.0, 0.0, 4.0, 4.0), 1);
}

#[wasm_bindgen_test]
fn test_count_with_partial_bounds_throws() {
    let index = three_points();
    assert!(index.count(Some(0.0), None, None, None).is_err());
    assert!(index.count(Some(0.0), Some(0.0), Some(4.0), None).is_err());
}

#[wasm_bindgen_test]
fn test_closest_returns_payload() {
    let index = three_points();
    let hit = index
        .closest(JsValue::from(1.0), JsValue::from(0.0), None, None, None)
        .unwrap();
    assert_eq!(get(&hit, "payload"), JsValue::from_str("O"));
    assert_eq!(get(&hit, "distance").as_f64(), Some(1.0));
    assert_eq!(get(&hit, "index").as_f64(), Some(0.0));
}

#[wasm_bindgen_test]
fn test_closest_rejects_non_numbers() {
    let index = three_points();
    assert!(index
        .closest(JsValue::from_str("1"), JsValue::from(0.0), None, None, None)
        .is_err());
    assert!(index
        .closest(JsValue::from(0.0), JsValue::UNDEFINED, None, None, None)
        .is_err());
}

#[wasm_bindgen_test]
fn test_closest_outside_radius_is_null() {
    let index = three_points();
    let hit = index
        .closest(JsValue::from(2.5), JsValue::from(2.5), Some(0.5), None, None)
        .unwrap();
    assert!(hit.is_null());
}

#[wasm_bindgen_test]
fn test_remove_by_identity_and_predicate() {
    let mut index = PlotIndexWasm::new();
    index.insert(1.0, 1.0, JsValue::from_str("A")).unwrap();
    index.insert(1.0, 1.0, JsValue::from_str("B")).unwrap();
    index.insert(2.0, 2.0, JsValue::from_str("C")).unwrap();

    assert_eq!(index.remove(JsValue::from_str("A")).unwrap(), 1);
    assert_eq!(index.len(), 2);
    let hit = index
        .closest(JsValue::from(1.0), JsValue::from(1.0), None, None, None)
        .unwrap();
    assert_eq!(get(&hit, "payload"), JsValue::from_str("B"));

    let predicate = Function::new_with_args("p", "return p === 'C';");
    assert_eq!(index.remove(predicate.into()).unwrap(), 1);
    assert_eq!(index.len(), 1);
}

#[wasm_bindgen_test]
fn test_throwing_predicate_removes_nothing() {
    let mut index = three_points();
    let predicate = Function::new_with_args("p", "if (p === 'E') throw new Error('boom'); return true;");
    assert!(index.remove(predicate.into()).is_err());
    assert_eq!(index.len(), 3);
}

#[wasm_bindgen_test]
fn test_add_curve_and_clear() {
    let mut index = PlotIndexWasm::new();
    let curve = JsValue::from_str("curve");
    let added = index
        .add_curve(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0], curve.clone())
        .unwrap();
    assert_eq!(added, 3);
    assert!(index.region().is_some());
    assert_eq!(index.remove(curve).unwrap(), 3);
    assert!(index.is_empty());

    index.insert(1.0, 1.0, JsValue::TRUE).unwrap();
    index.clear();
    assert!(index.is_empty());
    assert!(index
        .closest(JsValue::from(0.0), JsValue::from(0.0), None, None, None)
        .unwrap()
        .is_null());
}

#[wasm_bindgen_test]
fn test_insert_rejects_non_finite() {
    let mut index = PlotIndexWasm::new();
    assert!(index.insert(f64::NAN, 0.0, JsValue::NULL).is_err());
    assert!(index.is_empty());
}

#[wasm_bindgen_test]
fn test_traverse_reports_every_node() {
    let index = three_points();
    let seen = js_sys::Array::new();
    let collect = Function::new_with_args("node, depth", "this.push([node.leaf, depth]);");
    let bound = collect.bind(&seen);
    index.traverse(&bound).unwrap();

    let leaves = seen
        .iter()
        .filter(|pair| Reflect::get_u32(pair, 0).unwrap().is_truthy())
        .count();
    assert_eq!(leaves, 3);
    assert_eq!(Reflect::get_u32(&seen.get(0), 1).unwrap().as_f64(), Some(0.0));
}

#[wasm_bindgen_test]
fn test_outline_is_serialized() {
    let index = three_points();
    let outline = index.outline().unwrap();
    let points = js_sys::Array::from(&get(&outline, "points"));
    assert_eq!(points.length(), 6);
}
