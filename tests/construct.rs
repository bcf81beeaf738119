use std::collections::BTreeMap;

use kira_segeval::construct::hull::convex_hull_mask;
use kira_segeval::construct::morph::closing;
use kira_segeval::construct::{
    ConstructionPolicy, LabelGroups, build_segmentation, painting_order,
};
use kira_segeval::error::EvalError;
use kira_segeval::labels::LabelRegistry;
use kira_segeval::volume::Volume;
use ndarray::Array3;

const KIDNEY: u8 = 1;
const URETER: u8 = 2;
const TUMOR: u8 = 6;

fn line(len: usize, on: &[usize]) -> Volume {
    let mut a = Array3::<u8>::zeros((1, 1, len));
    for &x in on {
        a[[0, 0, x]] = 1;
    }
    Volume::new(a, [1.0, 1.0, 1.0])
}

fn groups(entries: Vec<(u8, Vec<Volume>)>) -> LabelGroups<Volume> {
    entries.into_iter().collect::<BTreeMap<_, _>>()
}

#[test]
fn default_policy_paints_kidney_over_ureter() {
    let reg = LabelRegistry::builtin().unwrap();
    let g = groups(vec![
        (KIDNEY, vec![line(6, &[1, 2, 3])]),
        (URETER, vec![line(6, &[3, 4])]),
        (TUMOR, vec![line(6, &[2])]),
    ]);
    let seg = build_segmentation(&reg, ConstructionPolicy::Default, &g).unwrap();
    let got: Vec<u8> = seg.labels.iter().copied().collect();
    assert_eq!(got, vec![0, 1, 6, 1, 2, 0]);
}

#[test]
fn ureter_on_top_keeps_ureter_over_kidney() {
    let reg = LabelRegistry::builtin().unwrap();
    assert_eq!(
        painting_order(&reg, ConstructionPolicy::UreterOnTop).unwrap(),
        vec![1, 2, 4, 3, 5, 6]
    );
    let g = groups(vec![
        (KIDNEY, vec![line(6, &[1, 2, 3])]),
        (URETER, vec![line(6, &[3, 4])]),
        (TUMOR, vec![line(6, &[2])]),
    ]);
    let seg = build_segmentation(&reg, ConstructionPolicy::UreterOnTop, &g).unwrap();
    let got: Vec<u8> = seg.labels.iter().copied().collect();
    assert_eq!(got, vec![0, 1, 6, 2, 2, 0]);
}

#[test]
fn multiple_instances_are_all_painted() {
    let reg = LabelRegistry::builtin().unwrap();
    let g = groups(vec![(KIDNEY, vec![line(5, &[0]), line(5, &[4])])]);
    let seg = build_segmentation(&reg, ConstructionPolicy::Default, &g).unwrap();
    let got: Vec<u8> = seg.labels.iter().copied().collect();
    assert_eq!(got, vec![1, 0, 0, 0, 1]);
}

#[test]
fn convex_hull_turns_enclosed_ureter_into_kidney() {
    let reg = LabelRegistry::builtin().unwrap();
    let g = groups(vec![
        (KIDNEY, vec![line(8, &[1, 5])]),
        (URETER, vec![line(8, &[3, 7])]),
    ]);

    let plain = build_segmentation(&reg, ConstructionPolicy::Default, &g).unwrap();
    assert_eq!(plain.labels[[0, 0, 3]], URETER);

    let hull = build_segmentation(&reg, ConstructionPolicy::ConvexHull, &g).unwrap();
    assert_eq!(hull.labels[[0, 0, 3]], KIDNEY);
    assert_eq!(hull.labels[[0, 0, 7]], URETER);
    assert_eq!(hull.labels[[0, 0, 4]], 0);
}

#[test]
fn closed_kidney_fills_small_gaps_only() {
    let reg = LabelRegistry::builtin().unwrap();
    let g = groups(vec![
        (KIDNEY, vec![line(12, &[2, 3, 5, 6])]),
        (URETER, vec![line(12, &[4, 10])]),
    ]);
    let policy = ConstructionPolicy::ClosedKidney { radius_mm: 1.5 };
    let seg = build_segmentation(&reg, policy, &g).unwrap();
    assert_eq!(seg.labels[[0, 0, 4]], KIDNEY);
    assert_eq!(seg.labels[[0, 0, 10]], URETER);
}

#[test]
fn mismatched_delineations_fail() {
    let reg = LabelRegistry::builtin().unwrap();
    let g = groups(vec![
        (KIDNEY, vec![line(6, &[1])]),
        (TUMOR, vec![line(7, &[1])]),
    ]);
    let err = build_segmentation(&reg, ConstructionPolicy::Default, &g).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::ShapeMismatch { .. })
    ));
}

#[test]
fn nothing_to_paint_is_config_error() {
    let reg = LabelRegistry::builtin().unwrap();
    let g: LabelGroups<Volume> = BTreeMap::new();
    let err = build_segmentation(&reg, ConstructionPolicy::Default, &g).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::Config(_))
    ));

    let unknown = groups(vec![(9, vec![line(3, &[0])])]);
    assert!(build_segmentation(&reg, ConstructionPolicy::Default, &unknown).is_err());
}

fn count(mask: &Array3<bool>) -> usize {
    mask.iter().filter(|&&v| v).count()
}

/// Single-slice lattice triangle `x >= 0, y >= 0, y + slope * x <= 60`.
fn triangle_slice(slope: usize) -> Array3<bool> {
    let width = 60 / slope + 1;
    Array3::from_shape_fn((1, 61, width), |(_, y, x)| y + slope * x <= 60)
}

#[test]
fn hull_of_diagonal_segment_is_the_segment() {
    let mut mask = Array3::from_elem((5, 5, 5), false);
    mask[[0, 0, 0]] = true;
    mask[[4, 4, 4]] = true;
    let hull = convex_hull_mask(&mask);
    assert_eq!(count(&hull), 5);
    for k in 0..5 {
        assert!(hull[[k, k, k]]);
    }
    assert!(!hull[[0, 4, 0]]);
}

#[test]
fn hull_of_slanted_triangle_is_exact() {
    for slope in [3, 4] {
        let full = triangle_slice(slope);
        let mut holed = full.clone();
        holed[[0, 10, 5]] = false;
        holed[[0, 30, 2]] = false;

        let hull = convex_hull_mask(&holed);
        assert_eq!(hull, full, "slope {slope}");
    }
    assert_eq!(count(&triangle_slice(3)), 651);
}

#[test]
fn hull_of_tetrahedron_vertices_matches_lattice_simplex() {
    let shape = (11, 21, 21);
    let simplex = Array3::from_shape_fn(shape, |(z, y, x)| x + y + 2 * z <= 20);
    let mut corners = Array3::from_elem(shape, false);
    for idx in [[0, 0, 0], [10, 0, 0], [0, 20, 0], [0, 0, 20]] {
        corners[idx] = true;
    }
    let hull = convex_hull_mask(&corners);
    assert_eq!(hull, simplex);
    assert!(!hull[[1, 10, 10]]);
    assert!(hull[[0, 10, 10]]);
}

#[test]
fn hull_of_box_corners_fills_box() {
    let mut mask = Array3::from_elem((6, 7, 8), false);
    for z in [1, 4] {
        for y in [2, 5] {
            for x in [1, 6] {
                mask[[z, y, x]] = true;
            }
        }
    }
    let hull = convex_hull_mask(&mask);
    assert_eq!(count(&hull), 4 * 4 * 6);
    assert!(hull[[2, 3, 4]]);
    assert!(!hull[[0, 3, 4]]);
}

#[test]
fn closing_bridges_gap_between_slabs() {
    let mut mask = Array3::from_elem((3, 3, 12), false);
    for z in 0..3 {
        for y in 0..3 {
            mask[[z, y, 3]] = true;
            mask[[z, y, 7]] = true;
        }
    }
    let closed = closing(&mask, [1.0, 1.0, 1.0], 2.5);
    for x in 3..=7 {
        assert!(closed[[1, 1, x]], "x={x} should be closed");
    }
    assert!(!closed[[1, 1, 0]]);
    assert!(!closed[[1, 1, 2]]);
    assert!(!closed[[1, 1, 9]]);
}
