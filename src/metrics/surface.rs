use ndarray::{Array3, ArrayView3};

use crate::metrics::edt::squared_edt;
use crate::volume::mask::bounding_box;

/// Foreground voxels with at least one background face neighbour. Voxels on
/// the view boundary count as surface.
pub fn border(mask: ArrayView3<'_, bool>) -> Array3<bool> {
    let shape = mask.shape();
    let (dz, dy, dx) = (shape[0], shape[1], shape[2]);
    let mut out = Array3::from_elem((dz, dy, dx), false);
    for ((z, y, x), &v) in mask.indexed_iter() {
        if !v {
            continue;
        }
        let on_edge =
            z == 0 || y == 0 || x == 0 || z + 1 == dz || y + 1 == dy || x + 1 == dx;
        out[[z, y, x]] = on_edge
            || !mask[[z - 1, y, x]]
            || !mask[[z + 1, y, x]]
            || !mask[[z, y - 1, x]]
            || !mask[[z, y + 1, x]]
            || !mask[[z, y, x - 1]]
            || !mask[[z, y, x + 1]];
    }
    out
}

/// Distances from each surface voxel of `a` to the nearest surface voxel of
/// `b`, and the reverse direction, in the physical units of `spacing`.
/// Returns `None` when either mask is empty.
pub fn surface_distances(
    a: &Array3<bool>,
    b: &Array3<bool>,
    spacing: [f64; 3],
) -> Option<(Vec<f64>, Vec<f64>)> {
    bounding_box(&[a])?;
    bounding_box(&[b])?;

    // One voxel of margin keeps crop faces from posing as volume edges:
    // foreground only touches the crop boundary where the volume ends.
    let full = [a.shape()[0], a.shape()[1], a.shape()[2]];
    let bbox = bounding_box(&[a, b])?.expand([1, 1, 1], full);

    let border_a = border(bbox.view(a));
    let border_b = border(bbox.view(b));

    let dt_to_b = squared_edt(border_b.view(), spacing);
    let dt_to_a = squared_edt(border_a.view(), spacing);

    Some((sample(&border_a, &dt_to_b), sample(&border_b, &dt_to_a)))
}

fn sample(points: &Array3<bool>, dist_sq: &Array3<f64>) -> Vec<f64> {
    points
        .iter()
        .zip(dist_sq.iter())
        .filter(|(p, _)| **p)
        .map(|(_, d)| d.sqrt())
        .collect()
}
