//! Morphological closing of kidney masks.

use ndarray::{Array3, s};

use crate::metrics::edt::squared_edt;
use crate::volume::mask::bounding_box;

const EPS: f64 = 1e-9;

/// Morphological closing with a ball of `radius_mm`, measured in physical
/// units so anisotropic spacing gives an ellipsoid in voxel space.
pub fn closing(mask: &Array3<bool>, spacing: [f64; 3], radius_mm: f64) -> Array3<bool> {
    let mut out = Array3::from_elem(mask.raw_dim(), false);
    let Some(bbox) = bounding_box(&[mask]) else {
        return out;
    };
    let full = [mask.shape()[0], mask.shape()[1], mask.shape()[2]];
    let mut margin = [0usize; 3];
    for axis in 0..3 {
        margin[axis] = (radius_mm / spacing[axis]).ceil() as usize + 1;
    }
    let region = bbox.expand(margin, full);
    let r2 = radius_mm * radius_mm + EPS;

    let to_mask = squared_edt(region.view(mask), spacing);
    let dilated = to_mask.mapv(|d| d <= r2);
    let to_outside = squared_edt(dilated.mapv(|v| !v).view(), spacing);

    let mut target = out.slice_mut(s![
        region.lo[0]..region.hi[0],
        region.lo[1]..region.hi[1],
        region.lo[2]..region.hi[2]
    ]);
    ndarray::Zip::from(&mut target)
        .and(&dilated)
        .and(&to_outside)
        .for_each(|o, &d, &e| *o = d && e > r2);
    out
}
