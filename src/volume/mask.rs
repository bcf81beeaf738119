use ndarray::{Array3, ArrayView3, Zip, s};

/// Half-open voxel box `[lo, hi)` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub lo: [usize; 3],
    pub hi: [usize; 3],
}

impl BoundingBox {
    pub fn shape(&self) -> [usize; 3] {
        [
            self.hi[0] - self.lo[0],
            self.hi[1] - self.lo[1],
            self.hi[2] - self.lo[2],
        ]
    }

    pub fn expand(&self, margin: [usize; 3], shape: [usize; 3]) -> Self {
        let mut lo = self.lo;
        let mut hi = self.hi;
        for axis in 0..3 {
            lo[axis] = lo[axis].saturating_sub(margin[axis]);
            hi[axis] = (hi[axis] + margin[axis]).min(shape[axis]);
        }
        Self { lo, hi }
    }

    pub fn view<'a, T>(&self, arr: &'a Array3<T>) -> ArrayView3<'a, T> {
        arr.slice(s![
            self.lo[0]..self.hi[0],
            self.lo[1]..self.hi[1],
            self.lo[2]..self.hi[2]
        ])
    }
}

pub fn count(mask: &Array3<bool>) -> usize {
    mask.iter().filter(|&&v| v).count()
}

pub fn union_in_place(acc: &mut Array3<bool>, other: &Array3<bool>) {
    Zip::from(acc).and(other).for_each(|a, &b| *a |= b);
}

/// Smallest box holding every `true` voxel of any of the masks.
pub fn bounding_box(masks: &[&Array3<bool>]) -> Option<BoundingBox> {
    let mut lo = [usize::MAX; 3];
    let mut hi = [0usize; 3];
    let mut any = false;
    for mask in masks {
        for ((z, y, x), &v) in mask.indexed_iter() {
            if !v {
                continue;
            }
            any = true;
            let idx = [z, y, x];
            for axis in 0..3 {
                lo[axis] = lo[axis].min(idx[axis]);
                hi[axis] = hi[axis].max(idx[axis] + 1);
            }
        }
    }
    if any { Some(BoundingBox { lo, hi }) } else { None }
}
