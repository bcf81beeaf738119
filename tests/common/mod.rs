#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use kira_segeval::volume::{Volume, write_volume};
use ndarray::Array3;

pub const SHAPE: (usize, usize, usize) = (4, 6, 6);
pub const SPACING: [f64; 3] = [2.0, 1.0, 1.0];

/// Binary delineation with a box `[lo, hi)` set to 1.
pub fn box_volume(lo: [usize; 3], hi: [usize; 3]) -> Volume {
    let mut a = Array3::<u8>::zeros(SHAPE);
    for z in lo[0]..hi[0] {
        for y in lo[1]..hi[1] {
            for x in lo[2]..hi[2] {
                a[[z, y, x]] = 1;
            }
        }
    }
    Volume::new(a, SPACING)
}

pub fn write_delineation(
    case_dir: &Path,
    structure: &str,
    instance: u32,
    annotator: u32,
    volume: &Volume,
) -> PathBuf {
    let path = case_dir.join("segmentations").join(format!(
        "{structure}_instance-{instance}_annotation-{annotator}.kvol.gz"
    ));
    write_volume(&path, volume).unwrap();
    path
}

/// A case with one kidney instance and one tumor instance, three annotators
/// each, every annotator drawing a slightly different box.
pub fn write_case(root: &Path, name: &str) -> PathBuf {
    let case_dir = root.join(name);
    fs::create_dir_all(case_dir.join("segmentations")).unwrap();
    for a in 1..=3u32 {
        let k = a as usize;
        write_delineation(
            &case_dir,
            "kidney",
            1,
            a,
            &box_volume([0, 1, 1], [3, 4 + k / 2, 3 + k]),
        );
        write_delineation(
            &case_dir,
            "tumor",
            1,
            a,
            &box_volume([1, 2, 2], [2, 3, 2 + k]),
        );
    }
    case_dir
}
