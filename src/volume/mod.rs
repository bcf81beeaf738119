pub mod layout;
pub mod mask;
pub mod reader;
pub mod writer;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::Result;
use ndarray::Array3;

pub use reader::read_volume;
pub use writer::write_volume;

use crate::error::EvalError;

pub const IDENTITY_AFFINE: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Labeled 3-D volume. Axis order is (z, y, x) and `spacing` follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub labels: Array3<u8>,
    pub spacing: [f64; 3],
    pub affine: [[f64; 4]; 4],
}

impl Volume {
    pub fn new(labels: Array3<u8>, spacing: [f64; 3]) -> Self {
        Self {
            labels,
            spacing,
            affine: IDENTITY_AFFINE,
        }
    }

    pub fn zeros_like(other: &Volume) -> Self {
        Self {
            labels: Array3::zeros(other.labels.raw_dim()),
            spacing: other.spacing,
            affine: other.affine,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        let s = self.labels.shape();
        [s[0], s[1], s[2]]
    }

    pub fn ensure_same_shape(&self, other: &Volume) -> Result<(), EvalError> {
        if self.shape() != other.shape() {
            return Err(EvalError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    pub fn spacing_matches(&self, other: &Volume) -> bool {
        self.spacing
            .iter()
            .zip(other.spacing.iter())
            .all(|(a, b)| (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0))
    }

    pub fn voxel_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    pub fn mask(&self, labels: &[u8]) -> Array3<bool> {
        self.labels.mapv(|v| labels.contains(&v))
    }

    pub fn foreground(&self) -> Array3<bool> {
        self.labels.mapv(|v| v != 0)
    }
}

/// Anything the engines can pull a volume from: a file on disk or a volume
/// already in memory.
pub trait VolumeSource: Sync {
    fn load(&self) -> Result<Cow<'_, Volume>>;
    fn describe(&self) -> String;
}

impl VolumeSource for Volume {
    fn load(&self) -> Result<Cow<'_, Volume>> {
        Ok(Cow::Borrowed(self))
    }

    fn describe(&self) -> String {
        format!("<in-memory {:?}>", self.shape())
    }
}

impl VolumeSource for Path {
    fn load(&self) -> Result<Cow<'_, Volume>> {
        Ok(Cow::Owned(read_volume(self)?))
    }

    fn describe(&self) -> String {
        self.display().to_string()
    }
}

impl VolumeSource for PathBuf {
    fn load(&self) -> Result<Cow<'_, Volume>> {
        self.as_path().load()
    }

    fn describe(&self) -> String {
        self.display().to_string()
    }
}
