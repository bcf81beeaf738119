use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use ndarray::Array3;

use crate::io::open_maybe_gz;
use crate::volume::Volume;
use crate::volume::layout::{PAYLOAD_CRC, read_header};

pub fn read_volume(path: &Path) -> Result<Volume> {
    let mut reader =
        open_maybe_gz(path).with_context(|| format!("failed to open {}", path.display()))?;
    let header =
        read_header(&mut reader).with_context(|| format!("bad volume header {}", path.display()))?;

    let Some(n) = header.n_voxels() else {
        bail!("{}: dims {:?} overflow the voxel count", path.display(), header.dims);
    };
    // Grows with the bytes actually present; dims alone never size the buffer.
    let mut payload = Vec::new();
    reader
        .by_ref()
        .take(n as u64)
        .read_to_end(&mut payload)
        .with_context(|| format!("failed to read volume payload {}", path.display()))?;
    if payload.len() != n {
        bail!(
            "{}: truncated volume payload, {} of {} voxels",
            path.display(),
            payload.len(),
            n
        );
    }
    let mut extra = [0u8; 1];
    if reader.read(&mut extra)? != 0 {
        bail!(
            "{}: trailing bytes after {} voxels",
            path.display(),
            n
        );
    }

    let crc = PAYLOAD_CRC.checksum(&payload);
    if crc != header.payload_crc64 {
        bail!("{}: payload CRC mismatch", path.display());
    }

    let shape = (
        header.dims[0] as usize,
        header.dims[1] as usize,
        header.dims[2] as usize,
    );
    let labels = Array3::from_shape_vec(shape, payload)
        .with_context(|| format!("{}: payload does not match dims", path.display()))?;
    Ok(Volume {
        labels,
        spacing: header.spacing,
        affine: header.affine,
    })
}
