use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::volume::Volume;
use crate::volume::layout::{PAYLOAD_CRC, VERSION, VolumeHeaderV1, write_header};

/// Writes through a sibling `.partial` file and renames, so an existing
/// output path always holds a complete volume.
pub fn write_volume(path: &Path, volume: &Volume) -> Result<()> {
    let dims = volume.shape();
    let owned;
    let payload: &[u8] = match volume.labels.as_slice() {
        Some(slice) => slice,
        None => {
            owned = volume.labels.iter().copied().collect::<Vec<u8>>();
            &owned
        }
    };

    let header = VolumeHeaderV1 {
        version: VERSION,
        dims: [dims[0] as u32, dims[1] as u32, dims[2] as u32],
        spacing: volume.spacing,
        affine: volume.affine,
        payload_crc64: PAYLOAD_CRC.checksum(payload),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let partial = partial_path(path);
    let file = File::create(&partial)
        .with_context(|| format!("failed to create {}", partial.display()))?;
    let w = BufWriter::new(file);

    if is_gz(path) {
        let mut enc = GzEncoder::new(w, Compression::fast());
        write_header(&mut enc, &header)?;
        enc.write_all(payload)?;
        enc.finish()?.flush()?;
    } else {
        let mut w = w;
        write_header(&mut w, &header)?;
        w.write_all(payload)?;
        w.flush()?;
    }

    fs::rename(&partial, path)
        .with_context(|| format!("failed to move volume into {}", path.display()))?;
    Ok(())
}

fn is_gz(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("gz")
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}
