use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use crc::{CRC_64_ECMA_182, Crc};

pub const MAGIC: [u8; 8] = *b"KIRASEGV";
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 184;

pub const PAYLOAD_CRC: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeHeaderV1 {
    pub version: u32,
    pub dims: [u32; 3],
    pub spacing: [f64; 3],
    pub affine: [[f64; 4]; 4],
    pub payload_crc64: u64,
}

impl VolumeHeaderV1 {
    /// `None` when the dims overflow `usize`.
    pub fn n_voxels(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d as usize))
    }
}

pub fn write_header<W: Write>(mut w: W, header: &VolumeHeaderV1) -> Result<()> {
    w.write_all(&MAGIC)?;
    w.write_all(&header.version.to_le_bytes())?;
    for d in header.dims {
        w.write_all(&d.to_le_bytes())?;
    }
    for s in header.spacing {
        w.write_all(&s.to_le_bytes())?;
    }
    for row in header.affine {
        for v in row {
            w.write_all(&v.to_le_bytes())?;
        }
    }
    w.write_all(&header.payload_crc64.to_le_bytes())?;
    Ok(())
}

pub fn read_header<R: Read>(mut r: R) -> Result<VolumeHeaderV1> {
    let mut magic = [0u8; 8];
    r.read_exact(&mut magic).context("failed to read volume magic")?;
    if magic != MAGIC {
        bail!("volume magic mismatch");
    }
    let version = read_u32(&mut r)?;
    if version != VERSION {
        bail!("unsupported volume version {}", version);
    }
    let mut dims = [0u32; 3];
    for d in dims.iter_mut() {
        *d = read_u32(&mut r)?;
    }
    let mut spacing = [0f64; 3];
    for s in spacing.iter_mut() {
        *s = read_f64(&mut r)?;
    }
    if spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        bail!("volume spacing must be positive and finite, got {:?}", spacing);
    }
    let mut affine = [[0f64; 4]; 4];
    for row in affine.iter_mut() {
        for v in row.iter_mut() {
            *v = read_f64(&mut r)?;
        }
    }
    let payload_crc64 = read_u64(&mut r)?;
    Ok(VolumeHeaderV1 {
        version,
        dims,
        spacing,
        affine,
        payload_crc64,
    })
}

fn read_u32<R: Read>(mut r: R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf).context("failed to read u32")?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(mut r: R) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf).context("failed to read u64")?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64<R: Read>(mut r: R) -> Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf).context("failed to read f64")?;
    Ok(f64::from_le_bytes(buf))
}
