use std::fs;

use kira_segeval::volume::layout::{HEADER_SIZE, VERSION, VolumeHeaderV1, write_header};
use kira_segeval::volume::{Volume, read_volume, write_volume};
use ndarray::Array3;
use tempfile::TempDir;

fn sample_volume() -> Volume {
    let mut labels = Array3::<u8>::zeros((3, 4, 5));
    labels[[1, 2, 3]] = 6;
    labels[[0, 0, 0]] = 1;
    labels[[2, 3, 4]] = 2;
    let mut vol = Volume::new(labels, [2.5, 0.8, 0.8]);
    vol.affine[0][3] = -12.5;
    vol
}

#[test]
fn plain_container_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("seg.kvol");
    let vol = sample_volume();
    write_volume(&path, &vol).unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len() as usize, HEADER_SIZE + 60);
    assert!(!tmp.path().join("seg.kvol.partial").exists());
    let back = read_volume(&path).unwrap();
    assert_eq!(back, vol);
}

#[test]
fn gzip_container_round_trip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("seg.kvol.gz");
    let vol = sample_volume();
    write_volume(&path, &vol).unwrap();

    let raw = fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    assert_eq!(read_volume(&path).unwrap(), vol);
}

#[test]
fn tampered_payload_fails_checksum() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("seg.kvol");
    write_volume(&path, &sample_volume()).unwrap();

    let mut raw = fs::read(&path).unwrap();
    raw[HEADER_SIZE + 7] ^= 0x01;
    fs::write(&path, &raw).unwrap();

    let err = read_volume(&path).unwrap_err();
    assert!(format!("{err:#}").to_lowercase().contains("crc"));
}

#[test]
fn bad_magic_and_truncation_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("seg.kvol");
    write_volume(&path, &sample_volume()).unwrap();
    let raw = fs::read(&path).unwrap();

    let mut bad = raw.clone();
    bad[0] = b'X';
    fs::write(&path, &bad).unwrap();
    assert!(read_volume(&path).is_err());

    fs::write(&path, &raw[..raw.len() - 1]).unwrap();
    assert!(read_volume(&path).is_err());

    let mut long = raw.clone();
    long.push(0);
    fs::write(&path, &long).unwrap();
    assert!(read_volume(&path).is_err());
}

#[test]
fn masks_and_shapes() {
    let vol = sample_volume();
    assert_eq!(vol.shape(), [3, 4, 5]);
    assert!((vol.voxel_volume() - 1.6).abs() < 1e-12);
    let m = vol.mask(&[1, 6]);
    assert!(m[[1, 2, 3]] && m[[0, 0, 0]] && !m[[2, 3, 4]]);
    assert_eq!(vol.foreground().iter().filter(|&&v| v).count(), 3);

    let other = Volume::new(Array3::zeros((3, 4, 6)), [2.5, 0.8, 0.8]);
    assert!(vol.ensure_same_shape(&other).is_err());
    assert!(vol.spacing_matches(&Volume::zeros_like(&vol)));
}

fn header_with_dims(dims: [u32; 3]) -> Vec<u8> {
    let mut affine = [[0.0; 4]; 4];
    for (i, row) in affine.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    let header = VolumeHeaderV1 {
        version: VERSION,
        dims,
        spacing: [1.0, 1.0, 1.0],
        affine,
        payload_crc64: 0,
    };
    let mut raw = Vec::new();
    write_header(&mut raw, &header).unwrap();
    assert_eq!(raw.len(), HEADER_SIZE);
    raw
}

#[test]
fn overflowing_dims_are_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("huge.kvol");
    fs::write(&path, header_with_dims([u32::MAX; 3])).unwrap();

    let err = read_volume(&path).unwrap_err();
    assert!(format!("{err:#}").contains("overflow"));
}

#[test]
fn oversized_dims_with_short_payload_are_truncated() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("short.kvol");
    let mut raw = header_with_dims([1 << 16, 1 << 16, 1 << 8]);
    raw.extend_from_slice(&[0u8; 16]);
    fs::write(&path, &raw).unwrap();

    let err = read_volume(&path).unwrap_err();
    assert!(format!("{err:#}").contains("truncated"));
}
