#![allow(missing_docs)]

use std::error::Error;
use std::path::PathBuf;

use ndarray::{s, Array3, Array4};
use tempfile::TempDir;

use gridstore::{
    AccessMode, CoordSys, Field, FieldType, GridGeometry, GridStore, GridStoreError,
};

fn container_path(dir: &TempDir) -> PathBuf {
    dir.path().join("fields.h5")
}

fn unit_geometry() -> GridGeometry {
    GridGeometry::new(CoordSys::Cartesian, [0.0; 3], [1.0; 3], [10; 3]).unwrap()
}

fn scalar_values() -> Array3<f64> {
    Array3::from_shape_fn((10, 10, 10), |(i, j, k)| (i * 100 + j * 10 + k) as f64)
}

fn vector_values() -> Array4<f64> {
    Array4::from_shape_fn((10, 10, 10, 3), |(i, j, k, c)| {
        (i * 1000 + j * 100 + k * 10 + c) as f64
    })
}

#[test]
fn scalar_round_trip() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let mut store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt_station_a")?;

    let read = store.read("tt_station_a", None, None)?;
    assert_eq!(read, field);
    assert_eq!(read.field_type(), FieldType::Scalar);
    assert_eq!(read.coord_sys(), CoordSys::Cartesian);
    assert_eq!(read.npts(), [10; 3]);
    store.close()?;
    Ok(())
}

#[test]
fn vector_round_trip() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let mut store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::vector(unit_geometry(), vector_values())?;
    store.add(&field, "gradients")?;

    let read = store.read("gradients", None, None)?;
    assert_eq!(read, field);
    assert_eq!(read.field_type(), FieldType::Vector);
    assert_eq!(read.values().shape(), &[10, 10, 10, 3]);
    store.close()?;
    Ok(())
}

#[test]
fn persists_across_instances() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let path = container_path(&dir);
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    {
        let mut store = GridStore::open(&path, AccessMode::Create)?;
        store.add(&field, "tt")?;
        store.close()?;
    }
    let store = GridStore::open(&path, AccessMode::ReadOnly)?;
    assert_eq!(store.read("tt", None, None)?, field);
    Ok(())
}

#[test]
fn windowed_read_contains_requested_range() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let values = scalar_values();
    let field = Field::scalar(unit_geometry(), values.clone())?;
    store.add(&field, "tt")?;

    let min = [2.5, 2.5, 2.5];
    let max = [4.5, 4.5, 4.5];
    let window = store.read("tt", Some(min), Some(max))?;

    // floor(2.5) = 2, ceil(4.5) + 1 = 6: indices [2, 6) per axis
    assert_eq!(window.min_coords(), [2.0; 3]);
    assert_eq!(window.npts(), [4; 3]);
    assert_eq!(window.node_intervals(), [1.0; 3]);
    for axis in 0..3 {
        assert!(window.min_coords()[axis] <= min[axis]);
        assert!(window.max_coords()[axis] >= max[axis]);
    }
    assert_eq!(
        window.values(),
        &values.slice(s![2..6, 2..6, 2..6]).into_dyn()
    );
    Ok(())
}

#[test]
fn windowed_vector_read_keeps_component_axis() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let values = vector_values();
    let field = Field::vector(unit_geometry(), values.clone())?;
    store.add(&field, "gradients")?;

    let window = store.read("gradients", Some([1.0; 3]), Some([3.0; 3]))?;
    assert_eq!(window.npts(), [3; 3]);
    assert_eq!(
        window.values(),
        &values.slice(s![1..4, 1..4, 1..4, ..]).into_dyn()
    );
    Ok(())
}

#[test]
fn full_extent_bounds_match_unbounded_read() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt")?;

    let unbounded = store.read("tt", None, None)?;
    let bounded = store.read("tt", Some([0.0; 3]), Some([9.0; 3]))?;
    assert_eq!(bounded, unbounded);
    Ok(())
}

#[test]
fn out_of_range_bounds_clamp_to_grid_edges() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt")?;

    let window = store.read("tt", Some([-5.0; 3]), Some([15.0; 3]))?;
    assert_eq!(window.min_coords(), [0.0; 3]);
    assert_eq!(window.npts(), [10; 3]);
    Ok(())
}

#[test]
fn mismatched_geometry_rejected_without_partial_write() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt")?;

    // each single-component difference must be rejected
    let shifted_origin =
        GridGeometry::new(CoordSys::Cartesian, [0.5, 0.0, 0.0], [1.0; 3], [10; 3])?;
    let coarser =
        GridGeometry::new(CoordSys::Cartesian, [0.0; 3], [1.0, 1.0, 2.0], [10; 3])?;
    let spherical = GridGeometry::new(CoordSys::Spherical, [0.0; 3], [1.0; 3], [10; 3])?;
    for geometry in [shifted_origin, coarser, spherical] {
        let npts = geometry.npts();
        let other = Field::scalar(geometry, Array3::zeros(npts))?;
        let err = store.add(&other, "other").unwrap_err();
        assert!(matches!(err, GridStoreError::GeometryMismatch(_)), "{err}");
    }
    let smaller = GridGeometry::new(CoordSys::Cartesian, [0.0; 3], [1.0; 3], [9, 10, 10])?;
    let other = Field::scalar(smaller, Array3::zeros((9, 10, 10)))?;
    assert!(matches!(
        store.add(&other, "other").unwrap_err(),
        GridStoreError::GeometryMismatch(_)
    ));

    // a vector field on the same grid still mismatches the recorded field type
    let vector = Field::vector(unit_geometry(), vector_values())?;
    assert!(matches!(
        store.add(&vector, "other").unwrap_err(),
        GridStoreError::GeometryMismatch(_)
    ));

    // nothing was written and the original dataset is intact
    assert!(matches!(
        store.read("other", None, None).unwrap_err(),
        GridStoreError::KeyNotFound(_)
    ));
    assert_eq!(store.read("tt", None, None)?, field);
    Ok(())
}

#[test]
fn duplicate_key_rejected() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt")?;

    let replacement = Field::scalar(unit_geometry(), Array3::zeros((10, 10, 10)))?;
    assert!(matches!(
        store.add(&replacement, "tt").unwrap_err(),
        GridStoreError::KeyConflict(_)
    ));
    // first dataset is unmodified
    assert_eq!(store.read("tt", None, None)?, field);
    Ok(())
}

#[test]
fn read_before_any_add_fails() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    assert!(matches!(
        store.read("tt", None, None).unwrap_err(),
        GridStoreError::GeometryUnavailable
    ));
    Ok(())
}

#[test]
fn missing_key_fails() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt")?;
    assert!(matches!(
        store.read("absent", None, None).unwrap_err(),
        GridStoreError::KeyNotFound(_)
    ));
    Ok(())
}

#[test]
fn inverted_bounds_fail() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt")?;
    assert!(matches!(
        store
            .read("tt", Some([1.0, 2.0, 3.0]), Some([1.0, 5.0, 5.0]))
            .unwrap_err(),
        GridStoreError::InvalidRange(_)
    ));
    Ok(())
}

#[test]
fn open_missing_file_read_only_fails() {
    let dir = TempDir::new().unwrap();
    let err = GridStore::open(dir.path().join("absent.h5"), AccessMode::ReadOnly).unwrap_err();
    assert!(matches!(err, GridStoreError::Access(_)), "{err}");
}

#[test]
fn set_mode_replaces_the_handle() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let mut store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt")?;

    store.set_mode(AccessMode::ReadOnly)?;
    assert_eq!(store.mode(), AccessMode::ReadOnly);
    assert_eq!(store.read("tt", None, None)?, field);
    assert!(store.add(&field, "tt2").is_err());

    store.set_mode(AccessMode::ReadWrite)?;
    store.add(&field, "tt2")?;
    assert_eq!(store.read("tt2", None, None)?, field);
    Ok(())
}

#[test]
fn close_is_idempotent_and_terminal() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    let mut store = GridStore::open(container_path(&dir), AccessMode::Create)?;
    let field = Field::scalar(unit_geometry(), scalar_values())?;
    store.add(&field, "tt")?;

    assert!(store.is_open());
    store.close()?;
    assert!(!store.is_open());
    store.close()?;

    assert!(matches!(
        store.read("tt", None, None).unwrap_err(),
        GridStoreError::StoreClosed(_)
    ));
    assert!(matches!(
        store.add(&field, "tt3").unwrap_err(),
        GridStoreError::StoreClosed(_)
    ));

    // a closed store can be reopened through set_mode
    store.set_mode(AccessMode::ReadOnly)?;
    assert_eq!(store.read("tt", None, None)?, field);
    Ok(())
}
