//! The grid store: one HDF5 container, one shared geometry, many keyed
//! datasets.
//!
//! A [`GridStore`] owns the container handle exclusively. The first
//! [`add`](GridStore::add) records the grid geometry under `/meta`; every
//! later `add` must match it exactly. [`read`](GridStore::read) translates an
//! optional coordinate bounding box into an [`IndexWindow`] and hyperslab-reads
//! only that window from `/data/<key>`.
//!
//! Container layout:
//! ```text
//! /meta                   group; attributes coord_sys, field_type
//! /meta/min_coords        3 floats
//! /meta/node_intervals    3 floats
//! /meta/npts              3 integers
//! /data/<key>             f64 array, shape npts (+3 trailing for vector)
//! ```

use std::path::{Path, PathBuf};

use hdf5::types::VarLenUnicode;
use ndarray::arr1;
use thiserror::Error;

use crate::field::{Field, FieldShapeError};
use crate::geometry::{FieldType, GridGeometry, InvalidGeometryError, UnknownTagError};
use crate::window::{IndexWindow, InvalidRangeError};

const META_GROUP: &str = "meta";
const DATA_GROUP: &str = "data";

/// The access mode a container is opened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum AccessMode {
    /// Open an existing container for reading only.
    #[display("read-only")]
    ReadOnly,
    /// Open an existing container for reading and writing.
    #[display("read-write")]
    ReadWrite,
    /// Create a container, truncating any existing file at the path.
    #[display("create")]
    Create,
}

/// A container could not be opened in the requested mode.
#[derive(Debug, Error)]
#[error("cannot open container `{}` in {mode} mode", .path.display())]
pub struct AccessError {
    path: PathBuf,
    mode: AccessMode,
    #[source]
    source: hdf5::Error,
}

/// An operation was attempted on a closed store.
#[derive(Clone, Debug, Error)]
#[error("store for container `{}` is closed", .path.display())]
pub struct StoreClosedError {
    path: PathBuf,
}

/// A field's geometry or tags differ from the container's recorded geometry.
#[derive(Clone, Debug, Error)]
#[error("field geometry does not match container geometry: recorded {recorded_type} field on {recorded:?}, offered {offered_type} field on {offered:?}")]
pub struct GeometryMismatchError {
    recorded_type: FieldType,
    recorded: GridGeometry,
    offered_type: FieldType,
    offered: GridGeometry,
}

/// Errors surfaced by [`GridStore`] operations.
#[derive(Debug, Error)]
pub enum GridStoreError {
    /// The container could not be opened or reopened in the requested mode.
    #[error(transparent)]
    Access(#[from] AccessError),
    /// The store has already been closed.
    #[error(transparent)]
    StoreClosed(#[from] StoreClosedError),
    /// A read was attempted before any `add` established the geometry.
    #[error("container has no recorded geometry; `add` a field before reading")]
    GeometryUnavailable,
    /// An `add` supplied geometry or tags inconsistent with the container.
    #[error(transparent)]
    GeometryMismatch(#[from] GeometryMismatchError),
    /// An `add` targeted a key that already has a dataset.
    #[error("dataset `{0}` already exists in the container")]
    KeyConflict(String),
    /// A `read` targeted a key with no dataset.
    #[error("no dataset `{0}` in the container")]
    KeyNotFound(String),
    /// A `read` was given `min_coords >= max_coords` on some axis.
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),
    /// A persisted tag attribute holds an unrecognized string.
    #[error(transparent)]
    UnknownTag(#[from] UnknownTagError),
    /// The persisted geometry vectors are not a valid grid geometry.
    #[error(transparent)]
    Geometry(#[from] InvalidGeometryError),
    /// A stored array's shape does not match the recorded geometry.
    #[error(transparent)]
    FieldShape(#[from] FieldShapeError),
    /// An underlying container fault outside the taxonomy above.
    #[error(transparent)]
    Container(#[from] hdf5::Error),
}

/// A store of gridded fields backed by a single HDF5 container.
///
/// The store is the single authority for geometry consistency within its
/// container and for translating between coordinate space and index space.
/// The handle is released on [`close`](GridStore::close) or on drop, on all
/// exit paths.
#[derive(Debug)]
pub struct GridStore {
    path: PathBuf,
    mode: AccessMode,
    file: Option<hdf5::File>,
}

impl GridStore {
    /// Open the container at `path` in the given access mode.
    ///
    /// # Errors
    /// Returns [`AccessError`] if the path cannot be opened in that mode,
    /// e.g. a missing file in read-only mode.
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Self, GridStoreError> {
        let path = path.as_ref().to_path_buf();
        let file = open_container(&path, mode)?;
        log::debug!("opened container `{}` in {mode} mode", path.display());
        Ok(Self {
            path,
            mode,
            file: Some(file),
        })
    }

    /// The container path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current access mode.
    #[must_use]
    pub const fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Whether the store currently holds an open container handle.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Close the current handle and reopen the same path in a new mode.
    ///
    /// The prior handle is released before reopening, so any state derived
    /// from it is invalidated. If the reopen fails the store is left closed.
    ///
    /// # Errors
    /// Returns [`AccessError`] under the same conditions as
    /// [`open`](GridStore::open).
    pub fn set_mode(&mut self, mode: AccessMode) -> Result<(), GridStoreError> {
        drop(self.file.take());
        let file = open_container(&self.path, mode)?;
        self.file = Some(file);
        self.mode = mode;
        log::debug!(
            "reopened container `{}` in {mode} mode",
            self.path.display()
        );
        Ok(())
    }

    /// Store a field's values under `key`.
    ///
    /// The first `add` records the field's tags and geometry under `/meta`.
    /// Every later `add` is validated against that record element-wise before
    /// anything is written; mismatches are rejected, never coerced.
    ///
    /// # Errors
    /// Returns [`GeometryMismatchError`] if the field's tags or geometry
    /// differ from the container's record, [`GridStoreError::KeyConflict`] if
    /// `key` already has a dataset, and [`StoreClosedError`] if the store is
    /// closed.
    pub fn add(&self, field: &Field, key: &str) -> Result<(), GridStoreError> {
        let file = self.file()?;

        if file.link_exists(META_GROUP) {
            let (recorded_type, recorded) = read_meta(file)?;
            if field.field_type() != recorded_type || field.geometry() != &recorded {
                return Err(GeometryMismatchError {
                    recorded_type,
                    recorded,
                    offered_type: field.field_type(),
                    offered: field.geometry().clone(),
                }
                .into());
            }
        } else {
            write_meta(file, field)?;
            log::debug!(
                "recorded {} {} geometry in container `{}`",
                field.coord_sys(),
                field.field_type(),
                self.path.display()
            );
        }

        let data = if file.link_exists(DATA_GROUP) {
            file.group(DATA_GROUP)?
        } else {
            file.create_group(DATA_GROUP)?
        };
        if data.link_exists(key) {
            return Err(GridStoreError::KeyConflict(key.to_string()));
        }
        data.new_dataset_builder()
            .with_data(field.values())
            .create(key)?;
        log::debug!(
            "stored dataset `{key}` in container `{}`",
            self.path.display()
        );
        Ok(())
    }

    /// Read the field stored under `key`, optionally windowed to a
    /// coordinate bounding box.
    ///
    /// With bounds given, only the minimal index window containing the
    /// requested box is read from storage, and the returned field's geometry
    /// reflects the windowed sub-region. Bounds outside the grid extent clamp
    /// to the grid edges.
    ///
    /// # Errors
    /// Returns [`GridStoreError::GeometryUnavailable`] if no geometry has
    /// been recorded, [`InvalidRangeError`] if `min_coords >= max_coords` on
    /// any axis, [`GridStoreError::KeyNotFound`] if `key` has no dataset, and
    /// [`StoreClosedError`] if the store is closed.
    pub fn read(
        &self,
        key: &str,
        min_coords: Option<[f64; 3]>,
        max_coords: Option<[f64; 3]>,
    ) -> Result<Field, GridStoreError> {
        let file = self.file()?;

        if !file.link_exists(META_GROUP) {
            return Err(GridStoreError::GeometryUnavailable);
        }
        let (field_type, geometry) = read_meta(file)?;

        let window = IndexWindow::new(&geometry, min_coords, max_coords)?;
        log::trace!(
            "index window for `{key}`: start {:?}, end {:?}",
            window.start(),
            window.end()
        );

        if !file.link_exists(DATA_GROUP) {
            return Err(GridStoreError::KeyNotFound(key.to_string()));
        }
        let data = file.group(DATA_GROUP)?;
        if !data.link_exists(key) {
            return Err(GridStoreError::KeyNotFound(key.to_string()));
        }
        let dataset = data.dataset(key)?;

        let [x, y, z] = window.ranges();
        let values = match field_type {
            FieldType::Scalar => dataset
                .read_slice::<f64, _, ndarray::Ix3>((x, y, z))?
                .into_dyn(),
            FieldType::Vector => dataset
                .read_slice::<f64, _, ndarray::Ix4>((x, y, z, ..))?
                .into_dyn(),
        };

        let narrowed = window.narrowed_geometry(&geometry)?;
        Ok(Field::from_parts(field_type, narrowed, values)?)
    }

    /// Flush and release the container handle.
    ///
    /// Idempotent: closing an already-closed store is a no-op. Dropping the
    /// store also releases the handle.
    ///
    /// # Errors
    /// Returns [`GridStoreError::Container`] if the container fails to flush
    /// on close.
    pub fn close(&mut self) -> Result<(), GridStoreError> {
        if let Some(file) = self.file.take() {
            file.close()?;
            log::debug!("closed container `{}`", self.path.display());
        }
        Ok(())
    }

    fn file(&self) -> Result<&hdf5::File, GridStoreError> {
        self.file.as_ref().ok_or_else(|| {
            StoreClosedError {
                path: self.path.clone(),
            }
            .into()
        })
    }
}

fn open_container(path: &Path, mode: AccessMode) -> Result<hdf5::File, AccessError> {
    let result = match mode {
        AccessMode::ReadOnly => hdf5::File::open(path),
        AccessMode::ReadWrite => hdf5::File::open_rw(path),
        AccessMode::Create => hdf5::File::create(path),
    };
    result.map_err(|source| AccessError {
        path: path.to_path_buf(),
        mode,
        source,
    })
}

fn write_meta(file: &hdf5::File, field: &Field) -> Result<(), hdf5::Error> {
    let meta = file.create_group(META_GROUP)?;
    write_tag_attr(&meta, "coord_sys", field.coord_sys().as_str())?;
    write_tag_attr(&meta, "field_type", field.field_type().as_str())?;
    let min_coords = arr1(&field.min_coords());
    meta.new_dataset_builder()
        .with_data(&min_coords)
        .create("min_coords")?;
    let node_intervals = arr1(&field.node_intervals());
    meta.new_dataset_builder()
        .with_data(&node_intervals)
        .create("node_intervals")?;
    let npts = arr1(&field.npts().map(|n| n as u64));
    meta.new_dataset_builder().with_data(&npts).create("npts")?;
    Ok(())
}

fn read_meta(file: &hdf5::File) -> Result<(FieldType, GridGeometry), GridStoreError> {
    let meta = file.group(META_GROUP)?;
    let coord_sys = read_tag_attr(&meta, "coord_sys")?.parse()?;
    let field_type = read_tag_attr(&meta, "field_type")?.parse()?;
    let min_coords = read_triplet_f64(&meta, "min_coords")?;
    let node_intervals = read_triplet_f64(&meta, "node_intervals")?;
    let npts_stored = meta.dataset("npts")?.read_1d::<u64>()?;
    if npts_stored.len() != 3 {
        return Err(
            hdf5::Error::from(format!("meta/npts has {} elements, expected 3", npts_stored.len()))
                .into(),
        );
    }
    let npts = std::array::from_fn(|axis| npts_stored[axis] as usize);
    let geometry = GridGeometry::new(coord_sys, min_coords, node_intervals, npts)?;
    Ok((field_type, geometry))
}

fn read_triplet_f64(group: &hdf5::Group, name: &str) -> Result<[f64; 3], GridStoreError> {
    let stored = group.dataset(name)?.read_1d::<f64>()?;
    if stored.len() != 3 {
        return Err(hdf5::Error::from(format!(
            "meta/{name} has {} elements, expected 3",
            stored.len()
        ))
        .into());
    }
    Ok(std::array::from_fn(|axis| stored[axis]))
}

fn write_tag_attr(group: &hdf5::Group, name: &str, value: &str) -> Result<(), hdf5::Error> {
    let value: VarLenUnicode = value
        .parse()
        .map_err(|err: hdf5::types::StringError| hdf5::Error::from(err.to_string()))?;
    group
        .new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

fn read_tag_attr(group: &hdf5::Group, name: &str) -> Result<String, hdf5::Error> {
    Ok(group.attr(name)?.read_scalar::<VarLenUnicode>()?.to_string())
}
