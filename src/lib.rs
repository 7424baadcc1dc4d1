//! `gridstore` persists and retrieves scalar and vector fields sampled on a
//! regular 3D grid, stored as named datasets in a single HDF5 container that
//! share one coordinate metadata block.
//!
//! The core of the crate is the windowed read: given an optional coordinate
//! bounding box, [`GridStore::read`] computes the minimal set of grid indices
//! covering the box ([`IndexWindow`]), hyperslab-reads only that window from
//! storage, and reconstructs a [`Field`] whose origin and extent reflect the
//! sub-region. The full grid is never materialized when a window is
//! requested.
//!
//! ## Example
//! ```no_run
//! use gridstore::{AccessMode, CoordSys, Field, GridGeometry, GridStore};
//!
//! let geometry = GridGeometry::new(
//!     CoordSys::Cartesian,
//!     [0.0, 0.0, 0.0], // min_coords
//!     [1.0, 1.0, 1.0], // node_intervals
//!     [10, 10, 10],    // npts
//! )?;
//! let field = Field::scalar(geometry, ndarray::Array3::zeros((10, 10, 10)))?;
//!
//! let mut store = GridStore::open("traveltimes.h5", AccessMode::Create)?;
//! store.add(&field, "station_a")?;
//!
//! // Read back only the sub-region covering the requested bounding box.
//! let window = store.read(
//!     "station_a",
//!     Some([2.5, 2.5, 2.5]),
//!     Some([4.5, 4.5, 4.5]),
//! )?;
//! assert_eq!(window.npts(), [4, 4, 4]);
//! store.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//! `gridstore` logs store operations using the [`log`] crate. A logging
//! implementation must be enabled to capture logs.

pub mod field;
pub mod geometry;
pub mod store;
pub mod window;

pub use field::{Field, FieldShapeError};
pub use geometry::{CoordSys, FieldType, GridGeometry, InvalidGeometryError, UnknownTagError};
pub use store::{
    AccessError, AccessMode, GeometryMismatchError, GridStore, GridStoreError, StoreClosedError,
};
pub use window::{IndexWindow, InvalidRangeError};
