//! Fields: geometry plus dense sampled values in transit to or from a store.

use ndarray::{Array3, Array4, ArrayD};
use thiserror::Error;

use crate::geometry::{CoordSys, FieldType, GridGeometry};

/// Field values whose shape does not match the grid geometry.
#[derive(Clone, Debug, Error)]
#[error("{field_type} field values with shape {value_shape:?} do not match grid npts {npts:?}")]
pub struct FieldShapeError {
    field_type: FieldType,
    value_shape: Vec<usize>,
    npts: [usize; 3],
}

/// A scalar or vector field sampled on a regular 3D grid.
///
/// Scalar fields hold a 3-dimensional value array of shape `npts`; vector
/// fields hold a 4-dimensional array with a trailing length-3 component axis.
/// A field is a value in transit: callers construct one to store it, and
/// [`GridStore::read`](crate::GridStore::read) reconstructs one (with a
/// possibly narrowed geometry) on the way out.
#[derive(Clone, Debug)]
pub struct Field {
    field_type: FieldType,
    geometry: GridGeometry,
    values: ArrayD<f64>,
    nodes: Option<Array4<f64>>,
}

impl PartialEq for Field {
    // the memoized node mesh is derived state and does not affect equality
    fn eq(&self, other: &Self) -> bool {
        self.field_type == other.field_type
            && self.geometry == other.geometry
            && self.values == other.values
    }
}

impl Field {
    /// Create a scalar field.
    ///
    /// # Errors
    /// Returns [`FieldShapeError`] if the value shape does not equal the
    /// geometry's `npts`.
    pub fn scalar(geometry: GridGeometry, values: Array3<f64>) -> Result<Self, FieldShapeError> {
        Self::from_parts(FieldType::Scalar, geometry, values.into_dyn())
    }

    /// Create a vector field.
    ///
    /// # Errors
    /// Returns [`FieldShapeError`] if the value shape does not equal the
    /// geometry's `npts` plus a trailing axis of length 3.
    pub fn vector(geometry: GridGeometry, values: Array4<f64>) -> Result<Self, FieldShapeError> {
        Self::from_parts(FieldType::Vector, geometry, values.into_dyn())
    }

    pub(crate) fn from_parts(
        field_type: FieldType,
        geometry: GridGeometry,
        values: ArrayD<f64>,
    ) -> Result<Self, FieldShapeError> {
        check_shape(field_type, geometry.npts(), values.shape())?;
        Ok(Self {
            field_type,
            geometry,
            values,
            nodes: None,
        })
    }

    /// The field type tag.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// The coordinate system tag.
    #[must_use]
    pub const fn coord_sys(&self) -> CoordSys {
        self.geometry.coord_sys()
    }

    /// The grid geometry the values are sampled on.
    #[must_use]
    pub const fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// The coordinate of grid index `(0, 0, 0)`.
    #[must_use]
    pub const fn min_coords(&self) -> [f64; 3] {
        self.geometry.min_coords()
    }

    /// The per-axis node spacing.
    #[must_use]
    pub const fn node_intervals(&self) -> [f64; 3] {
        self.geometry.node_intervals()
    }

    /// The per-axis sample counts.
    #[must_use]
    pub const fn npts(&self) -> [usize; 3] {
        self.geometry.npts()
    }

    /// The coordinate of the last grid node per axis.
    #[must_use]
    pub fn max_coords(&self) -> [f64; 3] {
        self.geometry.max_coords()
    }

    /// The sampled values.
    #[must_use]
    pub const fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    /// Consume the field and return the sampled values.
    #[must_use]
    pub fn into_values(self) -> ArrayD<f64> {
        self.values
    }

    /// Replace the grid geometry, revalidating the value shape.
    ///
    /// Invalidates the memoized node mesh.
    ///
    /// # Errors
    /// Returns [`FieldShapeError`] if the values do not match the new
    /// geometry's `npts`.
    pub fn set_geometry(&mut self, geometry: GridGeometry) -> Result<(), FieldShapeError> {
        check_shape(self.field_type, geometry.npts(), self.values.shape())?;
        self.geometry = geometry;
        self.nodes = None;
        Ok(())
    }

    /// The full coordinate mesh of the grid, memoized on first use.
    ///
    /// The cache is dropped whenever the geometry is replaced.
    pub fn nodes(&mut self) -> &Array4<f64> {
        let geometry = &self.geometry;
        self.nodes.get_or_insert_with(|| geometry.nodes())
    }
}

fn check_shape(
    field_type: FieldType,
    npts: [usize; 3],
    value_shape: &[usize],
) -> Result<(), FieldShapeError> {
    let matches = match field_type {
        FieldType::Scalar => *value_shape == npts,
        FieldType::Vector => *value_shape == [npts[0], npts[1], npts[2], 3],
    };
    if matches {
        Ok(())
    } else {
        Err(FieldShapeError {
            field_type,
            value_shape: value_shape.to_vec(),
            npts,
        })
    }
}
