//! Regular 3D grid geometry and the enumerated tags stored alongside it.
//!
//! A [`GridGeometry`] describes an axis-aligned regular sampling lattice: the
//! coordinate of grid index `(0, 0, 0)`, a strictly positive per-axis node
//! spacing, and the per-axis sample counts. Every dataset in a container is
//! sampled on a single shared geometry.

use std::str::FromStr;

use ndarray::Array4;
use thiserror::Error;

/// The coordinate system a grid is expressed in.
///
/// This is a compatibility label only; it never participates in index math.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum CoordSys {
    /// Cartesian (x, y, z) coordinates.
    #[display("cartesian")]
    Cartesian,
    /// Spherical (r, theta, phi) coordinates.
    #[display("spherical")]
    Spherical,
}

/// Whether a field carries one value per node or a 3-vector per node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum FieldType {
    /// One value per grid node; values are 3-dimensional.
    #[display("scalar")]
    Scalar,
    /// A 3-vector per grid node; values gain a trailing component axis.
    #[display("vector")]
    Vector,
}

impl CoordSys {
    /// The tag string persisted as a container attribute.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cartesian => "cartesian",
            Self::Spherical => "spherical",
        }
    }
}

impl FieldType {
    /// The tag string persisted as a container attribute.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
        }
    }
}

/// An unrecognized persisted tag string.
#[derive(Clone, Debug, Error)]
#[error("unrecognized {kind} tag `{tag}`")]
pub struct UnknownTagError {
    kind: &'static str,
    tag: String,
}

impl FromStr for CoordSys {
    type Err = UnknownTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cartesian" => Ok(Self::Cartesian),
            "spherical" => Ok(Self::Spherical),
            _ => Err(UnknownTagError {
                kind: "coordinate system",
                tag: s.to_string(),
            }),
        }
    }
}

impl FromStr for FieldType {
    type Err = UnknownTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scalar" => Ok(Self::Scalar),
            "vector" => Ok(Self::Vector),
            _ => Err(UnknownTagError {
                kind: "field type",
                tag: s.to_string(),
            }),
        }
    }
}

/// An invalid grid geometry.
#[derive(Clone, Debug, Error)]
#[error("invalid grid geometry: node_intervals {node_intervals:?} must be strictly positive and npts {npts:?} must be positive")]
pub struct InvalidGeometryError {
    node_intervals: [f64; 3],
    npts: [usize; 3],
}

/// The geometry of a regular axis-aligned 3D grid.
///
/// Geometry equality is exact and element-wise; two geometries that differ in
/// any component (including the coordinate system tag) are distinct.
#[derive(Clone, Debug, PartialEq)]
pub struct GridGeometry {
    coord_sys: CoordSys,
    min_coords: [f64; 3],
    node_intervals: [f64; 3],
    npts: [usize; 3],
}

impl GridGeometry {
    /// Create a new grid geometry.
    ///
    /// # Errors
    /// Returns [`InvalidGeometryError`] if any node interval is not strictly
    /// positive or any sample count is zero.
    pub fn new(
        coord_sys: CoordSys,
        min_coords: [f64; 3],
        node_intervals: [f64; 3],
        npts: [usize; 3],
    ) -> Result<Self, InvalidGeometryError> {
        if node_intervals.iter().any(|&step| step <= 0.0 || step.is_nan())
            || npts.iter().any(|&n| n == 0)
        {
            return Err(InvalidGeometryError {
                node_intervals,
                npts,
            });
        }
        Ok(Self {
            coord_sys,
            min_coords,
            node_intervals,
            npts,
        })
    }

    /// The coordinate system tag.
    #[must_use]
    pub const fn coord_sys(&self) -> CoordSys {
        self.coord_sys
    }

    /// The coordinate of grid index `(0, 0, 0)`.
    #[must_use]
    pub const fn min_coords(&self) -> [f64; 3] {
        self.min_coords
    }

    /// The per-axis node spacing.
    #[must_use]
    pub const fn node_intervals(&self) -> [f64; 3] {
        self.node_intervals
    }

    /// The per-axis sample counts.
    #[must_use]
    pub const fn npts(&self) -> [usize; 3] {
        self.npts
    }

    /// The coordinate of the last grid node per axis.
    ///
    /// Derived as `min_coords + node_intervals * (npts - 1)`; never persisted.
    #[must_use]
    pub fn max_coords(&self) -> [f64; 3] {
        std::array::from_fn(|axis| {
            self.min_coords[axis] + self.node_intervals[axis] * (self.npts[axis] - 1) as f64
        })
    }

    /// Compute the full coordinate mesh of the grid.
    ///
    /// Returns an array of shape `(nx, ny, nz, 3)` where element
    /// `(i, j, k, c)` is component `c` of the coordinate of node `(i, j, k)`.
    /// This is an explicit on-demand computation; [`Field`](crate::Field)
    /// memoizes it per field.
    #[must_use]
    pub fn nodes(&self) -> Array4<f64> {
        let [nx, ny, nz] = self.npts;
        Array4::from_shape_fn((nx, ny, nz, 3), |(i, j, k, c)| {
            let index = [i, j, k][c];
            self.min_coords[c] + index as f64 * self.node_intervals[c]
        })
    }
}
