//! Index windows: the mapping from coordinate bounding boxes to grid indices.
//!
//! An [`IndexWindow`] is the minimal per-axis `[start, end)` index range whose
//! node coordinates contain a requested coordinate bounding box. Windowed
//! reads slice the stored array with these ranges, so only the window is ever
//! read from storage.

use std::ops::Range;

use itertools::izip;
use thiserror::Error;

use crate::geometry::{GridGeometry, InvalidGeometryError};

/// An invalid coordinate range: `min_coords >= max_coords` on some axis.
#[derive(Clone, Debug, Error)]
#[error("invalid coordinate range: min_coords {min_coords:?} must be less than max_coords {max_coords:?} on every axis")]
pub struct InvalidRangeError {
    min_coords: [f64; 3],
    max_coords: [f64; 3],
}

/// A per-axis `[start, end)` index range into a gridded dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexWindow {
    start: [usize; 3],
    end: [usize; 3],
}

impl IndexWindow {
    /// Compute the index window covering the requested coordinate bounds.
    ///
    /// With no lower bound the window starts at index 0 per axis; with no
    /// upper bound it ends at `npts`. A lower bound maps to
    /// `floor((min - grid_min) / interval)` clamped to `[0, npts - 1]`. An
    /// upper bound maps to `ceil((max - grid_min) / interval) + 1` clamped to
    /// `[start + 1, npts]`: the `+1` over-selects one node so the window
    /// strictly contains the requested upper bound, and the lower clamp keeps
    /// the window non-empty even when the bounds fall entirely outside the
    /// grid.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if both bounds are given and
    /// `min_coords >= max_coords` on any axis.
    pub fn new(
        geometry: &GridGeometry,
        min_coords: Option<[f64; 3]>,
        max_coords: Option<[f64; 3]>,
    ) -> Result<Self, InvalidRangeError> {
        if let (Some(min_coords), Some(max_coords)) = (min_coords, max_coords) {
            if izip!(&min_coords, &max_coords).any(|(min, max)| min >= max) {
                return Err(InvalidRangeError {
                    min_coords,
                    max_coords,
                });
            }
        }

        let grid_min = geometry.min_coords();
        let intervals = geometry.node_intervals();
        let npts = geometry.npts();

        let mut start = [0usize; 3];
        if let Some(min_coords) = min_coords {
            for (start, &bound, &origin, &step, &n) in
                izip!(&mut start, &min_coords, &grid_min, &intervals, &npts)
            {
                let index = ((bound - origin) / step).floor();
                *start = index.clamp(0.0, (n - 1) as f64) as usize;
            }
        }

        let mut end = npts;
        if let Some(max_coords) = max_coords {
            for (end, &start, &bound, &origin, &step, &n) in
                izip!(&mut end, &start, &max_coords, &grid_min, &intervals, &npts)
            {
                let index = ((bound - origin) / step).ceil() + 1.0;
                *end = index.clamp((start + 1) as f64, n as f64) as usize;
            }
        }

        Ok(Self { start, end })
    }

    /// The inclusive start index per axis.
    #[must_use]
    pub const fn start(&self) -> [usize; 3] {
        self.start
    }

    /// The exclusive end index per axis.
    #[must_use]
    pub const fn end(&self) -> [usize; 3] {
        self.end
    }

    /// The number of nodes per axis within the window.
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        std::array::from_fn(|axis| self.end[axis] - self.start[axis])
    }

    /// The window as per-axis index ranges.
    #[must_use]
    pub fn ranges(&self) -> [Range<usize>; 3] {
        std::array::from_fn(|axis| self.start[axis]..self.end[axis])
    }

    /// Whether the window spans the full grid.
    #[must_use]
    pub fn is_full(&self, npts: [usize; 3]) -> bool {
        self.start == [0; 3] && self.end == npts
    }

    /// The geometry of the grid restricted to this window.
    ///
    /// The window origin becomes the new `min_coords`, node intervals are
    /// unchanged, and `npts` becomes the window shape.
    ///
    /// # Errors
    /// Returns [`InvalidGeometryError`] if the window is empty on some axis,
    /// which cannot happen for windows produced by [`IndexWindow::new`].
    pub fn narrowed_geometry(
        &self,
        geometry: &GridGeometry,
    ) -> Result<GridGeometry, InvalidGeometryError> {
        let grid_min = geometry.min_coords();
        let intervals = geometry.node_intervals();
        let min_coords =
            std::array::from_fn(|axis| grid_min[axis] + self.start[axis] as f64 * intervals[axis]);
        GridGeometry::new(geometry.coord_sys(), min_coords, intervals, self.shape())
    }
}
