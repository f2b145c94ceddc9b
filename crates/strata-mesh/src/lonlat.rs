//! Synthetic regular lon-lat median-dual mesh.
//!
//! Nodes sit at cell centres of an `nlon × nlat` grid; no node lies on a
//! pole. Geometry is planar in (lon, lat) radians with a spherical volume
//! metric. Edges are emitted in a fixed order:
//!
//! 1. zonal, row by row, each node to its eastern neighbour (periodic)
//! 2. meridional, each node to the node below it
//! 3. northern pole edges, `(0, i)` to `(0, i + nlon/2)`
//! 4. southern pole edges, `(nlat-1, i)` to `(nlat-1, i + nlon/2)`
//!
//! A pole edge stands in for the missing dual face above the first row (or
//! below the last). Its first endpoint gets the face it lacks from the
//! accumulation; the second endpoint gets it from the pole correction.

use std::f64::consts::{FRAC_PI_2, PI};

use strata_core::MeshError;

use crate::mesh::{Mesh, MeshParts};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS: f64 = 6371.22e3;

/// Regular lon-lat grid description.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LonLatGrid {
    nlon: usize,
    nlat: usize,
    radius: f64,
}

impl LonLatGrid {
    /// A grid of `nlon` longitudes by `nlat` latitudes on the Earth sphere.
    ///
    /// # Errors
    ///
    /// `nlon` must be even and at least 4 (pole edges pair opposite
    /// longitudes), `nlat` at least 2.
    pub fn new(nlon: usize, nlat: usize) -> Result<Self, MeshError> {
        Self::with_radius(nlon, nlat, EARTH_RADIUS)
    }

    /// As [`new`](Self::new) with an explicit sphere radius.
    pub fn with_radius(nlon: usize, nlat: usize, radius: f64) -> Result<Self, MeshError> {
        if nlon < 4 || nlon % 2 != 0 {
            return Err(MeshError::InvalidGrid {
                reason: format!("nlon must be even and >= 4, got {nlon}"),
            });
        }
        if nlat < 2 {
            return Err(MeshError::InvalidGrid {
                reason: format!("nlat must be >= 2, got {nlat}"),
            });
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(MeshError::InvalidGrid {
                reason: format!("radius must be finite and positive, got {radius}"),
            });
        }
        Ok(Self { nlon, nlat, radius })
    }

    /// The `4N × 2N` grid for resolution `N`.
    pub fn from_resolution(n: usize) -> Result<Self, MeshError> {
        Self::new(4 * n, 2 * n)
    }

    /// Longitudes per row.
    pub fn nlon(&self) -> usize {
        self.nlon
    }

    /// Number of rows.
    pub fn nlat(&self) -> usize {
        self.nlat
    }

    /// Total nodes.
    pub fn node_count(&self) -> usize {
        self.nlon * self.nlat
    }

    /// Total edges: zonal, meridional, and `nlon` pole edges.
    pub fn edge_count(&self) -> usize {
        self.nlon * self.nlat + self.nlon * (self.nlat - 1) + self.nlon
    }

    fn index(&self, j: usize, i: usize) -> u32 {
        (j * self.nlon + i) as u32
    }

    /// Assemble the undecomposed mesh.
    pub fn build(&self) -> Result<Mesh, MeshError> {
        let (nlon, nlat) = (self.nlon, self.nlat);
        if self.node_count() > u32::MAX as usize {
            return Err(MeshError::IndexOverflow {
                value: self.node_count(),
            });
        }
        let dlon = 2.0 * PI / nlon as f64;
        let dlat = PI / nlat as f64;

        let mut lonlat = Vec::with_capacity(self.node_count());
        let mut volumes = Vec::with_capacity(self.node_count());
        for j in 0..nlat {
            let lat = FRAC_PI_2 - (j as f64 + 0.5) * dlat;
            let volume = self.radius * self.radius * lat.cos() * dlon * dlat;
            for i in 0..nlon {
                lonlat.push([i as f64 * dlon, lat]);
                volumes.push(volume);
            }
        }

        let m = self.edge_count();
        let mut edges = Vec::with_capacity(m);
        let mut normals = Vec::with_capacity(m);
        let mut pole = Vec::with_capacity(m);

        for j in 0..nlat {
            for i in 0..nlon {
                edges.push([self.index(j, i), self.index(j, (i + 1) % nlon)]);
                normals.push([dlat, 0.0]);
                pole.push(false);
            }
        }
        for j in 0..nlat - 1 {
            for i in 0..nlon {
                edges.push([self.index(j, i), self.index(j + 1, i)]);
                normals.push([0.0, -dlon]);
                pole.push(false);
            }
        }
        let half = nlon / 2;
        for (row, sy) in [(0, dlon), (nlat - 1, -dlon)] {
            for i in 0..half {
                edges.push([self.index(row, i), self.index(row, i + half)]);
                normals.push([0.0, sy]);
                pole.push(true);
            }
        }

        log::debug!(
            "lon-lat grid {nlon}x{nlat}: {} nodes, {} edges",
            self.node_count(),
            edges.len()
        );

        Mesh::new(MeshParts::undecomposed(lonlat, volumes, edges, normals, pole))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_dimensions() {
        assert!(LonLatGrid::new(5, 4).is_err());
        assert!(LonLatGrid::new(2, 4).is_err());
        assert!(LonLatGrid::new(6, 1).is_err());
        assert!(LonLatGrid::with_radius(6, 4, 0.0).is_err());
        assert!(LonLatGrid::new(6, 4).is_ok());
    }

    #[test]
    fn resolution_doubles_aspect() {
        let g = LonLatGrid::from_resolution(3).unwrap();
        assert_eq!((g.nlon(), g.nlat()), (12, 6));
    }

    #[test]
    fn twenty_four_node_grid_shape() {
        let mesh = LonLatGrid::new(6, 4).unwrap().build().unwrap();
        assert_eq!(mesh.node_count(), 24);
        // 24 zonal + 18 meridional + 6 pole
        assert_eq!(mesh.edge_count(), 48);
        assert_eq!(mesh.pole_edges().len(), 6);
        assert_eq!(mesh.pole_edges()[0], 42);
        assert_eq!(mesh.edge(42), [0, 3]);
        assert_eq!(mesh.edge(45), [18, 21]);
        assert_eq!(mesh.incidence().max_degree(), 4);
    }

    #[test]
    fn control_volumes_close_except_pole_seconds() {
        let grid = LonLatGrid::new(8, 4).unwrap();
        let mesh = grid.build().unwrap();
        let half = grid.nlon() / 2;
        for node in 0..mesh.node_count() {
            let mut sum = [0.0f64; 2];
            for (e, sign) in mesh.incidence().iter(node) {
                let s = mesh.dual_normal(e as usize);
                sum[0] += sign * s[0];
                sum[1] += sign * s[1];
            }
            let (j, i) = (node / grid.nlon(), node % grid.nlon());
            let pole_second = (j == 0 || j == grid.nlat() - 1) && i >= half;
            assert_eq!(sum[0], 0.0, "node {node}");
            if pole_second {
                assert!(sum[1] != 0.0, "node {node}");
            } else {
                assert_eq!(sum[1], 0.0, "node {node}");
            }
        }
    }

    #[test]
    fn volumes_shrink_towards_poles() {
        let mesh = LonLatGrid::new(8, 6).unwrap().build().unwrap();
        assert!(mesh.dual_volume(0) < mesh.dual_volume(8));
        assert!(mesh.dual_volume(8) < mesh.dual_volume(16));
        assert_eq!(mesh.dual_volume(16), mesh.dual_volume(23));
    }
}
