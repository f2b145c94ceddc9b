//! Horizontal gradient by the discrete Green-Gauss theorem.
//!
//! For an owned node `n` with dual volume `V`:
//!
//! ```text
//! flux(e, l)  = S(e) * 0.5 * (f[p1(e), l] + f[p2(e), l])
//! g_xy(n, l)  = (Σ_{e ∈ inc(n)} sign(n, e) * flux(e, l)) / V(n)
//! ```
//!
//! followed by the pole correction, for every pole edge whose second
//! endpoint is owned:
//!
//! ```text
//! g_y(p2, l) += 2 * flux_y(e, l) / V(p2)
//! ```
//!
//! Each output slot is a sequential sum in the node's incidence order, so
//! splitting nodes across workers never reorders floating-point additions.

use rayon::prelude::*;
use strata_core::{Component, GradientField, KernelError, ScalarField, COMPONENTS};
use strata_mesh::Mesh;

use crate::vertical::vertical_gradient;

// ── Shape checks ────────────────────────────────────────────────

pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), KernelError> {
    if expected != found {
        return Err(KernelError::ShapeMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

pub(crate) fn check_field(mesh: &Mesh, field: &ScalarField) -> Result<(), KernelError> {
    check_len("field nodes", mesh.node_count(), field.nodes())?;
    if field.levels() == 0 {
        return Err(KernelError::NoLevels);
    }
    Ok(())
}

pub(crate) fn check_gradient(
    mesh: &Mesh,
    levels: usize,
    grad: &GradientField,
) -> Result<(), KernelError> {
    check_len("gradient nodes", mesh.node_count(), grad.nodes())?;
    check_len("gradient levels", levels, grad.levels())?;
    if levels == 0 {
        return Err(KernelError::NoLevels);
    }
    Ok(())
}

// ── Edge fluxes ─────────────────────────────────────────────────

/// Per-edge, per-level `(Sx * avg, Sy * avg)` scratch buffer.
///
/// Layout: `data[(edge * levels + level) * 2 + c]`.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeFluxes {
    edges: usize,
    levels: usize,
    data: Vec<f64>,
}

impl EdgeFluxes {
    /// A zeroed buffer for `edges × levels` fluxes.
    pub fn new(edges: usize, levels: usize) -> Self {
        Self {
            edges,
            levels,
            data: vec![0.0; edges * levels * 2],
        }
    }

    /// Number of edges.
    pub fn edges(&self) -> usize {
        self.edges
    }

    /// Number of vertical levels.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// `(flux_x, flux_y)` of one edge at one level.
    pub fn get(&self, edge: usize, level: usize) -> [f64; 2] {
        let i = (edge * self.levels + level) * 2;
        [self.data[i], self.data[i + 1]]
    }

    /// The whole buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Step 1: average the field onto every edge and scale by its dual normal.
///
/// Covers every local edge, including edges between an owned node and a
/// ghost; both endpoints are read from `field`.
pub fn edge_fluxes(
    mesh: &Mesh,
    field: &ScalarField,
    out: &mut EdgeFluxes,
) -> Result<(), KernelError> {
    check_field(mesh, field)?;
    check_len("flux edges", mesh.edge_count(), out.edges)?;
    check_len("flux levels", field.levels(), out.levels)?;

    let levels = out.levels;
    out.data
        .par_chunks_mut(levels * 2)
        .enumerate()
        .for_each(|(e, chunk)| {
            let [p1, p2] = mesh.edge(e);
            let [sx, sy] = mesh.dual_normal(e);
            let f1 = field.column(p1 as usize);
            let f2 = field.column(p2 as usize);
            for (l, slot) in chunk.chunks_exact_mut(2).enumerate() {
                let avg = (f1[l] + f2[l]) * 0.5;
                slot[0] = sx * avg;
                slot[1] = sy * avg;
            }
        });
    Ok(())
}

// ── Node accumulation ───────────────────────────────────────────

/// Step 2: signed flux sum per owned node, divided by its dual volume.
///
/// Overwrites the x and y components of owned nodes. The z component and
/// every ghost slot are left as they were.
pub fn accumulate_nodes(
    mesh: &Mesh,
    fluxes: &EdgeFluxes,
    grad: &mut GradientField,
) -> Result<(), KernelError> {
    let levels = fluxes.levels;
    check_gradient(mesh, levels, grad)?;
    check_len("flux edges", mesh.edge_count(), fluxes.edges)?;

    let incidence = mesh.incidence();
    grad.as_mut_slice()
        .par_chunks_mut(levels * COMPONENTS)
        .enumerate()
        .filter(|(node, _)| mesh.is_owned(*node))
        .for_each(|(node, block)| {
            for slot in block.chunks_exact_mut(COMPONENTS) {
                slot[Component::X as usize] = 0.0;
                slot[Component::Y as usize] = 0.0;
            }
            for (e, sign) in incidence.iter(node) {
                let base = e as usize * levels * 2;
                let edge_fluxes = &fluxes.data[base..base + levels * 2];
                for (slot, flux) in block
                    .chunks_exact_mut(COMPONENTS)
                    .zip(edge_fluxes.chunks_exact(2))
                {
                    slot[Component::X as usize] += sign * flux[0];
                    slot[Component::Y as usize] += sign * flux[1];
                }
            }
            let volume = mesh.dual_volume(node);
            for slot in block.chunks_exact_mut(COMPONENTS) {
                slot[Component::X as usize] /= volume;
                slot[Component::Y as usize] /= volume;
            }
        });
    Ok(())
}

// ── Pole correction ─────────────────────────────────────────────

/// Step 3: add the missing pole face to each pole edge's second endpoint.
///
/// Pole edges are visited in ascending order; edges whose second endpoint
/// is a ghost are skipped (the owner of that node applies them).
pub fn correct_poles(
    mesh: &Mesh,
    fluxes: &EdgeFluxes,
    grad: &mut GradientField,
) -> Result<(), KernelError> {
    let levels = fluxes.levels;
    check_gradient(mesh, levels, grad)?;
    check_len("flux edges", mesh.edge_count(), fluxes.edges)?;

    for &e in mesh.pole_edges() {
        let [_, p2] = mesh.edge(e as usize);
        let p2 = p2 as usize;
        if !mesh.is_owned(p2) {
            continue;
        }
        let volume = mesh.dual_volume(p2);
        for level in 0..levels {
            let [_, flux_y] = fluxes.get(e as usize, level);
            let g = grad.get(p2, level, Component::Y);
            grad.set(p2, level, Component::Y, g + 2.0 * flux_y / volume);
        }
    }
    Ok(())
}

// ── Full kernel ─────────────────────────────────────────────────

/// The four kernel steps with a reusable flux buffer.
///
/// # Examples
///
/// ```
/// use strata_core::{GradientField, ScalarField};
/// use strata_kernel::GreenGauss;
/// use strata_mesh::LonLatGrid;
///
/// let mesh = LonLatGrid::new(8, 4).unwrap().build().unwrap();
/// let field = ScalarField::from_fn(mesh.node_count(), 3, |_, _| 1.0);
/// let mut grad = GradientField::new(mesh.node_count(), 3);
///
/// let mut kernel = GreenGauss::new(&mesh, 3, 80e3).unwrap();
/// kernel.compute(&mesh, &field, &mut grad).unwrap();
/// assert!(grad.as_slice().iter().all(|&g| g == 0.0));
/// ```
#[derive(Clone, Debug)]
pub struct GreenGauss {
    levels: usize,
    dz: f64,
    fluxes: EdgeFluxes,
}

impl GreenGauss {
    /// Set up the kernel for `mesh` with `levels` uniform layers spanning
    /// `column_height`.
    ///
    /// # Errors
    ///
    /// [`KernelError::NoLevels`] if `levels == 0`,
    /// [`KernelError::InvalidColumnHeight`] unless the height is finite
    /// and positive.
    pub fn new(mesh: &Mesh, levels: usize, column_height: f64) -> Result<Self, KernelError> {
        if levels == 0 {
            return Err(KernelError::NoLevels);
        }
        if !column_height.is_finite() || column_height <= 0.0 {
            return Err(KernelError::InvalidColumnHeight {
                value: column_height,
            });
        }
        let dz = column_height / levels as f64;
        log::debug!(
            "green-gauss kernel: {} edges, {} pole edges, {levels} levels, dz = {dz} m",
            mesh.edge_count(),
            mesh.pole_edges().len(),
        );
        Ok(Self {
            levels,
            dz,
            fluxes: EdgeFluxes::new(mesh.edge_count(), levels),
        })
    }

    /// Vertical level count.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Uniform layer thickness.
    pub fn dz(&self) -> f64 {
        self.dz
    }

    /// Edge fluxes from the last [`compute`](Self::compute).
    pub fn fluxes(&self) -> &EdgeFluxes {
        &self.fluxes
    }

    /// Recompute every owned node's gradient from `field`.
    ///
    /// Runs on the current rayon pool; call inside
    /// [`rayon::ThreadPool::install`] to choose the worker count.
    pub fn compute(
        &mut self,
        mesh: &Mesh,
        field: &ScalarField,
        grad: &mut GradientField,
    ) -> Result<(), KernelError> {
        check_len("field levels", self.levels, field.levels())?;
        check_gradient(mesh, self.levels, grad)?;

        edge_fluxes(mesh, field, &mut self.fluxes)?;
        accumulate_nodes(mesh, &self.fluxes, grad)?;
        correct_poles(mesh, &self.fluxes, grad)?;
        vertical_gradient(mesh, field, self.dz, grad)
    }
}
