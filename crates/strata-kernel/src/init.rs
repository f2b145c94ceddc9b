//! Deterministic input fields.
//!
//! Every value is a function of the node's global id, coordinates and
//! level only. A ghost node therefore holds the same value as its owner
//! without any exchange, and the field is identical for every split.

use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_core::{GlobalId, ScalarField};
use strata_mesh::Mesh;

/// Zonal reference profile: `100 + 50 * cos(2 * lat)`.
pub fn zonal(lat: f64) -> f64 {
    100.0 + 50.0 * (2.0 * lat).cos()
}

/// How to fill the scalar field before the first iteration.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum FieldInit {
    /// The zonal profile at every level.
    #[default]
    Zonal,
    /// The zonal profile plus `lapse * level`.
    Stratified {
        /// Increment per level.
        lapse: f64,
    },
    /// The zonal profile plus uniform noise in `[-amplitude, amplitude)`.
    ///
    /// Each node draws from its own ChaCha8 stream seeded with
    /// `seed ^ global_id`, one draw per level.
    Perturbed {
        /// Base seed.
        seed: u64,
        /// Half-width of the noise.
        amplitude: f64,
    },
}

impl FieldInit {
    /// Fill one column of `levels` values for the node `id` at latitude `lat`.
    pub fn fill_column(&self, id: GlobalId, lat: f64, column: &mut [f64]) {
        let base = zonal(lat);
        match *self {
            Self::Zonal => column.fill(base),
            Self::Stratified { lapse } => {
                for (l, v) in column.iter_mut().enumerate() {
                    *v = base + lapse * l as f64;
                }
            }
            Self::Perturbed { seed, amplitude } => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed ^ id.0);
                for v in column.iter_mut() {
                    let u: f64 = rng.random();
                    *v = base + amplitude * (2.0 * u - 1.0);
                }
            }
        }
    }

    /// Build the field for every local node of `mesh`, ghosts included.
    pub fn build(&self, mesh: &Mesh, levels: usize) -> ScalarField {
        let mut field = ScalarField::new(mesh.node_count(), levels);
        if levels == 0 {
            return field;
        }
        for (node, column) in field.as_mut_slice().chunks_exact_mut(levels).enumerate() {
            let [_, lat] = mesh.lonlat(node);
            self.fill_column(mesh.global_id(node), lat, column);
        }
        field
    }
}

impl fmt::Display for FieldInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zonal => write!(f, "zonal"),
            Self::Stratified { lapse } => write!(f, "stratified:{lapse}"),
            Self::Perturbed { seed, amplitude } => write!(f, "perturbed:{seed}:{amplitude}"),
        }
    }
}

impl FromStr for FieldInit {
    type Err = String;

    /// Parses `zonal`, `stratified[:LAPSE]` or `perturbed[:SEED[:AMPLITUDE]]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let kind = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let float = |v: &str| {
            v.parse::<f64>()
                .map_err(|e| format!("invalid number '{v}' in '{s}': {e}"))
        };
        let init = match (kind, args.as_slice()) {
            ("zonal", []) => Self::Zonal,
            ("stratified", []) => Self::Stratified { lapse: 1.0 },
            ("stratified", [lapse]) => Self::Stratified {
                lapse: float(*lapse)?,
            },
            ("perturbed", []) => Self::Perturbed {
                seed: 0,
                amplitude: 1.0,
            },
            ("perturbed", [seed]) | ("perturbed", [seed, _]) => Self::Perturbed {
                seed: seed
                    .parse()
                    .map_err(|e| format!("invalid seed '{seed}' in '{s}': {e}"))?,
                amplitude: match args.get(1) {
                    Some(a) => float(*a)?,
                    None => 1.0,
                },
            },
            _ => {
                return Err(format!(
                    "unknown field init '{s}', expected zonal, stratified[:LAPSE] or perturbed[:SEED[:AMPLITUDE]]"
                ))
            }
        };
        Ok(init)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_test_utils::{grid, grid24_partitions};

    #[test]
    fn zonal_matches_reference_profile() {
        assert_eq!(zonal(0.0), 150.0);
        let mesh = grid(8, 4);
        let field = FieldInit::Zonal.build(&mesh, 3);
        let [_, lat] = mesh.lonlat(5);
        assert_eq!(field.column(5), &[zonal(lat); 3]);
    }

    #[test]
    fn stratified_adds_lapse_per_level() {
        let mesh = grid(4, 2);
        let field = FieldInit::Stratified { lapse: 2.0 }.build(&mesh, 3);
        let base = field.get(0, 0);
        assert_eq!(field.get(0, 1), base + 2.0);
        assert_eq!(field.get(0, 2), base + 4.0);
    }

    #[test]
    fn perturbed_is_bounded_and_seeded() {
        let mesh = grid(8, 4);
        let init = FieldInit::Perturbed {
            seed: 42,
            amplitude: 0.5,
        };
        let a = init.build(&mesh, 4);
        let b = init.build(&mesh, 4);
        assert_eq!(a, b);
        for node in 0..mesh.node_count() {
            let [_, lat] = mesh.lonlat(node);
            for &v in a.column(node) {
                assert!((v - zonal(lat)).abs() <= 0.5);
            }
        }
        let other = FieldInit::Perturbed {
            seed: 43,
            amplitude: 0.5,
        }
        .build(&mesh, 4);
        assert_ne!(a, other);
    }

    #[test]
    fn ghosts_agree_with_owners() {
        let init = FieldInit::Perturbed {
            seed: 7,
            amplitude: 3.0,
        };
        let parts = grid24_partitions(3);
        let global = init.build(&strata_test_utils::grid24(), 2);
        for mesh in &parts {
            let field = init.build(mesh, 2);
            for node in 0..mesh.node_count() {
                let g = mesh.global_id(node).index();
                assert_eq!(field.column(node), global.column(g));
            }
        }
    }

    #[test]
    fn parses_and_displays() {
        assert_eq!("zonal".parse::<FieldInit>().unwrap(), FieldInit::Zonal);
        assert_eq!(
            "stratified:0.25".parse::<FieldInit>().unwrap(),
            FieldInit::Stratified { lapse: 0.25 }
        );
        assert_eq!(
            "perturbed:9:2".parse::<FieldInit>().unwrap(),
            FieldInit::Perturbed {
                seed: 9,
                amplitude: 2.0
            }
        );
        let init = FieldInit::Perturbed {
            seed: 3,
            amplitude: 0.5,
        };
        assert_eq!(init.to_string().parse::<FieldInit>().unwrap(), init);
        assert!("sinusoid".parse::<FieldInit>().is_err());
        assert!("stratified:x".parse::<FieldInit>().is_err());
    }
}
