//! Vertical finite differences along each node's column.

use rayon::prelude::*;
use strata_core::{Component, GradientField, KernelError, ScalarField, COMPONENTS};
use strata_mesh::Mesh;

use crate::green_gauss::{check_field, check_gradient, check_len};

/// Step 4: z component of every owned node's gradient.
///
/// ```text
/// l = 0        (f[1] - f[0]) / dz
/// 0 < l < L-1  (f[l+1] - f[l-1]) / (2 * dz)
/// l = L-1      (f[L-2] - f[L-1]) / dz
/// ```
///
/// A single-level column has a z gradient of exactly `0`.
pub fn vertical_gradient(
    mesh: &Mesh,
    field: &ScalarField,
    dz: f64,
    grad: &mut GradientField,
) -> Result<(), KernelError> {
    check_field(mesh, field)?;
    check_gradient(mesh, field.levels(), grad)?;
    if !dz.is_finite() || dz <= 0.0 {
        return Err(KernelError::InvalidLevelSpacing { dz });
    }
    check_len("field levels", grad.levels(), field.levels())?;

    let levels = field.levels();
    let z = Component::Z as usize;
    grad.as_mut_slice()
        .par_chunks_mut(levels * COMPONENTS)
        .enumerate()
        .filter(|(node, _)| mesh.is_owned(*node))
        .for_each(|(node, block)| {
            if levels == 1 {
                block[z] = 0.0;
                return;
            }
            let f = field.column(node);
            let top = levels - 1;
            block[z] = (f[1] - f[0]) / dz;
            for l in 1..top {
                block[l * COMPONENTS + z] = (f[l + 1] - f[l - 1]) / (2.0 * dz);
            }
            block[top * COMPONENTS + z] = (f[top - 1] - f[top]) / dz;
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strata_test_utils::{grid, linear_in_level};

    #[test]
    fn linear_column_is_exact() {
        let mesh = grid(8, 4);
        let levels = 6;
        let dz = 0.5;
        let field = linear_in_level(&mesh, levels, 3.0, 2.0);
        let mut grad = GradientField::new(mesh.node_count(), levels);
        vertical_gradient(&mesh, &field, dz, &mut grad).unwrap();
        for node in 0..mesh.node_count() {
            assert_eq!(grad.get(node, 0, Component::Z), 4.0);
            for l in 1..levels - 1 {
                assert_eq!(grad.get(node, l, Component::Z), 4.0);
            }
            assert_eq!(grad.get(node, levels - 1, Component::Z), -4.0);
        }
    }

    #[test]
    fn single_level_is_zero() {
        let mesh = grid(4, 2);
        let field = linear_in_level(&mesh, 1, 7.0, 1.0);
        let mut grad = GradientField::new(mesh.node_count(), 1);
        grad.as_mut_slice().fill(9.0);
        vertical_gradient(&mesh, &field, 1.0, &mut grad).unwrap();
        for node in 0..mesh.node_count() {
            assert_eq!(grad.get(node, 0, Component::Z), 0.0);
            // horizontal components untouched
            assert_eq!(grad.get(node, 0, Component::X), 9.0);
        }
    }

    #[test]
    fn bad_level_spacing_is_reported_as_spacing() {
        let mesh = grid(4, 2);
        let field = linear_in_level(&mesh, 3, 0.0, 1.0);
        let mut grad = GradientField::new(mesh.node_count(), 3);
        for dz in [0.0, -1.0, f64::NAN] {
            let err = vertical_gradient(&mesh, &field, dz, &mut grad).unwrap_err();
            assert!(matches!(err, KernelError::InvalidLevelSpacing { .. }), "{err}");
        }
    }

    #[test]
    fn two_levels_use_one_sided_differences_only() {
        let mesh = grid(4, 2);
        let field = linear_in_level(&mesh, 2, 1.0, 3.0);
        let mut grad = GradientField::new(mesh.node_count(), 2);
        vertical_gradient(&mesh, &field, 1.5, &mut grad).unwrap();
        assert_eq!(grad.get(0, 0, Component::Z), 2.0);
        assert_eq!(grad.get(0, 1, Component::Z), -2.0);
    }

    proptest! {
        #[test]
        fn linear_columns_match_formula(
            a in -1000i32..1000,
            b in -50i32..50,
            levels in 3usize..24,
            dz_exp in -3i32..6,
        ) {
            let mesh = grid(4, 2);
            let dz = 2f64.powi(dz_exp);
            let field = linear_in_level(&mesh, levels, a as f64, b as f64);
            let mut grad = GradientField::new(mesh.node_count(), levels);
            vertical_gradient(&mesh, &field, dz, &mut grad).unwrap();
            let slope = b as f64 / dz;
            for l in 0..levels - 1 {
                prop_assert_eq!(grad.get(3, l, Component::Z), slope);
            }
            prop_assert_eq!(grad.get(3, levels - 1, Component::Z), -slope);
        }
    }
}
