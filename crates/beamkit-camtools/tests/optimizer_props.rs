//! Property tests for the travel-order optimizer.

use beamkit_camtools::PathOptimizer;
use beamkit_core::geometry::{Curve, CurvePath, PathSet, Point};
use proptest::prelude::*;

fn arb_path() -> impl Strategy<Value = CurvePath> {
    (
        -100.0f64..100.0,
        -100.0f64..100.0,
        -100.0f64..100.0,
        -100.0f64..100.0,
    )
        .prop_map(|(ax, ay, bx, by)| {
            CurvePath::new(vec![Curve::line(Point::new(ax, ay), Point::new(bx, by))])
        })
}

fn sort_key(path: &CurvePath) -> (f64, f64, f64, f64) {
    let a = path.first_point().unwrap_or_default();
    let b = path.last_point().unwrap_or_default();
    (a.x, a.y, b.x, b.y)
}

fn sorted(mut paths: PathSet) -> PathSet {
    paths.sort_by(|l, r| {
        let (a, b) = (sort_key(l), sort_key(r));
        a.0.total_cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.total_cmp(&b.2))
            .then(a.3.total_cmp(&b.3))
    });
    paths
}

proptest! {
    #[test]
    fn optimized_output_is_a_permutation(paths in prop::collection::vec(arb_path(), 0..40)) {
        let result = PathOptimizer::optimize(paths.clone(), 0.0);
        prop_assert_eq!(result.len(), paths.len());
        prop_assert_eq!(sorted(result), sorted(paths));
    }

    #[test]
    fn optimization_is_deterministic(paths in prop::collection::vec(arb_path(), 0..40)) {
        let a = PathOptimizer::optimize(paths.clone(), 0.0);
        let b = PathOptimizer::optimize(paths, 0.0);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn parallel_variant_preserves_the_multiset(paths in prop::collection::vec(arb_path(), 0..40)) {
        let result = PathOptimizer::optimize_parallel(paths.clone(), 0.0);
        prop_assert_eq!(sorted(result), sorted(paths));
    }

    #[test]
    fn tiny_inputs_are_identity(paths in prop::collection::vec(arb_path(), 0..2)) {
        let result = PathOptimizer::optimize(paths.clone(), 0.0);
        prop_assert_eq!(result, paths);
    }
}
