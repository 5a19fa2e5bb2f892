//! Travel-order optimization for independent vector paths.
//!
//! A greedy nearest-neighbor heuristic over the squared travel distance
//! from each path's exit point to every other path's entry point. Large
//! path sets are partitioned into contiguous index-range blocks that are
//! optimized independently on worker threads and concatenated in block
//! order; this trades routing quality at block seams for bounded
//! worst-case latency on huge fill sets, and is an intentional
//! approximation rather than a bug.

use beamkit_core::geometry::PathSet;
use tracing::debug;

/// Maximum number of paths optimized as a single nearest-neighbor block.
pub const MAX_BLOCK_SIZE: usize = 2048;

/// Path travel-order optimization strategies.
#[derive(Debug)]
pub struct PathOptimizer;

impl PathOptimizer {
    /// Reorders `paths` so that each path starts close to where the
    /// previous one ends, seeding with the path nearest the machine
    /// origin. Returns a permutation of the input; inputs of size <= 1
    /// are returned unchanged. `change_cost` is a reserved
    /// direction-change weight; the current cost model ignores it.
    pub fn optimize(paths: PathSet, change_cost: f64) -> PathSet {
        let _ = change_cost;
        let n = paths.len();
        if n <= 1 {
            return paths;
        }

        // travel cost from path i's exit to path j's entry; the diagonal
        // stays at infinity so a path never follows itself
        let mut costs = vec![f64::MAX; n * n];
        let mut nearest_to_zero = 0;
        let mut best_distance_to_zero = f64::MAX;

        for (i, path) in paths.iter().enumerate() {
            let entry = path.first_point().unwrap_or_default();
            let exit = path.last_point().unwrap_or_default();

            for (j, candidate) in paths.iter().enumerate() {
                if i != j {
                    let candidate_entry = candidate.first_point().unwrap_or_default();
                    costs[i * n + j] = exit.squared_distance(candidate_entry);
                }
            }

            let distance_to_zero = entry.squared_distance_to_origin();
            if distance_to_zero < best_distance_to_zero {
                nearest_to_zero = i;
                best_distance_to_zero = distance_to_zero;
            }
        }

        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        order.push(nearest_to_zero);
        visited[nearest_to_zero] = true;
        let mut last = nearest_to_zero;

        for _ in 1..n {
            let mut best_index = 0;
            let mut best_distance = f64::MAX;
            // first candidate with the minimal cost wins, so the result is
            // deterministic for a given input order
            for (next, seen) in visited.iter().enumerate() {
                if *seen {
                    continue;
                }
                let distance = costs[last * n + next];
                if distance < best_distance {
                    best_index = next;
                    best_distance = distance;
                }
            }
            order.push(best_index);
            visited[best_index] = true;
            last = best_index;
        }

        let mut slots: Vec<_> = paths.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect()
    }

    /// Like [`PathOptimizer::optimize`], but path sets larger than
    /// [`MAX_BLOCK_SIZE`] are split into contiguous, equal-as-possible
    /// index blocks optimized in parallel and concatenated in block
    /// order, keeping the output reproducible across runs.
    pub fn optimize_parallel(paths: PathSet, change_cost: f64) -> PathSet {
        let n = paths.len();
        if n <= 1 {
            return paths;
        }

        let block_count = n.div_ceil(MAX_BLOCK_SIZE);
        if block_count <= 1 {
            return Self::optimize(paths, change_cost);
        }

        debug!(paths = n, blocks = block_count, "partitioning path set");

        let mut blocks: Vec<PathSet> = Vec::with_capacity(block_count);
        let mut remaining = paths.into_iter();
        for block in 0..block_count {
            let from = (block * n) / block_count;
            let to = ((block + 1) * n) / block_count;
            blocks.push(remaining.by_ref().take(to - from).collect());
        }

        let results: Vec<PathSet> = std::thread::scope(|scope| {
            let workers: Vec<_> = blocks
                .into_iter()
                .map(|block| scope.spawn(move || Self::optimize(block, change_cost)))
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().expect("optimizer worker panicked"))
                .collect()
        });

        results.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamkit_core::geometry::{Curve, CurvePath, Point};

    fn path_between(ax: f64, ay: f64, bx: f64, by: f64) -> CurvePath {
        CurvePath::new(vec![Curve::line(Point::new(ax, ay), Point::new(bx, by))])
    }

    fn entry_points(paths: &PathSet) -> Vec<Point> {
        paths
            .iter()
            .map(|p| p.first_point().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_small_inputs_are_identity() {
        assert!(PathOptimizer::optimize(Vec::new(), 0.0).is_empty());

        let single = vec![path_between(5.0, 5.0, 6.0, 6.0)];
        let result = PathOptimizer::optimize(single.clone(), 0.0);
        assert_eq!(result, single);
    }

    #[test]
    fn test_seed_is_nearest_to_origin() {
        let paths = vec![
            path_between(10.0, 10.0, 11.0, 10.0),
            path_between(1.0, 1.0, 2.0, 1.0),
            path_between(0.0, 0.0, 1.0, 0.0),
        ];
        let result = PathOptimizer::optimize(paths, 0.0);
        assert_eq!(
            entry_points(&result)[0],
            Point::new(0.0, 0.0),
            "the path starting at the origin must seed the tour"
        );
    }

    #[test]
    fn test_greedy_chain_follows_nearest_entry() {
        // exits at x = 1, 11, 21; entries at 0, 10, 20; scrambled input
        let paths = vec![
            path_between(20.0, 0.0, 21.0, 0.0),
            path_between(0.0, 0.0, 1.0, 0.0),
            path_between(10.0, 0.0, 11.0, 0.0),
        ];
        let result = PathOptimizer::optimize(paths, 0.0);
        assert_eq!(
            entry_points(&result),
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(20.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_output_is_permutation() {
        let paths: PathSet = (0..50)
            .map(|i| {
                let x = ((i * 37) % 50) as f64;
                path_between(x, x, x + 1.0, x)
            })
            .collect();
        let result = PathOptimizer::optimize(paths.clone(), 0.0);
        assert_eq!(result.len(), paths.len());
        for path in &paths {
            assert!(result.contains(path), "path dropped by optimization");
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let paths: PathSet = (0..64)
            .map(|i| {
                let x = ((i * 13) % 64) as f64;
                let y = ((i * 29) % 64) as f64;
                path_between(x, y, x + 0.5, y)
            })
            .collect();
        let a = PathOptimizer::optimize(paths.clone(), 0.0);
        let b = PathOptimizer::optimize(paths, 0.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_break_picks_first_candidate() {
        // two candidates at the same distance from the seed's exit
        let paths = vec![
            path_between(0.0, 0.0, 0.0, 0.0),
            path_between(1.0, 0.0, 1.0, 0.0),
            path_between(-1.0, 0.0, -1.0, 0.0),
        ];
        let result = PathOptimizer::optimize(paths, 0.0);
        assert_eq!(entry_points(&result)[1], Point::new(1.0, 0.0));
    }

    #[test]
    fn test_parallel_small_set_matches_single_block() {
        let paths: PathSet = (0..100)
            .map(|i| {
                let x = ((i * 7) % 100) as f64;
                path_between(x, 0.0, x + 1.0, 0.0)
            })
            .collect();
        let single = PathOptimizer::optimize(paths.clone(), 0.0);
        let parallel = PathOptimizer::optimize_parallel(paths, 0.0);
        assert_eq!(single, parallel);
    }

    #[test]
    fn test_parallel_blocks_concatenate_in_block_order() {
        // 3000 paths force two blocks; each block is optimized on its own
        // and the results must appear in block order
        let paths: PathSet = (0..3000)
            .map(|i| {
                let x = ((i * 997) % 3000) as f64;
                path_between(x, 0.0, x, 0.0)
            })
            .collect();
        let n = paths.len();
        let block_count = n.div_ceil(MAX_BLOCK_SIZE);
        assert_eq!(block_count, 2);

        let first_block: PathSet = paths[..n / block_count].to_vec();
        let expected_first = PathOptimizer::optimize(first_block, 0.0);

        let result = PathOptimizer::optimize_parallel(paths, 0.0);
        assert_eq!(result.len(), n);
        assert_eq!(&result[..n / block_count], &expected_first[..]);
    }
}
