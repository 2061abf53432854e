use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use tracing::trace;

use super::distance::DistanceOracle;

/// Minimum total tree distance pairing of every obstacle with a distinct
/// hole. Needs `obstacles.len() <= holes.len()`, checked by the caller.
pub(crate) fn match_obstacles_to_holes(
    obstacles: &[usize],
    holes: &[usize],
    oracle: &mut DistanceOracle,
) -> Vec<(usize, usize)> {
    if obstacles.is_empty() {
        return Vec::new();
    }
    debug_assert!(obstacles.len() <= holes.len());

    let mut weights = Matrix::new(obstacles.len(), holes.len(), 0i64);
    for (row, &obstacle) in obstacles.iter().enumerate() {
        for (column, &hole) in holes.iter().enumerate() {
            weights[(row, column)] = oracle.distance(obstacle, hole) as i64;
        }
    }

    let (total, assignment) = kuhn_munkres_min(&weights);
    trace!("assignment cost {total}: {assignment:?}");

    obstacles
        .iter()
        .zip(assignment)
        .map(|(&obstacle, column)| (obstacle, holes[column]))
        .collect()
}
