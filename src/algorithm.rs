mod assignment;
mod distance;
mod spanning_tree;

pub(crate) use assignment::match_obstacles_to_holes;
pub(crate) use distance::DistanceOracle;
pub(crate) use spanning_tree::{min_holes_needed, SpanningTree};
