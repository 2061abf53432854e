use super::Solver;
use crate::algorithm::{match_obstacles_to_holes, min_holes_needed, DistanceOracle, SpanningTree};
use crate::common::{Move, Solution, Status, VertexState};
use crate::config::Config;
use crate::error::SolveError;
use crate::graph::Graph;
use crate::instance::Instance;
use crate::stat::Stats;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, instrument, trace, warn};

/// Greedy planner for one robot sliding obstacles into holes on a graph.
///
/// Each round re-roots the spanning tree at the robot, then either walks
/// straight to the goal, sidesteps forward off a branch vertex on the way, or
/// backs into a branch behind the robot to collect holes.
pub struct MotionPlanner<R: Rng = StdRng> {
    graph: Graph,
    states: Vec<VertexState>,
    robot: usize,
    goal: usize,
    oracle: DistanceOracle,
    path_to_goal: Vec<usize>,
    front_holes: usize,
    back_holes: usize,
    min_holes: usize,
    visited: HashSet<usize>,
    moves: Vec<Move>,
    cost: usize,
    rng: R,
    stats: Stats,
}

impl MotionPlanner<StdRng> {
    pub fn from_seed(instance: &Instance, seed: u64) -> Self {
        MotionPlanner::new(instance, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MotionPlanner<R> {
    /// `rng` breaks ties between equally eligible sidestep vertices.
    pub fn new(instance: &Instance, rng: R) -> Self {
        MotionPlanner {
            graph: instance.graph.clone(),
            states: instance.initial_states(),
            robot: instance.robot,
            goal: instance.goal,
            oracle: DistanceOracle::new(SpanningTree::build(&instance.graph, instance.robot)),
            path_to_goal: Vec::new(),
            front_holes: 0,
            back_holes: 0,
            min_holes: 0,
            visited: HashSet::from([instance.robot]),
            moves: Vec::new(),
            cost: 0,
            rng,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    fn rebuild(&mut self) {
        // Swapping the oracle drops every cached distance of the old root.
        self.oracle = DistanceOracle::new(SpanningTree::build(&self.graph, self.robot));
        let tree = self.oracle.tree();
        (self.front_holes, self.back_holes) = tree.split_holes(&self.states, self.goal);
        self.path_to_goal = tree.path_to(self.goal);
        self.min_holes = min_holes_needed(&self.path_to_goal, &self.graph);
        self.stats.tree_rebuilds += 1;

        debug!(
            "robot {} path to goal {:?}: Hm = {}, Hf = {}, Hb = {}",
            self.robot, self.path_to_goal, self.min_holes, self.front_holes, self.back_holes
        );
    }

    fn unsolvable(&self) -> Status {
        Status::Unsolvable {
            front_holes: self.front_holes,
            back_holes: self.back_holes,
            min_holes: self.min_holes,
        }
    }

    fn try_move_forward(&mut self) -> Result<bool, SolveError> {
        if self.front_holes >= self.path_to_goal.len() {
            let path = self.path_to_goal.clone();
            self.clear_path(self.goal, &path)?;
            self.move_robot(self.goal);
            return Ok(true);
        }

        // Reaching a branch vertex at distance d takes d holes plus one for
        // the sidestep. Try the furthest reachable one first.
        let reachable: Vec<usize> = self
            .path_to_goal
            .iter()
            .enumerate()
            .take_while(|&(index, _)| index + 2 <= self.front_holes)
            .map(|(_, &vertex)| vertex)
            .filter(|&vertex| self.graph.is_branch_vertex(vertex))
            .collect();

        let goal_tag = self.oracle.tree().tag(self.goal);
        for &branch_vertex in reachable.iter().rev() {
            let candidates: Vec<usize> = self
                .graph
                .neighbors(branch_vertex)
                .iter()
                .copied()
                .filter(|&vertex| {
                    vertex != self.robot
                        && !self.path_to_goal.contains(&vertex)
                        && !self.visited.contains(&vertex)
                        && self.oracle.tree().tag(vertex) == goal_tag
                        && self.is_clearable(vertex)
                })
                .collect();
            trace!("sidestep vertices of {branch_vertex}: {candidates:?}");

            let Some(sidestep) = self.choose_sidestep(&candidates) else {
                continue;
            };
            debug!("forward through branch vertex {branch_vertex} to sidestep {sidestep}");

            self.fill_sidestep_branch_if_needed(sidestep)?;
            let path = self.oracle.tree().path_to(sidestep);
            self.clear_path(sidestep, &path)?;
            self.move_robot(sidestep);
            return Ok(true);
        }

        Ok(false)
    }

    fn try_move_backward(&mut self) -> Result<bool, SolveError> {
        let Some(branch_vertex) = self
            .oracle
            .tree()
            .nearest_branch_behind(&self.graph, self.goal)
        else {
            debug!("no branch vertex behind the robot");
            return Ok(false);
        };

        let needed_holes = self.oracle.distance(self.robot, branch_vertex) + 1;
        if self.back_holes < needed_holes {
            debug!(
                "branch vertex {branch_vertex} behind needs {needed_holes} holes, only {} available",
                self.back_holes
            );
            return Ok(false);
        }

        let parent = self.oracle.tree().parent(branch_vertex);
        let mut candidates: Vec<(usize, usize)> = Vec::new();
        for &vertex in self.graph.neighbors(branch_vertex) {
            if vertex == self.robot
                || Some(vertex) == parent
                || self.path_to_goal.contains(&vertex)
                || self.visited.contains(&vertex)
                || !self.is_clearable(vertex)
            {
                continue;
            }
            let holes = usize::from(self.states[vertex] == VertexState::Hole)
                + self.oracle.tree().holes_below(vertex, &self.states).len();
            // A branch without any hole cannot take the robot's obstacles.
            if holes > 0 {
                candidates.push((vertex, holes));
            }
        }
        trace!("backward sidestep candidates of {branch_vertex}: {candidates:?}");

        // Spend as few holes as possible on the detour.
        let Some(fewest) = candidates.iter().map(|&(_, holes)| holes).min() else {
            return Ok(false);
        };
        let tied: Vec<usize> = candidates
            .iter()
            .filter(|&&(_, holes)| holes == fewest)
            .map(|&(vertex, _)| vertex)
            .collect();
        let Some(&sidestep) = tied.choose(&mut self.rng) else {
            return Ok(false);
        };
        debug!("backward through branch vertex {branch_vertex} to sidestep {sidestep}");

        let path = self.oracle.tree().path_to(sidestep);
        self.clear_path(sidestep, &path)?;
        self.move_robot(sidestep);
        Ok(true)
    }

    /// Uniform pick among candidates, empty ones first.
    fn choose_sidestep(&mut self, candidates: &[usize]) -> Option<usize> {
        let holes: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&vertex| self.states[vertex] == VertexState::Hole)
            .collect();
        let pool = if holes.is_empty() { candidates } else { &holes };
        pool.choose(&mut self.rng).copied()
    }

    /// Whether the branch of `target` holds enough holes off the robot's path
    /// to take every obstacle on it.
    fn is_clearable(&self, target: usize) -> bool {
        let tree = self.oracle.tree();
        let path: HashSet<usize> = tree.path_to(target).into_iter().collect();
        let tag = tree.tag(target);
        let obstacles = path
            .iter()
            .filter(|&&vertex| self.states[vertex] == VertexState::Obstacle)
            .count();
        let holes = (0..self.graph.len())
            .filter(|&vertex| {
                self.states[vertex] == VertexState::Hole
                    && tree.tag(vertex) == tag
                    && !path.contains(&vertex)
            })
            .count();
        obstacles <= holes
    }

    /// Moving to `sidestep` leaves its subtree behind the robot. If that
    /// drops the reachable holes under Hm, first push the obstacles nearest
    /// to the sidestep into the subtree.
    fn fill_sidestep_branch_if_needed(&mut self, sidestep: usize) -> Result<(), SolveError> {
        let holes_behind = self.oracle.tree().holes_below(sidestep, &self.states);
        let available = (self.front_holes + self.back_holes).saturating_sub(holes_behind.len());
        if self.min_holes <= available {
            return Ok(());
        }
        let needed = self.min_holes - available;

        let mut obstacles: Vec<usize> = self
            .path_to_goal
            .iter()
            .copied()
            .filter(|&vertex| self.states[vertex] == VertexState::Obstacle)
            .collect();
        if self.states[sidestep] == VertexState::Obstacle {
            obstacles.push(sidestep);
        }
        let mut by_distance: Vec<(usize, usize)> = obstacles
            .into_iter()
            .map(|obstacle| (self.oracle.distance(sidestep, obstacle), obstacle))
            .collect();
        by_distance.sort_by_key(|&(distance, _)| distance);

        let count = needed.min(by_distance.len()).min(holes_behind.len());
        if count < needed {
            warn!(
                "sidestep {sidestep} branch needs {needed} more holes, can only move {count} obstacles in"
            );
        }
        debug!("moving {count} obstacles behind sidestep {sidestep}");

        for ((_, obstacle), hole) in by_distance.into_iter().zip(holes_behind).take(count) {
            self.move_obstacle(obstacle, hole)?;
        }
        Ok(())
    }

    /// Relocate every obstacle on `path` into a hole of `target`'s branch
    /// off the path, at minimum total tree distance.
    fn clear_path(&mut self, target: usize, path: &[usize]) -> Result<(), SolveError> {
        let tree = self.oracle.tree();
        let on_path: HashSet<usize> = path.iter().copied().collect();
        let tag = tree.tag(target);

        let obstacles: Vec<usize> = path
            .iter()
            .copied()
            .filter(|&vertex| self.states[vertex] == VertexState::Obstacle)
            .collect();
        if obstacles.is_empty() {
            return Ok(());
        }
        let holes: Vec<usize> = (0..self.graph.len())
            .filter(|&vertex| {
                self.states[vertex] == VertexState::Hole
                    && tree.tag(vertex) == tag
                    && !on_path.contains(&vertex)
            })
            .collect();
        debug!("path to {target}: {path:?}, obstacles {obstacles:?}, valid holes {holes:?}");

        if obstacles.len() > holes.len() {
            return Err(SolveError::InsufficientHoles {
                target,
                obstacles: obstacles.len(),
                holes: holes.len(),
            });
        }

        for (obstacle, hole) in match_obstacles_to_holes(&obstacles, &holes, &mut self.oracle) {
            self.move_obstacle(obstacle, hole)?;
        }
        Ok(())
    }

    fn move_obstacle(&mut self, obstacle: usize, hole: usize) -> Result<(), SolveError> {
        let tree = self.oracle.tree();
        if tree.tag(obstacle) != tree.tag(hole)
            || self.states[obstacle] != VertexState::Obstacle
            || self.states[hole] != VertexState::Hole
        {
            return Err(SolveError::InvalidMove {
                from: obstacle,
                to: hole,
            });
        }

        let cost = self.oracle.distance(obstacle, hole);
        self.states[obstacle] = VertexState::Hole;
        self.states[hole] = VertexState::Obstacle;
        self.record(obstacle, hole, cost);
        self.stats.obstacle_moves += 1;
        debug!("moving obstacle {obstacle} to hole {hole} at cost {cost}");
        Ok(())
    }

    fn move_robot(&mut self, target: usize) {
        let cost = self.oracle.distance(self.robot, target);
        self.states[self.robot] = VertexState::Hole;
        self.states[target] = VertexState::Robot;
        self.record(self.robot, target, cost);
        self.stats.robot_moves += 1;
        debug!("moving robot from {} to {target} at cost {cost}", self.robot);

        self.robot = target;
        self.visited.insert(target);
    }

    fn record(&mut self, from: usize, to: usize, cost: usize) {
        self.cost += cost;
        self.moves.push(Move { from, to, cost });
    }
}

impl<R: Rng> Solver for MotionPlanner<R> {
    #[instrument(skip_all, name = "motion", fields(robot = self.robot, goal = self.goal), level = "debug")]
    fn solve(&mut self, config: &Config) -> Result<Solution, SolveError> {
        let solve_start_time = Instant::now();
        let mut iterations = 0;

        let status = loop {
            if self.robot == self.goal {
                info!("robot reached its goal after {} moves, cost {}", self.moves.len(), self.cost);
                break Status::Solved;
            }
            if config.max_iterations > 0 && iterations >= config.max_iterations {
                return Err(SolveError::IterationLimit(config.max_iterations));
            }
            iterations += 1;

            self.rebuild();
            if self.front_holes + self.back_holes < self.min_holes {
                info!(
                    "unsolvable: {} holes in reach, {} needed",
                    self.front_holes + self.back_holes,
                    self.min_holes
                );
                break self.unsolvable();
            }

            if self.try_move_forward()? {
                self.stats.forward_moves += 1;
                continue;
            }
            debug!("cannot move forward, trying to move backwards");
            if self.try_move_backward()? {
                self.stats.backward_moves += 1;
                continue;
            }
            info!("unsolvable: cannot move forward or backward");
            break self.unsolvable();
        };

        self.stats.time_us = solve_start_time.elapsed().as_micros() as usize;
        self.stats.costs = self.cost;
        self.stats.print();

        Ok(Solution {
            status,
            moves: self.moves.clone(),
            cost: self.cost,
            final_states: self.states.clone(),
        })
    }
}
