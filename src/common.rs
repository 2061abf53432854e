use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ReplayError;
use crate::instance::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexState {
    Hole,
    Obstacle,
    Robot,
}

/// One obstacle relocation or one robot move. The two kinds share a shape;
/// whichever vertex held the robot right before tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: usize,
    pub to: usize,
    pub cost: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Solved,
    /// Hole counts and Hm of the last tree built before giving up.
    Unsolvable {
        front_holes: usize,
        back_holes: usize,
        min_holes: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: Status,
    pub moves: Vec<Move>,
    pub cost: usize,
    pub final_states: Vec<VertexState>,
}

impl Solution {
    pub fn is_solved(&self) -> bool {
        self.status == Status::Solved
    }

    /// Apply the move log to the instance's initial state map.
    pub fn replay(&self, instance: &Instance) -> Result<Vec<VertexState>, ReplayError> {
        let mut states = instance.initial_states();
        let mut robot = instance.robot;

        for (step, &mv) in self.moves.iter().enumerate() {
            if mv.to >= states.len() || mv.from >= states.len() {
                return Err(ReplayError::VertexOutOfRange { step, mv });
            }
            if states[mv.to] != VertexState::Hole {
                return Err(ReplayError::TargetOccupied { step, mv });
            }
            match states[mv.from] {
                VertexState::Robot => {
                    debug_assert_eq!(mv.from, robot);
                    robot = mv.to;
                }
                VertexState::Obstacle => {}
                VertexState::Hole => return Err(ReplayError::EmptySource { step, mv }),
            }
            states[mv.to] = states[mv.from];
            states[mv.from] = VertexState::Hole;
        }

        debug!("replayed {} moves, robot ends at {robot}", self.moves.len());
        Ok(states)
    }

    pub fn verify(&self, instance: &Instance) -> bool {
        let states = match self.replay(instance) {
            Ok(states) => states,
            Err(err) => {
                info!("solution rejected: {err}");
                return false;
            }
        };

        let robots: Vec<usize> = (0..states.len())
            .filter(|&v| states[v] == VertexState::Robot)
            .collect();
        let obstacle_count = states
            .iter()
            .filter(|&&state| state == VertexState::Obstacle)
            .count();

        if robots.len() != 1 || obstacle_count != instance.obstacles.len() {
            info!("solution rejected: robots {robots:?}, {obstacle_count} obstacles");
            return false;
        }
        if self.moves.iter().map(|mv| mv.cost).sum::<usize>() != self.cost {
            info!("solution rejected: move costs do not add up to {}", self.cost);
            return false;
        }
        if states != self.final_states {
            info!("solution rejected: replayed state map differs from reported one");
            return false;
        }
        if self.is_solved() && robots[0] != instance.goal {
            info!("solution rejected: robot ends at {} instead of {}", robots[0], instance.goal);
            return false;
        }
        true
    }

    /// Dump the result next to the instance name, `_solution.json` or
    /// `_unsolvable.json` depending on the outcome.
    pub fn write_to_dir(
        &self,
        dir: &Path,
        name: &str,
        elapsed_time: f64,
    ) -> io::Result<PathBuf> {
        let (suffix, record) = if self.is_solved() {
            (
                "solution",
                SolutionRecord {
                    moves: self
                        .moves
                        .iter()
                        .map(|mv| (mv.from, mv.to, mv.cost))
                        .collect(),
                    cost: self.cost as i64,
                    elapsed_time,
                    solvable: true,
                },
            )
        } else {
            (
                "unsolvable",
                SolutionRecord {
                    moves: Vec::new(),
                    cost: -1,
                    elapsed_time,
                    solvable: false,
                },
            )
        };

        let path = dir.join(format!("{name}_{suffix}.json"));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &record)?;
        writer.flush()?;
        Ok(path)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SolutionRecord {
    pub moves: Vec<(usize, usize, usize)>,
    pub cost: i64,
    #[serde(rename = "elapsedTime")]
    pub elapsed_time: f64,
    pub solvable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::star_graph;

    fn star_instance() -> Instance {
        Instance::new("star", star_graph(3), vec![0], 1, 2).unwrap()
    }

    fn star_solution() -> Solution {
        Solution {
            status: Status::Solved,
            moves: vec![
                Move { from: 0, to: 3, cost: 1 },
                Move { from: 1, to: 2, cost: 2 },
            ],
            cost: 3,
            final_states: vec![
                VertexState::Hole,
                VertexState::Hole,
                VertexState::Robot,
                VertexState::Obstacle,
            ],
        }
    }

    #[test]
    fn test_replay_tells_robot_from_obstacle() {
        let instance = star_instance();
        let solution = star_solution();
        assert_eq!(solution.replay(&instance).unwrap(), solution.final_states);
        assert!(solution.verify(&instance));
    }

    #[test]
    fn test_verify_rejects_broken_logs() {
        let instance = star_instance();

        // Robot steps onto the obstacle before it is moved away.
        let mut blocked = star_solution();
        blocked.moves.swap(0, 1);
        blocked.moves[0] = Move { from: 1, to: 0, cost: 1 };
        assert_eq!(
            blocked.replay(&instance),
            Err(ReplayError::TargetOccupied {
                step: 0,
                mv: Move { from: 1, to: 0, cost: 1 },
            })
        );
        assert!(!blocked.verify(&instance));

        let mut stray = star_solution();
        stray.moves[1] = Move { from: 2, to: 0, cost: 1 };
        assert_eq!(
            stray.replay(&instance),
            Err(ReplayError::EmptySource {
                step: 1,
                mv: Move { from: 2, to: 0, cost: 1 },
            })
        );

        let mut outside = star_solution();
        outside.moves[0].to = 9;
        assert!(matches!(
            outside.replay(&instance),
            Err(ReplayError::VertexOutOfRange { step: 0, .. })
        ));

        let mut wrong_total = star_solution();
        wrong_total.cost = 4;
        assert!(!wrong_total.verify(&instance));

        let mut wrong_states = star_solution();
        wrong_states.final_states.swap(0, 3);
        assert!(!wrong_states.verify(&instance));

        let mut short = star_solution();
        short.moves.pop();
        short.cost = 1;
        short.final_states = vec![
            VertexState::Hole,
            VertexState::Robot,
            VertexState::Hole,
            VertexState::Obstacle,
        ];
        assert!(!short.verify(&instance));
        short.status = Status::Unsolvable {
            front_holes: 0,
            back_holes: 0,
            min_holes: 1,
        };
        assert!(short.verify(&instance));
    }

    #[test]
    fn test_write_solution_records() {
        let dir = std::env::temp_dir().join(format!("hole_motion_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let solution = star_solution();
        let path = solution.write_to_dir(&dir, "star", 0.5).unwrap();
        assert!(path.ends_with("star_solution.json"));
        let record: SolutionRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            record,
            SolutionRecord {
                moves: vec![(0, 3, 1), (1, 2, 2)],
                cost: 3,
                elapsed_time: 0.5,
                solvable: true,
            }
        );

        let mut unsolved = solution;
        unsolved.status = Status::Unsolvable {
            front_holes: 1,
            back_holes: 0,
            min_holes: 2,
        };
        let path = unsolved.write_to_dir(&dir, "star", 0.5).unwrap();
        assert!(path.ends_with("star_unsolvable.json"));
        let record: SolutionRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(record.cost, -1);
        assert!(record.moves.is_empty());
        assert!(!record.solvable);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
