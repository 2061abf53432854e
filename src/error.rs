use std::fmt;

use crate::common::Move;

/// Malformed problem instances, rejected before solving begins.
#[derive(Debug)]
pub enum InstanceError {
    VertexOutOfRange { vertex: usize, vertex_count: usize },
    SelfLoop(usize),
    Disconnected,
    DuplicateObstacle(usize),
    RobotOnObstacle(usize),
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for InstanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceError::VertexOutOfRange {
                vertex,
                vertex_count,
            } => write!(
                f,
                "vertex {vertex} is outside the vertex set 0..{vertex_count}"
            ),
            InstanceError::SelfLoop(vertex) => write!(f, "self loop on vertex {vertex}"),
            InstanceError::Disconnected => write!(f, "graph is not connected"),
            InstanceError::DuplicateObstacle(vertex) => {
                write!(f, "obstacle listed twice at vertex {vertex}")
            }
            InstanceError::RobotOnObstacle(vertex) => {
                write!(f, "robot vertex {vertex} is also listed as an obstacle")
            }
            InstanceError::Io(err) => write!(f, "io error: {err}"),
            InstanceError::Parse(err) => write!(f, "malformed instance: {err}"),
        }
    }
}

impl std::error::Error for InstanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstanceError::Io(err) => Some(err),
            InstanceError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InstanceError {
    fn from(err: std::io::Error) -> Self {
        InstanceError::Io(err)
    }
}

impl From<serde_json::Error> for InstanceError {
    fn from(err: serde_json::Error) -> Self {
        InstanceError::Parse(err)
    }
}

/// Fatal planner failures. An unsolvable instance is not an error, it is
/// reported through `Status::Unsolvable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// Obstacle relocation across two different branch tags.
    InvalidMove { from: usize, to: usize },
    /// Path clearing found fewer eligible holes than obstacles to remove.
    InsufficientHoles {
        target: usize,
        obstacles: usize,
        holes: usize,
    },
    IterationLimit(usize),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::InvalidMove { from, to } => {
                write!(f, "tried to make invalid move from {from} to {to}")
            }
            SolveError::InsufficientHoles {
                target,
                obstacles,
                holes,
            } => write!(
                f,
                "cannot clear path to {target}: {obstacles} obstacles but only {holes} eligible holes"
            ),
            SolveError::IterationLimit(limit) => {
                write!(f, "solver exceeded {limit} iterations")
            }
        }
    }
}

impl std::error::Error for SolveError {}

/// A move log that does not apply to the instance it claims to solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    VertexOutOfRange { step: usize, mv: Move },
    TargetOccupied { step: usize, mv: Move },
    EmptySource { step: usize, mv: Move },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayError::VertexOutOfRange { step, mv } => {
                write!(f, "move {step} {mv:?} leaves the vertex set")
            }
            ReplayError::TargetOccupied { step, mv } => {
                write!(f, "move {step} {mv:?} targets an occupied vertex")
            }
            ReplayError::EmptySource { step, mv } => {
                write!(f, "move {step} {mv:?} starts from an empty vertex")
            }
        }
    }
}

impl std::error::Error for ReplayError {}
